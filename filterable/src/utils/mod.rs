//! Utility functions for the application

pub mod file;
pub mod id;
pub mod sql;
pub mod string;
