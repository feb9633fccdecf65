//! Data layer
//!
//! - `filters` - Filter expression parsing, compilation and SQL rendering
//! - `sql` - SQL abstraction layer for multi-database support

pub mod filters;
pub mod sql;
