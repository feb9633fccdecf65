//! Domain logic
//!
//! - `hooks` - Entity lifecycle hooks (keys, numbering, defaults, escaping, translations)

pub mod hooks;
