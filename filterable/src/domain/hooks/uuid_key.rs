//! UUID primary key assignment

use serde_json::Value;

use super::{EntityHook, HookError, Record, is_missing};
use crate::utils::id::uuid_v4;

/// Fills a missing or null primary key with a fresh v4 UUID before insert
#[derive(Debug, Clone)]
pub struct UuidPrimaryKey {
    pub field: String,
}

impl UuidPrimaryKey {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl Default for UuidPrimaryKey {
    fn default() -> Self {
        Self::new("id")
    }
}

impl EntityHook for UuidPrimaryKey {
    fn name(&self) -> &'static str {
        "uuid_primary_key"
    }

    fn before_insert(&self, record: &mut Record) -> Result<(), HookError> {
        if is_missing(record, &self.field) {
            let id = uuid_v4();
            tracing::trace!(field = %self.field, %id, "Assigned primary key");
            record.insert(self.field.clone(), Value::String(id));
        }
        Ok(())
    }
}
