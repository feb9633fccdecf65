//! Default values applied on insert

use std::sync::Arc;

use super::{EntityHook, HookError, Record, is_missing};

/// Provides default field values for an entity
pub trait DefaultValueSource: Send + Sync {
    /// Default values keyed by field name
    fn defaults(&self, entity: &str) -> Result<Record, HookError>;
}

/// Fixed in-memory defaults for a single entity
#[derive(Debug, Clone, Default)]
pub struct StaticDefaults {
    values: Record,
}

impl StaticDefaults {
    pub fn new(values: Record) -> Self {
        Self { values }
    }

    pub fn with(mut self, field: impl Into<String>, value: serde_json::Value) -> Self {
        self.values.insert(field.into(), value);
        self
    }
}

impl DefaultValueSource for StaticDefaults {
    fn defaults(&self, _entity: &str) -> Result<Record, HookError> {
        Ok(self.values.clone())
    }
}

/// Fills fields that are missing or null with the source's defaults
pub struct DefaultValues {
    pub entity: String,
    pub source: Arc<dyn DefaultValueSource>,
}

impl DefaultValues {
    pub fn new(entity: impl Into<String>, source: Arc<dyn DefaultValueSource>) -> Self {
        Self {
            entity: entity.into(),
            source,
        }
    }
}

impl EntityHook for DefaultValues {
    fn name(&self) -> &'static str {
        "default_values"
    }

    fn before_insert(&self, record: &mut Record) -> Result<(), HookError> {
        let defaults = self.source.defaults(&self.entity)?;
        for (field, value) in defaults {
            if is_missing(record, &field) {
                record.insert(field, value);
            }
        }
        Ok(())
    }
}
