//! Entity lifecycle hooks
//!
//! Hooks mutate a record at defined points of its lifecycle: before it is
//! inserted, before it is updated, and after it is read. A [`HookChain`]
//! runs registered hooks in registration order and stops at the first error.

mod auto_number;
mod defaults;
mod html_safe;
mod translatable;
mod uuid_key;

use std::fmt;

use thiserror::Error;

pub use auto_number::{AutoNumber, InMemorySequence, SequenceSource};
pub use defaults::{DefaultValueSource, DefaultValues, StaticDefaults};
pub use html_safe::HtmlSafe;
pub use translatable::{TRANSLATIONS_KEY, Translatable};
pub use uuid_key::UuidPrimaryKey;

/// An entity record as a JSON object
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Hook errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HookError {
    #[error("Field '{field}' is invalid: {message}")]
    InvalidField { field: String, message: String },

    #[error("Sequence '{name}' failed: {message}")]
    Sequence { name: String, message: String },

    #[error("Default values unavailable for '{entity}': {message}")]
    Defaults { entity: String, message: String },
}

impl HookError {
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Point in an entity's lifecycle at which hooks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePoint {
    BeforeInsert,
    BeforeUpdate,
    OnRead,
}

impl LifecyclePoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecyclePoint::BeforeInsert => "before_insert",
            LifecyclePoint::BeforeUpdate => "before_update",
            LifecyclePoint::OnRead => "on_read",
        }
    }
}

impl fmt::Display for LifecyclePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback invoked at lifecycle points; every method defaults to a no-op
pub trait EntityHook: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    fn before_insert(&self, _record: &mut Record) -> Result<(), HookError> {
        Ok(())
    }

    fn before_update(&self, _record: &mut Record) -> Result<(), HookError> {
        Ok(())
    }

    fn on_read(&self, _record: &mut Record) -> Result<(), HookError> {
        Ok(())
    }
}

/// Ordered set of hooks for one entity
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Box<dyn EntityHook>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook; it runs after every hook already registered
    pub fn with(mut self, hook: impl EntityHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook for `point` against `record`
    pub fn run(&self, point: LifecyclePoint, record: &mut Record) -> Result<(), HookError> {
        for hook in &self.hooks {
            let result = match point {
                LifecyclePoint::BeforeInsert => hook.before_insert(record),
                LifecyclePoint::BeforeUpdate => hook.before_update(record),
                LifecyclePoint::OnRead => hook.on_read(record),
            };
            if let Err(e) = result {
                tracing::debug!(hook = hook.name(), %point, error = %e, "Entity hook failed");
                return Err(e);
            }
            tracing::trace!(hook = hook.name(), %point, "Applied entity hook");
        }
        Ok(())
    }

    pub fn before_insert(&self, record: &mut Record) -> Result<(), HookError> {
        self.run(LifecyclePoint::BeforeInsert, record)
    }

    pub fn before_update(&self, record: &mut Record) -> Result<(), HookError> {
        self.run(LifecyclePoint::BeforeUpdate, record)
    }

    pub fn on_read(&self, record: &mut Record) -> Result<(), HookError> {
        self.run(LifecyclePoint::OnRead, record)
    }
}

impl fmt::Debug for HookChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| h.name()))
            .finish()
    }
}

/// True when the record has no usable value for `field`
pub(crate) fn is_missing(record: &Record, field: &str) -> bool {
    matches!(record.get(field), None | Some(serde_json::Value::Null))
}
