//! Sequential human-readable numbers (e.g. `TCK-000042`)

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;

use super::{EntityHook, HookError, Record, is_missing};

/// Source of monotonically increasing sequence values
pub trait SequenceSource: Send + Sync {
    /// Return the next value of the named sequence
    fn next_value(&self, name: &str) -> Result<u64, HookError>;
}

/// Process-local sequences, starting at 1
#[derive(Debug, Default)]
pub struct InMemorySequence {
    counters: Mutex<FxHashMap<String, u64>>,
}

impl InMemorySequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a sequence so that the next value is `current + 1`
    pub fn with_start(self, name: impl Into<String>, current: u64) -> Self {
        self.counters.lock().insert(name.into(), current);
        self
    }
}

impl SequenceSource for InMemorySequence {
    fn next_value(&self, name: &str) -> Result<u64, HookError> {
        let mut counters = self.counters.lock();
        let counter = counters.entry(name.to_string()).or_insert(0);
        *counter = counter.checked_add(1).ok_or_else(|| HookError::Sequence {
            name: name.to_string(),
            message: "sequence exhausted".to_string(),
        })?;
        Ok(*counter)
    }
}

/// Fills a missing field with `prefix` followed by the next sequence value,
/// zero-padded to `width` digits
pub struct AutoNumber {
    pub field: String,
    pub prefix: String,
    pub width: usize,
    pub sequence: Arc<dyn SequenceSource>,
}

impl AutoNumber {
    pub fn new(field: impl Into<String>, sequence: Arc<dyn SequenceSource>) -> Self {
        Self {
            field: field.into(),
            prefix: String::new(),
            width: 0,
            sequence,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Sequence name, one per prefix and field: `{prefix}:{field}`.
    /// `\` and `:` in the prefix are backslash-escaped so the first bare `:`
    /// always ends the prefix.
    pub fn sequence_name(&self) -> String {
        let prefix = self.prefix.replace('\\', "\\\\").replace(':', "\\:");
        format!("{}:{}", prefix, self.field)
    }

    fn format(&self, value: u64) -> String {
        format!("{}{:0width$}", self.prefix, value, width = self.width)
    }
}

impl std::fmt::Debug for AutoNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoNumber")
            .field("field", &self.field)
            .field("prefix", &self.prefix)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

impl EntityHook for AutoNumber {
    fn name(&self) -> &'static str {
        "auto_number"
    }

    fn before_insert(&self, record: &mut Record) -> Result<(), HookError> {
        if !is_missing(record, &self.field) {
            return Ok(());
        }
        let value = self.sequence.next_value(&self.sequence_name())?;
        record.insert(self.field.clone(), Value::String(self.format(value)));
        Ok(())
    }
}
