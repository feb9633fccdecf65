//! HTML escaping of user-supplied text fields

use serde_json::Value;

use super::{EntityHook, HookError, Record};
use crate::utils::string::escape_html;

/// Escapes HTML markup in the listed string fields on insert and update.
///
/// Null and absent fields are left alone; any other non-string value is
/// rejected.
#[derive(Debug, Clone)]
pub struct HtmlSafe {
    pub fields: Vec<String>,
}

impl HtmlSafe {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    fn escape_fields(&self, record: &mut Record) -> Result<(), HookError> {
        for field in &self.fields {
            match record.get_mut(field) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) => *s = escape_html(s),
                Some(other) => {
                    return Err(HookError::invalid_field(
                        field,
                        format!("expected a string, got {}", json_kind(other)),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl EntityHook for HtmlSafe {
    fn name(&self) -> &'static str {
        "html_safe"
    }

    fn before_insert(&self, record: &mut Record) -> Result<(), HookError> {
        self.escape_fields(record)
    }

    fn before_update(&self, record: &mut Record) -> Result<(), HookError> {
        self.escape_fields(record)
    }
}
