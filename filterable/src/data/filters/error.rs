//! Filter pipeline errors
//!
//! Every failure is a deterministic function of the input, so all variants
//! are client errors that reject the filter expression.

use thiserror::Error;

use super::ast::OperatorKind;
use super::metadata::FieldType;

/// Errors raised while parsing or compiling a filter expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Malformed filter text
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    /// Malformed structured (JSON) filter payload
    #[error("Invalid filter payload at {path}: {message}")]
    InvalidPayload { path: String, message: String },

    /// Input exceeds a configured parse limit
    #[error("Filter exceeds maximum {limit} of {max}")]
    LimitExceeded { limit: &'static str, max: usize },

    /// Leaf references a field the entity does not expose
    #[error("Cannot filter by unknown field: {field}")]
    UnknownField { field: String },

    /// Resolved field type does not support the operator
    #[error("Operator '{operator}' is not supported for {field_type} field '{field}'")]
    UnsupportedOperator {
        field: String,
        operator: OperatorKind,
        field_type: FieldType,
    },

    /// Field metadata maps to a column that is not a plain SQL identifier
    #[error("Field '{field}' maps to invalid column '{column}'")]
    InvalidColumn { field: String, column: String },

    /// Operand cannot be compared against the field
    #[error("Invalid value for field '{field}': {message}")]
    InvalidOperand { field: String, message: String },

    /// A group without children was built by hand
    #[error("Filter group must contain at least one rule")]
    EmptyGroup,
}

impl FilterError {
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    pub fn invalid_payload(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    pub fn invalid_operand(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOperand {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "INVALID_FILTER_SYNTAX",
            Self::InvalidPayload { .. } => "INVALID_FILTER_JSON",
            Self::LimitExceeded { .. } => "FILTER_TOO_LARGE",
            Self::UnknownField { .. } => "UNKNOWN_FILTER_FIELD",
            Self::UnsupportedOperator { .. } => "UNSUPPORTED_FILTER_OPERATOR",
            Self::InvalidColumn { .. } => "INVALID_FILTER_COLUMN",
            Self::InvalidOperand { .. } => "INVALID_FILTER_VALUE",
            Self::EmptyGroup => "EMPTY_FILTER_GROUP",
        }
    }

    /// Whether the caller should treat this as bad input.
    ///
    /// Always true; nothing in the pipeline fails for reasons outside the
    /// expression itself.
    pub fn is_client_error(&self) -> bool {
        true
    }
}
