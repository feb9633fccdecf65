//! Filter compiler
//!
//! Walks a [`RuleNode`] tree, resolves every leaf against entity metadata,
//! runs the guesser chain and produces a [`Predicate`] tree for the storage
//! layer.

use chrono::DateTime;
use serde::Serialize;

use super::ast::{Combinator, Leaf, Operand, OperatorKind, RuleNode, Value};
use super::error::FilterError;
use super::guess::{FilterFormConfig, GuesserChain};
use super::metadata::{FieldMetadata, FieldMetadataProvider, FieldType};
use crate::utils::sql::is_sql_column;

/// One compiled comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    /// Storage column resolved from metadata
    pub column: String,
    pub field_type: FieldType,
    pub operator: OperatorKind,
    pub operand: Operand,
    pub form: FilterFormConfig,
}

/// Compiled filter, ready to be rendered by the storage layer
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// All children must hold; order preserved
    All(Vec<Predicate>),
    /// At least one child must hold; order preserved
    Any(Vec<Predicate>),
    Condition(Condition),
}

impl Predicate {
    /// Conditions in document order
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.collect_conditions(&mut out);
        out
    }

    fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        match self {
            Predicate::All(children) | Predicate::Any(children) => {
                for child in children {
                    child.collect_conditions(out);
                }
            }
            Predicate::Condition(condition) => out.push(condition),
        }
    }
}

/// Per-field summary of a compiled condition's form config
#[derive(Debug, Serialize)]
pub struct FormSummary<'a> {
    pub field: &'a str,
    pub operator: OperatorKind,
    #[serde(flatten)]
    pub form: &'a FilterFormConfig,
}

impl<'a> From<&'a Condition> for FormSummary<'a> {
    fn from(condition: &'a Condition) -> Self {
        Self {
            field: &condition.field,
            operator: condition.operator,
            form: &condition.form,
        }
    }
}

/// Compiles rule trees against one entity's metadata
pub struct FilterCompiler<'a> {
    provider: &'a dyn FieldMetadataProvider,
    guessers: &'a GuesserChain,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(provider: &'a dyn FieldMetadataProvider, guessers: &'a GuesserChain) -> Self {
        Self { provider, guessers }
    }

    pub fn compile(&self, node: &RuleNode) -> Result<Predicate, FilterError> {
        let predicate = self.compile_node(node)?;
        tracing::debug!(
            conditions = node.leaf_count(),
            guessers = self.guessers.len(),
            "Compiled filter"
        );
        Ok(predicate)
    }

    fn compile_node(&self, node: &RuleNode) -> Result<Predicate, FilterError> {
        match node {
            RuleNode::Leaf(leaf) => self.compile_leaf(leaf).map(Predicate::Condition),
            RuleNode::Group(group) => {
                if group.children.is_empty() {
                    return Err(FilterError::EmptyGroup);
                }
                let children = group
                    .children
                    .iter()
                    .map(|child| self.compile_node(child))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(match group.combinator {
                    Combinator::And => Predicate::All(children),
                    Combinator::Or => Predicate::Any(children),
                })
            }
        }
    }

    fn compile_leaf(&self, leaf: &Leaf) -> Result<Condition, FilterError> {
        let meta = self.provider.field_metadata(&leaf.field).ok_or_else(|| {
            tracing::debug!(field = %leaf.field, "Filter references unknown field");
            FilterError::unknown_field(&leaf.field)
        })?;

        if !is_sql_column(meta.column()) {
            return Err(FilterError::InvalidColumn {
                field: leaf.field.clone(),
                column: meta.column().to_string(),
            });
        }

        if !meta.supports(leaf.operator) {
            return Err(FilterError::UnsupportedOperator {
                field: leaf.field.clone(),
                operator: leaf.operator,
                field_type: meta.field_type,
            });
        }

        let null_check = matches!(leaf.operator, OperatorKind::IsNull | OperatorKind::IsNotNull);
        if null_check && !meta.nullable {
            return Err(not_nullable(meta));
        }

        if leaf.operand.shape() != leaf.operator.operand_shape() {
            return Err(FilterError::invalid_operand(
                &leaf.field,
                format!("operand does not fit operator '{}'", leaf.operator),
            ));
        }

        for value in leaf.operand.values() {
            check_value(meta, leaf.operator, value)?;
        }

        let form = self.guessers.run(leaf, meta);

        Ok(Condition {
            field: leaf.field.clone(),
            column: meta.column().to_string(),
            field_type: meta.field_type,
            operator: leaf.operator,
            operand: leaf.operand.clone(),
            form,
        })
    }
}

/// Largest integer magnitude an `f64` operand holds without rounding (2^53 - 1)
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_991.0;

fn not_nullable(meta: &FieldMetadata) -> FilterError {
    FilterError::invalid_operand(&meta.name, "field is not nullable")
}

/// Check that a literal can be compared against the field
fn check_value(
    meta: &FieldMetadata,
    operator: OperatorKind,
    value: &Value,
) -> Result<(), FilterError> {
    let mismatch = || {
        FilterError::invalid_operand(
            &meta.name,
            format!("expected {} value but got {}", meta.field_type, value.kind()),
        )
    };

    if let Value::Null = value {
        // Only equality may compare with null; it renders as IS [NOT] NULL
        if !matches!(operator, OperatorKind::Eq | OperatorKind::Neq) {
            return Err(FilterError::invalid_operand(
                &meta.name,
                format!("null is not allowed with operator '{}'", operator),
            ));
        }
        if !meta.nullable {
            return Err(not_nullable(meta));
        }
        return Ok(());
    }

    match meta.field_type {
        FieldType::String => match value {
            Value::String(_) => Ok(()),
            _ => Err(mismatch()),
        },
        FieldType::Integer => match value {
            Value::Number(n) if n.fract() != 0.0 => Err(FilterError::invalid_operand(
                &meta.name,
                format!("expected integer value but got {}", n),
            )),
            Value::Number(n) if n.abs() > MAX_EXACT_INTEGER => Err(FilterError::invalid_operand(
                &meta.name,
                format!("integer {} cannot be represented exactly", n),
            )),
            Value::Number(_) => Ok(()),
            _ => Err(mismatch()),
        },
        FieldType::Float => match value {
            Value::Number(_) => Ok(()),
            _ => Err(mismatch()),
        },
        FieldType::Boolean => match value {
            Value::Bool(_) => Ok(()),
            _ => Err(mismatch()),
        },
        FieldType::Datetime => match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s).map(|_| ()).map_err(|_| {
                FilterError::invalid_operand(
                    &meta.name,
                    format!("invalid timestamp format: {}. Use ISO 8601 format.", s),
                )
            }),
            _ => Err(mismatch()),
        },
        FieldType::Uuid => match value {
            Value::String(s) => uuid::Uuid::parse_str(s).map(|_| ()).map_err(|_| {
                FilterError::invalid_operand(&meta.name, format!("invalid UUID: {}", s))
            }),
            _ => Err(mismatch()),
        },
        FieldType::Choice => match value {
            Value::String(s) if meta.choices.iter().any(|c| c == s) => Ok(()),
            Value::String(s) => Err(FilterError::invalid_operand(
                &meta.name,
                format!("'{}' is not one of: {}", s, meta.choices.join(", ")),
            )),
            _ => Err(mismatch()),
        },
    }
}
