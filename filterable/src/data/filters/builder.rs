//! SQL filter builder
//!
//! Renders a compiled [`Predicate`] into a WHERE clause fragment with bound
//! parameters. Placeholder syntax comes from the [`SqlDialect`].

use super::ast::{Operand, OperatorKind, Value};
use super::compiler::{Condition, Predicate};
use crate::data::sql::SqlDialect;
use crate::utils::sql::escape_like_pattern;

/// Bound parameter values, in placeholder order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlParams {
    pub values: Vec<Value>,
}

impl SqlParams {
    /// Bind a value and return its 1-based index
    pub fn push(&mut self, value: Value) -> usize {
        self.values.push(value);
        self.values.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.values.iter().map(Value::to_json).collect())
    }
}

impl Predicate {
    /// Generate a SQL WHERE clause fragment and bind its parameters
    pub fn to_sql(&self, dialect: &dyn SqlDialect, params: &mut SqlParams) -> String {
        self.to_sql_aliased(dialect, params, "")
    }

    /// Generate a SQL WHERE clause fragment with a table alias
    ///
    /// The alias is prepended to column names (e.g., "t" → "t.column_name").
    /// Pass empty string for no alias.
    pub fn to_sql_aliased(
        &self,
        dialect: &dyn SqlDialect,
        params: &mut SqlParams,
        alias: &str,
    ) -> String {
        let format_col = |col: &str| -> String {
            if alias.is_empty() {
                col.to_string()
            } else {
                format!("{}.{}", alias, col)
            }
        };
        render(self, dialect, params, &format_col, true)
    }
}

fn render(
    predicate: &Predicate,
    dialect: &dyn SqlDialect,
    params: &mut SqlParams,
    format_col: &dyn Fn(&str) -> String,
    top_level: bool,
) -> String {
    let (children, join_op) = match predicate {
        Predicate::Condition(condition) => {
            return render_condition(condition, dialect, params, format_col);
        }
        Predicate::All(children) => (children, " AND "),
        Predicate::Any(children) => (children, " OR "),
    };

    match children.as_slice() {
        // Compiled groups are never empty; stay a no-op if one is built by hand
        [] => "1=1".to_string(),
        [only] => render(only, dialect, params, format_col, top_level),
        _ => {
            let parts: Vec<String> = children
                .iter()
                .map(|child| render(child, dialect, params, format_col, false))
                .collect();
            if top_level {
                parts.join(join_op)
            } else {
                format!("({})", parts.join(join_op))
            }
        }
    }
}

fn render_condition(
    condition: &Condition,
    dialect: &dyn SqlDialect,
    params: &mut SqlParams,
    format_col: &dyn Fn(&str) -> String,
) -> String {
    let col = format_col(&condition.column);
    let bind = |params: &mut SqlParams, value: Value| dialect.placeholder(params.push(value));

    match (&condition.operator, &condition.operand) {
        (OperatorKind::Eq, Operand::Single(Value::Null)) => format!("{} IS NULL", col),
        (OperatorKind::Neq, Operand::Single(Value::Null)) => format!("{} IS NOT NULL", col),
        (OperatorKind::IsNull, _) => format!("{} IS NULL", col),
        (OperatorKind::IsNotNull, _) => format!("{} IS NOT NULL", col),
        (
            op @ (OperatorKind::Eq
            | OperatorKind::Neq
            | OperatorKind::Lt
            | OperatorKind::Lte
            | OperatorKind::Gt
            | OperatorKind::Gte),
            Operand::Single(value),
        ) => {
            let sql_op = match op {
                OperatorKind::Eq => "=",
                OperatorKind::Neq => "<>",
                OperatorKind::Lt => "<",
                OperatorKind::Lte => "<=",
                OperatorKind::Gt => ">",
                _ => ">=",
            };
            let ph = bind(params, value.clone());
            format!("{} {} {}", col, sql_op, ph)
        }
        (OperatorKind::Between, Operand::Range(low, high)) => {
            let low_ph = bind(params, low.clone());
            let high_ph = bind(params, high.clone());
            format!("{} BETWEEN {} AND {}", col, low_ph, high_ph)
        }
        (op @ (OperatorKind::In | OperatorKind::NotIn), Operand::List(values)) => {
            if values.is_empty() {
                return "1=1".to_string();
            }
            let placeholders: Vec<String> =
                values.iter().map(|v| bind(params, v.clone())).collect();
            dialect.in_list(&col, &placeholders, *op == OperatorKind::NotIn)
        }
        (
            op @ (OperatorKind::Contains | OperatorKind::StartsWith | OperatorKind::EndsWith),
            Operand::Single(Value::String(s)),
        ) => {
            let escaped = escape_like_pattern(s);
            let pattern = match op {
                OperatorKind::Contains => format!("%{}%", escaped),
                OperatorKind::StartsWith => format!("{}%", escaped),
                _ => format!("%{}", escaped),
            };
            let ph = bind(params, Value::String(pattern));
            dialect.like(&col, &ph)
        }
        (op, operand) => {
            // The compiler rejects these shapes; render a false predicate
            // rather than a partial clause
            tracing::warn!(
                field = %condition.field,
                operator = %op,
                shape = ?operand.shape(),
                "Skipping condition with mismatched operand"
            );
            "1=0".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filters::compiler::FilterCompiler;
    use crate::data::filters::guess::GuesserChain;
    use crate::data::filters::metadata::{EntitySchema, FieldMetadata, FieldType};
    use crate::data::filters::parser::parse;
    use crate::data::sql::{Backend, PostgresDialect, SqliteDialect};

    fn schema() -> EntitySchema {
        EntitySchema::new("ticket")
            .with_field(
                FieldMetadata::new("status", FieldType::Choice).with_choices(["open", "closed"]),
            )
            .with_field(FieldMetadata::new("priority", FieldType::Integer))
            .with_field(
                FieldMetadata::new("assignee", FieldType::String).with_column("assignee_login"),
            )
            .with_field(FieldMetadata::new("title", FieldType::String))
            .with_field(FieldMetadata::new("closed_at", FieldType::Datetime))
    }

    fn compile(expr: &str) -> Predicate {
        let schema = schema();
        let chain = GuesserChain::default();
        FilterCompiler::new(&schema, &chain)
            .compile(&parse(expr).unwrap())
            .unwrap()
    }

    fn sql(expr: &str, dialect: &dyn SqlDialect) -> (String, SqlParams) {
        let mut params = SqlParams::default();
        let clause = compile(expr).to_sql(dialect, &mut params);
        (clause, params)
    }

    #[test]
    fn test_nested_expression_postgres() {
        let (clause, params) = sql(
            r#"status = "open" AND (priority >= 3 OR assignee IN ["alice","bob"])"#,
            &PostgresDialect,
        );
        assert_eq!(
            clause,
            "status = $1 AND (priority >= $2 OR assignee_login IN ($3, $4))"
        );
        assert_eq!(
            params.values,
            vec![
                Value::from("open"),
                Value::from(3.0),
                Value::from("alice"),
                Value::from("bob")
            ]
        );
    }

    #[test]
    fn test_nested_expression_sqlite() {
        let (clause, params) = sql(
            "priority < 2 OR (priority > 8 AND title = 'x')",
            &SqliteDialect,
        );
        assert_eq!(clause, "priority < ? OR (priority > ? AND title = ?)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_single_condition_has_no_parens() {
        let (clause, _) = sql("priority != 1", &PostgresDialect);
        assert_eq!(clause, "priority <> $1");
    }

    #[test]
    fn test_alias() {
        let mut params = SqlParams::default();
        let clause =
            compile("priority BETWEEN 1 AND 5").to_sql_aliased(&PostgresDialect, &mut params, "t");
        assert_eq!(clause, "t.priority BETWEEN $1 AND $2");
    }

    #[test]
    fn test_like_patterns_escape_input() {
        let (clause, params) = sql("title CONTAINS '100%_off'", &PostgresDialect);
        assert_eq!(clause, r"title LIKE $1 ESCAPE '\'");
        assert_eq!(params.values, vec![Value::from(r"%100\%\_off%")]);

        let (_, params) = sql("title STARTS WITH 'ab'", &SqliteDialect);
        assert_eq!(params.values, vec![Value::from("ab%")]);

        let (_, params) = sql("title ENDS WITH 'yz'", &SqliteDialect);
        assert_eq!(params.values, vec![Value::from("%yz")]);
    }

    #[test]
    fn test_null_checks_bind_nothing() {
        let (clause, params) = sql("closed_at IS NULL AND assignee IS NOT NULL", &PostgresDialect);
        assert_eq!(clause, "closed_at IS NULL AND assignee_login IS NOT NULL");
        assert!(params.is_empty());

        let (clause, params) = sql("priority = null OR priority != null", &PostgresDialect);
        assert_eq!(clause, "priority IS NULL OR priority IS NOT NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn test_not_in_and_empty_list() {
        let (clause, _) = sql("status NOT IN ['closed']", Backend::Duckdb.dialect());
        assert_eq!(clause, "status NOT IN (?)");

        let (clause, params) = sql("status IN []", &PostgresDialect);
        assert_eq!(clause, "1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn test_params_continue_numbering() {
        let mut params = SqlParams::default();
        params.push(Value::from("tenant-1"));
        let clause = compile("priority = 4").to_sql(&PostgresDialect, &mut params);
        assert_eq!(clause, "priority = $2");
        assert_eq!(params.to_json(), serde_json::json!(["tenant-1", 4.0]));
    }
}
