//! PostgreSQL SQL dialect implementation

use super::SqlDialect;

/// PostgreSQL SQL dialect
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.placeholder(1), "$1");
        assert_eq!(dialect.placeholder(5), "$5");
    }

    #[test]
    fn test_like() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.like("title", "$2"), r"title LIKE $2 ESCAPE '\'");
    }

    #[test]
    fn test_in_list() {
        let dialect = PostgresDialect;
        let placeholders = vec!["$1".to_string(), "$2".to_string()];
        assert_eq!(
            dialect.in_list("assignee", &placeholders, true),
            "assignee NOT IN ($1, $2)"
        );
    }
}
