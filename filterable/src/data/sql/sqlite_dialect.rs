//! SQLite SQL dialect implementation

use super::SqlDialect;

/// SQLite SQL dialect
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.placeholder(1), "?");
        assert_eq!(dialect.placeholder(5), "?");
    }

    #[test]
    fn test_like() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.like("title", "?"), r"title LIKE ? ESCAPE '\'");
    }

    #[test]
    fn test_in_list() {
        let dialect = SqliteDialect;
        let placeholders = vec!["?".to_string(), "?".to_string()];
        assert_eq!(
            dialect.in_list("status", &placeholders, false),
            "status IN (?, ?)"
        );
        assert_eq!(
            dialect.in_list("status", &placeholders, true),
            "status NOT IN (?, ?)"
        );
    }
}
