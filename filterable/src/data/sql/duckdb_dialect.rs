//! DuckDB SQL dialect implementation

use super::SqlDialect;

/// DuckDB SQL dialect
pub struct DuckdbDialect;

impl SqlDialect for DuckdbDialect {
    fn name(&self) -> &'static str {
        "duckdb"
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
        let dialect = DuckdbDialect;
        assert_eq!(dialect.placeholder(3), "?");
    }

    #[test]
    fn test_like() {
        let dialect = DuckdbDialect;
        assert_eq!(dialect.like("name", "?"), r"name LIKE ? ESCAPE '\'");
    }
}
