//! SQL abstraction layer for multi-database support
//!
//! This module provides abstractions for generating SQL that works across
//! different database backends (SQLite, PostgreSQL, DuckDB).

mod dialect;
mod duckdb_dialect;
mod postgres_dialect;
mod sqlite_dialect;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use dialect::SqlDialect;
pub use duckdb_dialect::DuckdbDialect;
pub use postgres_dialect::PostgresDialect;
pub use sqlite_dialect::SqliteDialect;

/// Database backend identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    #[default]
    Postgres,
    Duckdb,
}

impl Backend {
    /// Get the SQL dialect for this backend
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Backend::Sqlite => &SqliteDialect,
            Backend::Postgres => &PostgresDialect,
            Backend::Duckdb => &DuckdbDialect,
        }
    }

    /// Get the backend name
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Postgres => "postgres",
            Backend::Duckdb => "duckdb",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            "duckdb" => Ok(Backend::Duckdb),
            _ => Err(format!(
                "Invalid SQL dialect '{}'. Valid options: sqlite, postgres, duckdb",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("SQLite".parse::<Backend>(), Ok(Backend::Sqlite));
        assert_eq!("postgresql".parse::<Backend>(), Ok(Backend::Postgres));
        assert_eq!("duckdb".parse::<Backend>(), Ok(Backend::Duckdb));
        assert!("clickhouse".parse::<Backend>().is_err());
    }

    #[test]
    fn test_backend_dialect_names() {
        for backend in [Backend::Sqlite, Backend::Postgres, Backend::Duckdb] {
            assert_eq!(backend.dialect().name(), backend.name());
            assert_eq!(backend.to_string(), backend.name());
        }
    }

    #[test]
    fn test_backend_serde() {
        let backend: Backend = serde_json::from_str(r#""duckdb""#).unwrap();
        assert_eq!(backend, Backend::Duckdb);
    }
}
