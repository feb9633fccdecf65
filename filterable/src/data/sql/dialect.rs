//! SQL dialect trait for multi-database support
//!
//! Compiled filter predicates are rendered through this trait so the same
//! predicate tree produces SQL for every supported backend.

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - Pattern matching escapes
/// - Membership tests
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite/DuckDB: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    fn placeholder(&self, index: usize) -> String;

    /// Generate a LIKE comparison whose pattern escapes `%`, `_` and `\`
    /// with a backslash
    fn like(&self, col: &str, placeholder: &str) -> String {
        format!("{} LIKE {} ESCAPE '\\'", col, placeholder)
    }

    /// Generate a membership test against a list of placeholders
    fn in_list(&self, col: &str, placeholders: &[String], negated: bool) -> String {
        let op = if negated { "NOT IN" } else { "IN" };
        format!("{} {} ({})", col, op, placeholders.join(", "))
    }
}
