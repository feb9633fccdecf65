//! SQL utility functions

/// Escape SQL LIKE metacharacters (%, _, \) in user input
///
/// Use this when building LIKE patterns from user input to prevent
/// unintended pattern matching.
///
/// # Example
///
/// ```
/// use filterable::utils::sql::escape_like_pattern;
///
/// let user_input = "100% match_test";
/// let pattern = format!("%{}%", escape_like_pattern(user_input));
/// assert_eq!(pattern, "%100\\% match\\_test%");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Whether `s` is a plain SQL identifier: `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_sql_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether `s` is a column reference made of dot-separated identifiers
/// (e.g. `assignee_login`, `meta.owner`)
pub fn is_sql_column(s: &str) -> bool {
    s.split('.').all(is_sql_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_pattern_no_special_chars() {
        assert_eq!(escape_like_pattern("hello"), "hello");
    }

    #[test]
    fn test_escape_like_pattern_percent() {
        assert_eq!(escape_like_pattern("100%"), "100\\%");
    }

    #[test]
    fn test_escape_like_pattern_underscore() {
        assert_eq!(escape_like_pattern("foo_bar"), "foo\\_bar");
    }

    #[test]
    fn test_escape_like_pattern_backslash() {
        assert_eq!(escape_like_pattern("path\\file"), "path\\\\file");
    }

    #[test]
    fn test_escape_like_pattern_multiple() {
        assert_eq!(escape_like_pattern("100%_\\test"), "100\\%\\_\\\\test");
    }

    #[test]
    fn test_escape_like_pattern_empty() {
        assert_eq!(escape_like_pattern(""), "");
    }

    #[test]
    fn test_is_sql_identifier() {
        assert!(is_sql_identifier("t"));
        assert!(is_sql_identifier("_tickets2"));
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier("2t"));
        assert!(!is_sql_identifier("t.x"));
        assert!(!is_sql_identifier("tické"));
    }

    #[test]
    fn test_is_sql_column() {
        assert!(is_sql_column("assignee_login"));
        assert!(is_sql_column("meta.owner"));
        assert!(!is_sql_column("meta."));
        assert!(!is_sql_column(".owner"));
        assert!(!is_sql_column("a = 1 OR 1=1 --"));
        assert!(!is_sql_column("\"col\""));
    }
}
