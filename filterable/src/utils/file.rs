//! File utility functions

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Expand a path string to an absolute path.
///
/// - Tilde expansion: `~` or `~/path` -> home directory
/// - Relative paths and bare names resolve against the current directory
/// - Absolute paths are passed through unchanged
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(path))
    } else if let Some(rest) = path.strip_prefix("~/") {
        match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(path),
        }
    } else {
        PathBuf::from(path)
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

/// Resolve a command-line text argument.
///
/// `-` reads standard input, `@path` reads a file, anything else is taken
/// literally. Input larger than `max_bytes` is rejected before it is parsed.
pub fn read_text_arg(arg: &str, max_bytes: usize) -> Result<String> {
    let text = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .take(max_bytes as u64 + 1)
            .read_to_string(&mut buf)
            .context("Failed to read standard input")?;
        buf
    } else if let Some(path) = arg.strip_prefix('@') {
        let path = expand_path(path);
        let size = std::fs::metadata(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?
            .len();
        if size > max_bytes as u64 {
            anyhow::bail!(
                "{} is {} bytes, larger than the limit of {} bytes",
                path.display(),
                size,
                max_bytes
            );
        }
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    } else {
        return Ok(arg.to_string());
    };

    if text.len() > max_bytes {
        anyhow::bail!("Input is larger than the limit of {} bytes", max_bytes);
    }
    Ok(text.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn test_expand_path_absolute_unix() {
        assert_eq!(expand_path("/etc/config"), PathBuf::from("/etc/config"));
    }

    #[test]
    fn test_expand_path_relative() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(expand_path("./schema.json"), cwd.join("./schema.json"));
        assert_eq!(expand_path("schema.json"), cwd.join("schema.json"));
    }

    #[test]
    fn test_expand_path_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~"), home);
            assert_eq!(
                expand_path("~/.filterable/filterable.json"),
                home.join(".filterable/filterable.json")
            );
        }
    }

    #[test]
    fn test_expand_path_trims_whitespace() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(expand_path("  data  "), cwd.join("data"));
        assert_eq!(expand_path("   "), cwd);
    }

    #[test]
    fn test_read_text_arg_literal() {
        assert_eq!(read_text_arg("a = 1", 100).unwrap(), "a = 1");
    }

    #[test]
    fn test_read_text_arg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filter.txt");
        std::fs::write(&path, "priority > 2\n").unwrap();

        let arg = format!("@{}", path.display());
        assert_eq!(read_text_arg(&arg, 100).unwrap(), "priority > 2");
    }

    #[test]
    fn test_read_text_arg_file_too_large() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filter.txt");
        std::fs::write(&path, "x".repeat(64)).unwrap();

        let arg = format!("@{}", path.display());
        let err = read_text_arg(&arg, 16).unwrap_err();
        assert!(err.to_string().contains("larger than the limit of 16 bytes"));
    }

    #[test]
    fn test_read_text_arg_missing_file() {
        assert!(read_text_arg("@/nonexistent/filter.txt", 100).is_err());
    }
}
