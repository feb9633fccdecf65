use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::filters::ParseLimits;
use crate::data::sql::Backend;
use crate::utils::file::expand_path;
use crate::utils::sql::is_sql_identifier;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME};

// =============================================================================
// File Config (JSON)
// =============================================================================

/// Parse limits section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LimitsFileConfig {
    pub max_expression_bytes: Option<usize>,
    pub max_depth: Option<usize>,
    pub max_conditions: Option<usize>,
}

/// SQL rendering section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SqlFileConfig {
    pub dialect: Option<Backend>,
    pub alias: Option<String>,
}

/// Entity schema section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SchemaFileConfig {
    pub path: Option<String>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub limits: Option<LimitsFileConfig>,
    pub sql: Option<SqlFileConfig>,
    pub schema: Option<SchemaFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Names of top-level fields this version does not recognise
    fn unknown_fields(&self) -> Vec<&str> {
        match &self.extra {
            serde_json::Value::Object(map) => map.keys().map(|k| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        let keys = self.unknown_fields();
        if !keys.is_empty() {
            tracing::warn!(
                fields = %keys.join(", "),
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        // Limits
        if let Some(limits) = other.limits {
            let current = self.limits.get_or_insert_with(LimitsFileConfig::default);
            if limits.max_expression_bytes.is_some() {
                tracing::trace!(
                    max = ?limits.max_expression_bytes,
                    "Merging limits.max_expression_bytes"
                );
                current.max_expression_bytes = limits.max_expression_bytes;
            }
            if limits.max_depth.is_some() {
                tracing::trace!(max = ?limits.max_depth, "Merging limits.max_depth");
                current.max_depth = limits.max_depth;
            }
            if limits.max_conditions.is_some() {
                tracing::trace!(max = ?limits.max_conditions, "Merging limits.max_conditions");
                current.max_conditions = limits.max_conditions;
            }
        }

        // SQL
        if let Some(sql) = other.sql {
            let current = self.sql.get_or_insert_with(SqlFileConfig::default);
            if sql.dialect.is_some() {
                tracing::trace!(dialect = ?sql.dialect, "Merging sql.dialect");
                current.dialect = sql.dialect;
            }
            if sql.alias.is_some() {
                tracing::trace!(alias = ?sql.alias, "Merging sql.alias");
                current.alias = sql.alias;
            }
        }

        // Schema
        if let Some(schema) = other.schema {
            let current = self.schema.get_or_insert_with(SchemaFileConfig::default);
            if schema.path.is_some() {
                tracing::trace!(path = ?schema.path, "Merging schema.path");
                current.path = schema.path;
            }
        }
    }
}

// =============================================================================
// App Config
// =============================================================================

/// SQL rendering configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlConfig {
    pub dialect: Backend,
    /// Table alias prepended to columns; empty for none
    pub alias: String,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub limits: ParseLimits,
    pub sql: SqlConfig,
    pub schema_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.filterable/filterable.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.filterable/filterable.json) - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::from_layers(file_config, cli)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    pub(crate) fn from_layers(file_config: FileConfig, cli: &CliConfig) -> Result<Self> {
        let file_limits = file_config.limits.unwrap_or_default();
        let file_sql = file_config.sql.unwrap_or_default();
        let file_schema = file_config.schema.unwrap_or_default();

        let defaults = ParseLimits::default();
        let limits = ParseLimits {
            max_expression_bytes: cli
                .max_expression_bytes
                .or(file_limits.max_expression_bytes)
                .unwrap_or(defaults.max_expression_bytes),
            max_depth: cli
                .max_depth
                .or(file_limits.max_depth)
                .unwrap_or(defaults.max_depth),
            max_conditions: cli
                .max_conditions
                .or(file_limits.max_conditions)
                .unwrap_or(defaults.max_conditions),
        };

        let sql = SqlConfig {
            dialect: cli.dialect.or(file_sql.dialect).unwrap_or_default(),
            alias: cli.alias.clone().or(file_sql.alias).unwrap_or_default(),
        };

        // Schema path: CLI path is used as given, file paths get ~ expansion
        let schema_path = cli
            .schema
            .clone()
            .or_else(|| file_schema.path.as_deref().map(expand_path));

        let config = Self {
            limits,
            sql,
            schema_path,
        };
        config.validate()?;

        tracing::debug!(
            dialect = %config.sql.dialect,
            max_conditions = config.limits.max_conditions,
            max_depth = config.limits.max_depth,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.limits.max_expression_bytes == 0 {
            anyhow::bail!(
                "Configuration error: limits.max_expression_bytes must be greater than 0"
            );
        }
        if self.limits.max_depth == 0 {
            anyhow::bail!("Configuration error: limits.max_depth must be greater than 0");
        }
        if self.limits.max_conditions == 0 {
            anyhow::bail!("Configuration error: limits.max_conditions must be greater than 0");
        }

        // Alias is spliced into SQL text, so only plain identifiers are allowed
        let alias = &self.sql.alias;
        if !alias.is_empty() && !is_sql_identifier(alias) {
            anyhow::bail!(
                "Configuration error: sql.alias '{}' is not a valid identifier",
                alias
            );
        }

        Ok(())
    }

    /// Schema path, or an error naming both ways to set it
    pub fn require_schema_path(&self) -> Result<&Path> {
        self.schema_path.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "No entity schema given. Use --schema or set schema.path in the config file"
            )
        })
    }
}

/// Get the profile config path (~/.filterable/filterable.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
