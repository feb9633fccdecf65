// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "filterable";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".filterable";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "filterable.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "FILTERABLE_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "FILTERABLE_LOG";

// =============================================================================
// Environment Variables - Compilation
// =============================================================================

/// Environment variable for the entity schema file
pub const ENV_SCHEMA: &str = "FILTERABLE_SCHEMA";

/// Environment variable for the SQL dialect (sqlite, postgres, duckdb)
pub const ENV_DIALECT: &str = "FILTERABLE_DIALECT";

/// Environment variable for the table alias prepended to columns
pub const ENV_ALIAS: &str = "FILTERABLE_ALIAS";

// =============================================================================
// Environment Variables - Parse Limits
// =============================================================================

/// Environment variable for maximum expression size in bytes
pub const ENV_MAX_EXPRESSION_BYTES: &str = "FILTERABLE_MAX_EXPRESSION_BYTES";

/// Environment variable for maximum group nesting depth
pub const ENV_MAX_DEPTH: &str = "FILTERABLE_MAX_DEPTH";

/// Environment variable for maximum number of conditions
pub const ENV_MAX_CONDITIONS: &str = "FILTERABLE_MAX_CONDITIONS";
