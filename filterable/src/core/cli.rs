use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_ALIAS, ENV_CONFIG, ENV_DIALECT, ENV_MAX_CONDITIONS, ENV_MAX_DEPTH,
    ENV_MAX_EXPRESSION_BYTES, ENV_SCHEMA,
};
use crate::data::sql::Backend;

#[derive(Parser)]
#[command(name = "filterable")]
#[command(version, about = "Filter expression parser and compiler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Entity schema file (JSON)
    #[arg(long, short = 's', global = true, env = ENV_SCHEMA)]
    pub schema: Option<PathBuf>,

    /// SQL dialect (sqlite, postgres or duckdb)
    #[arg(long, short = 'd', global = true, env = ENV_DIALECT, value_parser = parse_backend)]
    pub dialect: Option<Backend>,

    /// Table alias prepended to column names
    #[arg(long, short = 'a', global = true, env = ENV_ALIAS)]
    pub alias: Option<String>,

    /// Maximum filter expression size in bytes
    #[arg(long, global = true, env = ENV_MAX_EXPRESSION_BYTES)]
    pub max_expression_bytes: Option<usize>,

    /// Maximum group nesting depth
    #[arg(long, global = true, env = ENV_MAX_DEPTH)]
    pub max_depth: Option<usize>,

    /// Maximum number of conditions in one filter
    #[arg(long, global = true, env = ENV_MAX_CONDITIONS)]
    pub max_conditions: Option<usize>,
}

/// Parse SQL dialect from CLI/env string
fn parse_backend(s: &str) -> Result<Backend, String> {
    s.parse()
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Parse a filter and print its canonical form
    Parse {
        /// Filter expression; `-` reads stdin, `@path` reads a file
        expression: String,

        /// Treat the input as a JSON rule payload instead of expression text
        #[arg(long)]
        payload: bool,

        /// Print the rule tree as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compile a filter against the entity schema and print SQL
    Compile {
        /// Filter expression; `-` reads stdin, `@path` reads a file
        expression: String,

        /// Treat the input as a JSON rule payload instead of expression text
        #[arg(long)]
        payload: bool,
    },
    /// List the filterable fields of the entity schema
    Fields,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub schema: Option<PathBuf>,
    pub dialect: Option<Backend>,
    pub alias: Option<String>,
    pub max_expression_bytes: Option<usize>,
    pub max_depth: Option<usize>,
    pub max_conditions: Option<usize>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        schema: cli.schema,
        dialect: cli.dialect,
        alias: cli.alias,
        max_expression_bytes: cli.max_expression_bytes,
        max_depth: cli.max_depth,
        max_conditions: cli.max_conditions,
    };
    (config, cli.command)
}
