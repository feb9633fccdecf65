//! Core application

use anyhow::Result;

use crate::core::cli::{self, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::data::filters::{
    EntitySchema, FilterCompiler, FilterError, FormSummary, GuesserChain, RuleNode, SqlParams,
    parse_json_str, parse_with_limits,
};
use crate::utils::file::read_text_arg;
use crate::utils::string::{PREVIEW_MAX_LENGTH, truncate_preview};

pub struct CoreApp {
    pub config: AppConfig,
    pub guessers: GuesserChain,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::new(AppConfig::load(&cli_config)?);
        let output = app.execute(&command)?;
        println!("{}", output);
        Ok(())
    }

    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            guessers: GuesserChain::default(),
        }
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    /// Run one command and return its printable output
    pub fn execute(&self, command: &Commands) -> Result<String> {
        match command {
            Commands::Parse {
                expression,
                payload,
                json,
            } => {
                let node = self.parse_input(expression, *payload)?;
                if *json {
                    Ok(serde_json::to_string_pretty(&node.to_json())?)
                } else {
                    Ok(node.to_string())
                }
            }
            Commands::Compile {
                expression,
                payload,
            } => {
                let schema = self.load_schema()?;
                let node = self.parse_input(expression, *payload)?;
                self.compile(&schema, &node)
            }
            Commands::Fields => {
                let schema = self.load_schema()?;
                Ok(render_fields(&schema))
            }
        }
    }

    fn load_schema(&self) -> Result<EntitySchema> {
        EntitySchema::load_from_file(self.config.require_schema_path()?)
    }

    fn parse_input(&self, arg: &str, payload: bool) -> Result<RuleNode> {
        let limits = &self.config.limits;
        let input = read_text_arg(arg, limits.max_expression_bytes)?;
        let node = if payload {
            parse_json_str(&input, limits)
        } else {
            parse_with_limits(&input, limits)
        };
        node.map_err(filter_error)
    }

    fn compile(&self, schema: &EntitySchema, node: &RuleNode) -> Result<String> {
        let predicate = FilterCompiler::new(schema, &self.guessers)
            .compile(node)
            .map_err(filter_error)?;

        let dialect = self.config.sql.dialect.dialect();
        let mut params = SqlParams::default();
        let sql = predicate.to_sql_aliased(dialect, &mut params, &self.config.sql.alias);

        tracing::debug!(
            entity = schema.entity(),
            dialect = dialect.name(),
            params = params.len(),
            "Rendered filter"
        );

        let conditions = predicate.conditions();
        let forms: Vec<FormSummary<'_>> =
            conditions.iter().map(|c| FormSummary::from(*c)).collect();
        let output = serde_json::json!({
            "entity": schema.entity(),
            "dialect": dialect.name(),
            "sql": sql,
            "params": params.to_json(),
            "forms": forms,
        });
        Ok(serde_json::to_string_pretty(&output)?)
    }
}

/// Attach the stable error code to a filter error
fn filter_error(e: FilterError) -> anyhow::Error {
    anyhow::anyhow!("{} [{}]", e, e.code())
}

fn render_fields(schema: &EntitySchema) -> String {
    let mut lines = vec![format!("Entity: {}", schema.entity())];
    for field in schema.fields() {
        let operators: Vec<&str> = field
            .supported_operators()
            .iter()
            .map(|op| op.name())
            .collect();
        let mut line = format!(
            "  {:<20} {:<9} {}",
            field.name,
            field.field_type.as_str(),
            operators.join(", ")
        );
        if field.column() != field.name {
            line.push_str(&format!("  (column: {})", field.column()));
        }
        if !field.choices.is_empty() {
            line.push_str(&format!(
                "  [{}]",
                truncate_preview(&field.choices.join(", "), PREVIEW_MAX_LENGTH)
            ));
        }
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cli::CliConfig;
    use crate::core::config::FileConfig;
    use crate::data::sql::Backend;

    const SCHEMA: &str = r#"{
        "entity": "ticket",
        "fields": [
            {"name": "status", "type": "choice", "choices": ["open", "closed", "pending"]},
            {"name": "priority", "type": "integer"},
            {"name": "assignee", "type": "string", "column": "assignee_login",
             "form_type": "user_picker"}
        ]
    }"#;

    fn app(dialect: Backend, alias: &str) -> (CoreApp, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("ticket.json");
        std::fs::write(&schema_path, SCHEMA).unwrap();

        let cli = CliConfig {
            schema: Some(schema_path),
            dialect: Some(dialect),
            alias: Some(alias.to_string()),
            ..CliConfig::default()
        };
        let config = AppConfig::from_layers(FileConfig::default(), &cli).unwrap();
        (CoreApp::new(config), dir)
    }

    #[test]
    fn test_parse_command_prints_canonical_form() {
        let (app, _dir) = app(Backend::Postgres, "");
        let output = app
            .execute(&Commands::Parse {
                expression: "status = 'open' and priority >= 3".to_string(),
                payload: false,
                json: false,
            })
            .unwrap();
        assert_eq!(output, r#"status = "open" AND priority >= 3"#);
    }

    #[test]
    fn test_parse_command_json_output() {
        let (app, _dir) = app(Backend::Postgres, "");
        let output = app
            .execute(&Commands::Parse {
                expression: "priority < 2".to_string(),
                payload: false,
                json: true,
            })
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"field": "priority", "op": "lt", "value": 2.0})
        );
    }

    #[test]
    fn test_compile_command() {
        let (app, _dir) = app(Backend::Postgres, "t");
        let output = app
            .execute(&Commands::Compile {
                expression: r#"status = "open" AND (priority >= 3 OR assignee IN ["alice","bob"])"#
                    .to_string(),
                payload: false,
            })
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["entity"], "ticket");
        assert_eq!(value["dialect"], "postgres");
        assert_eq!(
            value["sql"],
            "t.status = $1 AND (t.priority >= $2 OR t.assignee_login IN ($3, $4))"
        );
        assert_eq!(value["params"], serde_json::json!(["open", 3.0, "alice", "bob"]));
        assert_eq!(value["forms"][2]["field"], "assignee");
        assert_eq!(value["forms"][2]["type"], "user_picker");
        assert_eq!(value["forms"][2]["options"]["multiple"], true);
    }

    #[test]
    fn test_compile_command_from_payload() {
        let (app, _dir) = app(Backend::Sqlite, "");
        let output = app
            .execute(&Commands::Compile {
                expression: r#"{"combinator": "or", "rules": [
                    {"field": "priority", "op": "gt", "value": 4},
                    {"field": "status", "op": "isNull"}
                ]}"#
                .to_string(),
                payload: true,
            })
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["sql"], "priority > ? OR status IS NULL");
    }

    #[test]
    fn test_compile_unknown_field_reports_code() {
        let (app, _dir) = app(Backend::Postgres, "");
        let err = app
            .execute(&Commands::Compile {
                expression: "ghost_field = 'boo'".to_string(),
                payload: false,
            })
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot filter by unknown field: ghost_field [UNKNOWN_FILTER_FIELD]"
        );
    }

    #[test]
    fn test_compile_without_schema() {
        let config = AppConfig::from_layers(FileConfig::default(), &CliConfig::default()).unwrap();
        let app = CoreApp::new(config);
        assert!(app.config.schema_path.is_none());

        let err = app.execute(&Commands::Fields).unwrap_err();
        assert!(err.to_string().contains("No entity schema given"));
    }

    #[test]
    fn test_fields_command() {
        let (app, _dir) = app(Backend::Postgres, "");
        let output = app.execute(&Commands::Fields).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "Entity: ticket");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("status") && lines[1].contains("[open, closed, pending]"));
        assert!(lines[2].contains("integer") && lines[2].contains("between"));
        assert!(lines[3].contains("(column: assignee_login)"));
    }
}
