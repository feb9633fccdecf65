//! Field metadata
//!
//! Metadata is owned by a [`FieldMetadataProvider`]; the filter pipeline only
//! reads it. [`EntitySchema`] is the in-memory provider, loadable from JSON.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::ast::OperatorKind;
use crate::utils::sql::is_sql_column;

/// Storage type of a filterable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Datetime,
    Uuid,
    Choice,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Datetime => "datetime",
            FieldType::Uuid => "uuid",
            FieldType::Choice => "choice",
        }
    }

    /// Operators a field of this type supports unless metadata narrows them
    pub fn default_operators(&self) -> &'static [OperatorKind] {
        use OperatorKind::*;
        match self {
            FieldType::String => &[
                Eq, Neq, In, NotIn, Contains, StartsWith, EndsWith, IsNull, IsNotNull,
            ],
            FieldType::Integer | FieldType::Float => &[
                Eq, Neq, Lt, Lte, Gt, Gte, Between, In, NotIn, IsNull, IsNotNull,
            ],
            FieldType::Datetime => &[Eq, Neq, Lt, Lte, Gt, Gte, Between, IsNull, IsNotNull],
            FieldType::Boolean => &[Eq, Neq, IsNull, IsNotNull],
            FieldType::Uuid | FieldType::Choice => &[Eq, Neq, In, NotIn, IsNull, IsNotNull],
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only description of one filterable field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Storage column; defaults to the field name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Explicit operator allow-list, replacing the type defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<OperatorKind>>,
    /// Allowed values of a choice field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_type: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub form_options: serde_json::Map<String, serde_json::Value>,
}

fn default_nullable() -> bool {
    true
}

impl FieldMetadata {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            column: None,
            nullable: true,
            operators: None,
            choices: Vec::new(),
            form_type: None,
            form_options: serde_json::Map::new(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_operators(mut self, operators: Vec<OperatorKind>) -> Self {
        self.operators = Some(operators);
        self
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_form_type(mut self, form_type: impl Into<String>) -> Self {
        self.form_type = Some(form_type.into());
        self
    }

    pub fn with_form_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.form_options.insert(key.into(), value);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Storage column the predicate targets
    pub fn column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    pub fn supported_operators(&self) -> &[OperatorKind] {
        match &self.operators {
            Some(ops) => ops,
            None => self.field_type.default_operators(),
        }
    }

    pub fn supports(&self, operator: OperatorKind) -> bool {
        self.supported_operators().contains(&operator)
    }
}

/// Source of field metadata for one entity.
///
/// Implementations must return consistent answers for the duration of a
/// single compile pass.
pub trait FieldMetadataProvider: Send + Sync {
    /// Metadata for a field, or `None` if the entity has no such field
    fn field_metadata(&self, field: &str) -> Option<&FieldMetadata>;
}

/// In-memory field metadata for one entity
#[derive(Debug, Clone, Default)]
pub struct EntitySchema {
    entity: String,
    fields: Vec<FieldMetadata>,
    index: FxHashMap<String, usize>,
}

#[derive(Debug, Deserialize)]
struct SchemaFile {
    entity: String,
    fields: Vec<FieldMetadata>,
}

impl EntitySchema {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Self::default()
        }
    }

    /// Add or replace a field
    pub fn with_field(mut self, field: FieldMetadata) -> Self {
        self.insert(field);
        self
    }

    pub fn insert(&mut self, field: FieldMetadata) {
        match self.index.get(&field.name) {
            Some(&i) => self.fields[i] = field,
            None => {
                self.index.insert(field.name.clone(), self.fields.len());
                self.fields.push(field);
            }
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldMetadata] {
        &self.fields
    }

    /// Parse a schema document: `{"entity": "...", "fields": [...]}`
    pub fn from_json(json_str: &str) -> Result<Self> {
        let file: SchemaFile =
            serde_json::from_str(json_str).context("Failed to parse entity schema")?;
        let mut schema = Self::new(file.entity);
        for field in file.fields {
            if schema.index.contains_key(&field.name) {
                anyhow::bail!("Duplicate field '{}' in schema", field.name);
            }
            if !is_sql_column(field.column()) {
                anyhow::bail!(
                    "Field '{}' maps to invalid column '{}'",
                    field.name,
                    field.column()
                );
            }
            if field.field_type == FieldType::Choice && field.choices.is_empty() {
                anyhow::bail!("Choice field '{}' declares no choices", field.name);
            }
            schema.insert(field);
        }
        Ok(schema)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading entity schema");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
        let schema = Self::from_json(&content)
            .with_context(|| format!("Invalid schema file: {}", path.display()))?;
        tracing::debug!(
            entity = %schema.entity,
            fields = schema.fields.len(),
            "Entity schema loaded"
        );
        Ok(schema)
    }
}

impl FieldMetadataProvider for EntitySchema {
    fn field_metadata(&self, field: &str) -> Option<&FieldMetadata> {
        self.index.get(field).map(|&i| &self.fields[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_serde() {
        let t: FieldType = serde_json::from_str(r#""datetime""#).unwrap();
        assert_eq!(t, FieldType::Datetime);
        assert_eq!(FieldType::Choice.to_string(), "choice");
    }

    #[test]
    fn test_column_defaults_to_name() {
        let field = FieldMetadata::new("start_time", FieldType::Datetime);
        assert_eq!(field.column(), "start_time");

        let field = field.with_column("timestamp_start");
        assert_eq!(field.column(), "timestamp_start");
    }

    #[test]
    fn test_operator_allow_list_overrides_defaults() {
        let field = FieldMetadata::new("title", FieldType::String);
        assert!(field.supports(OperatorKind::Contains));
        assert!(!field.supports(OperatorKind::Gt));

        let field = field.with_operators(vec![OperatorKind::Eq]);
        assert!(field.supports(OperatorKind::Eq));
        assert!(!field.supports(OperatorKind::Contains));
    }

    #[test]
    fn test_boolean_supports_equality_only() {
        let field = FieldMetadata::new("is_root", FieldType::Boolean);
        assert!(field.supports(OperatorKind::Eq));
        assert!(!field.supports(OperatorKind::Lt));
        assert!(!field.supports(OperatorKind::In));
    }

    #[test]
    fn test_schema_lookup() {
        let schema = EntitySchema::new("ticket")
            .with_field(
                FieldMetadata::new("status", FieldType::Choice).with_choices(["open", "closed"]),
            )
            .with_field(FieldMetadata::new("priority", FieldType::Integer));

        assert_eq!(schema.entity(), "ticket");
        assert_eq!(
            schema.field_metadata("priority").map(|f| f.field_type),
            Some(FieldType::Integer)
        );
        assert!(schema.field_metadata("ghost_field").is_none());
    }

    #[test]
    fn test_schema_insert_replaces() {
        let mut schema = EntitySchema::new("ticket");
        schema.insert(FieldMetadata::new("title", FieldType::String));
        schema.insert(FieldMetadata::new("title", FieldType::String).with_form_type("textarea"));

        assert_eq!(schema.fields().len(), 1);
        assert_eq!(
            schema.field_metadata("title").unwrap().form_type.as_deref(),
            Some("textarea")
        );
    }

    #[test]
    fn test_schema_from_json() {
        let json = r#"{
            "entity": "ticket",
            "fields": [
                {"name": "title", "type": "string", "form_type": "search"},
                {"name": "created", "type": "datetime", "column": "created_at", "nullable": false},
                {"name": "state", "type": "choice", "choices": ["open", "closed"],
                 "form_options": {"expanded": true}}
            ]
        }"#;
        let schema = EntitySchema::from_json(json).unwrap();

        let fields: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["title", "created", "state"]);

        let created = schema.field_metadata("created").unwrap();
        assert_eq!(created.column(), "created_at");
        assert!(!created.nullable);

        let state = schema.field_metadata("state").unwrap();
        assert_eq!(state.choices, vec!["open", "closed"]);
        assert_eq!(state.form_options.get("expanded"), Some(&serde_json::json!(true)));
    }

    #[test]
    fn test_schema_from_json_rejects_duplicates() {
        let json = r#"{"entity": "t", "fields": [
            {"name": "a", "type": "string"},
            {"name": "a", "type": "integer"}
        ]}"#;
        let err = EntitySchema::from_json(json).unwrap_err();
        assert!(err.to_string().contains("Duplicate field 'a'"));
    }

    #[test]
    fn test_schema_from_json_rejects_choice_without_choices() {
        let json = r#"{"entity": "t", "fields": [{"name": "s", "type": "choice"}]}"#;
        assert!(EntitySchema::from_json(json).is_err());
    }

    #[test]
    fn test_schema_from_json_rejects_invalid_columns() {
        let json = r#"{"entity": "t", "fields": [
            {"name": "a", "type": "integer", "column": "a = 1 OR 1=1 --"}
        ]}"#;
        let err = EntitySchema::from_json(json).unwrap_err();
        assert!(err.to_string().contains("invalid column 'a = 1 OR 1=1 --'"));

        // Without an explicit column the name is used as the column
        let json = r#"{"entity": "t", "fields": [{"name": "first name", "type": "string"}]}"#;
        assert!(EntitySchema::from_json(json).is_err());

        let json = r#"{"entity": "t", "fields": [
            {"name": "owner", "type": "string", "column": "meta.owner_login"}
        ]}"#;
        assert!(EntitySchema::from_json(json).is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(
            &path,
            r#"{"entity": "note", "fields": [{"name": "body", "type": "string"}]}"#,
        )
        .unwrap();

        let schema = EntitySchema::load_from_file(&path).unwrap();
        assert_eq!(schema.entity(), "note");
        assert!(schema.field_metadata("body").is_some());
    }
}
