//! Form/query config guessers
//!
//! A guesser inspects one leaf and its field metadata and fills in a
//! [`FilterFormConfig`]. Guessers run in an explicit, caller-ordered
//! [`GuesserChain`]: the first guesser to set the form type wins, while
//! options from later guessers override earlier ones on key collision.
//! Field-type defaults only fill keys nobody set.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};

use super::ast::{Leaf, OperatorKind};
use super::metadata::{FieldMetadata, FieldType};

/// Configuration accumulated for rendering and compiling one leaf
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterFormConfig {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub form_type: Option<String>,
    pub options: Map<String, JsonValue>,
}

impl FilterFormConfig {
    /// Set the form type unless an earlier guess already set it.
    /// Returns whether the type was set.
    pub fn set_type_if_unset(&mut self, form_type: &str) -> bool {
        if self.form_type.is_some() {
            return false;
        }
        self.form_type = Some(form_type.to_string());
        true
    }

    /// Merge options; incoming keys override existing ones
    pub fn merge_options(&mut self, options: &Map<String, JsonValue>) {
        for (key, value) in options {
            self.options.insert(key.clone(), value.clone());
        }
    }

    pub fn set_option(&mut self, key: &str, value: JsonValue) {
        self.options.insert(key.to_string(), value);
    }

    /// Set an option unless an earlier guess already set it
    pub fn set_option_if_unset(&mut self, key: &str, value: JsonValue) {
        self.options.entry(key).or_insert(value);
    }
}

/// Infers form/query configuration for a leaf from its field metadata
pub trait FormGuesser: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str {
        "custom"
    }

    /// Mutate `config` only; `leaf` and `meta` are read-only
    fn guess(&self, config: &mut FilterFormConfig, leaf: &Leaf, meta: &FieldMetadata);
}

impl<F> FormGuesser for F
where
    F: Fn(&mut FilterFormConfig, &Leaf, &FieldMetadata) + Send + Sync,
{
    fn guess(&self, config: &mut FilterFormConfig, leaf: &Leaf, meta: &FieldMetadata) {
        self(config, leaf, meta)
    }
}

/// Copies the form type and options declared on the field metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataGuesser;

impl FormGuesser for MetadataGuesser {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn guess(&self, config: &mut FilterFormConfig, _leaf: &Leaf, meta: &FieldMetadata) {
        if let Some(form_type) = &meta.form_type {
            config.set_type_if_unset(form_type);
        }
        config.merge_options(&meta.form_options);
    }
}

/// Adds options implied by the leaf's operator
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorGuesser;

impl FormGuesser for OperatorGuesser {
    fn name(&self) -> &'static str {
        "operator"
    }

    fn guess(&self, config: &mut FilterFormConfig, leaf: &Leaf, _meta: &FieldMetadata) {
        match leaf.operator {
            OperatorKind::In | OperatorKind::NotIn => config.set_option("multiple", json!(true)),
            OperatorKind::Between => config.set_option("range", json!(true)),
            OperatorKind::Contains => config.set_option("match", json!("contains")),
            OperatorKind::StartsWith => config.set_option("match", json!("prefix")),
            OperatorKind::EndsWith => config.set_option("match", json!("suffix")),
            OperatorKind::IsNull | OperatorKind::IsNotNull => {
                config.set_type_if_unset("checkbox");
            }
            OperatorKind::Eq
            | OperatorKind::Neq
            | OperatorKind::Lt
            | OperatorKind::Lte
            | OperatorKind::Gt
            | OperatorKind::Gte => {}
        }
    }
}

/// Falls back to a control type and options derived from the field type.
/// Only fills what earlier guessers left unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldTypeGuesser;

impl FormGuesser for FieldTypeGuesser {
    fn name(&self) -> &'static str {
        "field_type"
    }

    fn guess(&self, config: &mut FilterFormConfig, _leaf: &Leaf, meta: &FieldMetadata) {
        let form_type = match meta.field_type {
            FieldType::String | FieldType::Uuid => "text",
            FieldType::Integer | FieldType::Float => "number",
            FieldType::Datetime => "datetime",
            FieldType::Boolean => "checkbox",
            FieldType::Choice => "choice",
        };
        config.set_type_if_unset(form_type);

        match meta.field_type {
            FieldType::Integer => config.set_option_if_unset("step", json!(1)),
            FieldType::Float => config.set_option_if_unset("step", json!("any")),
            FieldType::Choice => config.set_option_if_unset("choices", json!(meta.choices)),
            _ => {}
        }
    }
}

/// Ordered sequence of guessers applied to every leaf
pub struct GuesserChain {
    guessers: Vec<Box<dyn FormGuesser>>,
}

impl GuesserChain {
    /// A chain with no guessers
    pub fn empty() -> Self {
        Self {
            guessers: Vec::new(),
        }
    }

    /// Append a guesser; it runs after every guesser already in the chain
    pub fn with(mut self, guesser: impl FormGuesser + 'static) -> Self {
        self.guessers.push(Box::new(guesser));
        self
    }

    pub fn len(&self) -> usize {
        self.guessers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guessers.is_empty()
    }

    /// Build the config for one leaf by running every guesser in order
    pub fn run(&self, leaf: &Leaf, meta: &FieldMetadata) -> FilterFormConfig {
        let mut config = FilterFormConfig::default();
        for guesser in &self.guessers {
            guesser.guess(&mut config, leaf, meta);
            tracing::trace!(
                guesser = guesser.name(),
                field = %leaf.field,
                form_type = ?config.form_type,
                "Applied form guesser"
            );
        }
        config
    }
}

impl Default for GuesserChain {
    /// Metadata first so an explicit form type wins, then operator hints,
    /// then the field-type fallback.
    fn default() -> Self {
        Self::empty()
            .with(MetadataGuesser)
            .with(OperatorGuesser)
            .with(FieldTypeGuesser)
    }
}

impl std::fmt::Debug for GuesserChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.guessers.iter().map(|g| g.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filters::ast::Operand;

    fn leaf(op: OperatorKind, operand: Operand) -> Leaf {
        Leaf::new("assignee", op, operand)
    }

    fn eq_leaf() -> Leaf {
        leaf(OperatorKind::Eq, Operand::Single("alice".into()))
    }

    fn options(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn metadata_guesser_sets_type_and_options() {
        let meta = FieldMetadata::new("assignee", FieldType::String)
            .with_form_type("user_picker")
            .with_form_option("searchable", json!(true));
        let mut config = FilterFormConfig::default();

        MetadataGuesser.guess(&mut config, &eq_leaf(), &meta);

        assert_eq!(config.form_type.as_deref(), Some("user_picker"));
        assert_eq!(config.options, options(json!({"searchable": true})));
    }

    #[test]
    fn metadata_guesser_keeps_earlier_type() {
        let meta = FieldMetadata::new("assignee", FieldType::String).with_form_type("user_picker");
        let mut config = FilterFormConfig {
            form_type: Some("autocomplete".to_string()),
            ..FilterFormConfig::default()
        };

        MetadataGuesser.guess(&mut config, &eq_leaf(), &meta);

        assert_eq!(config.form_type.as_deref(), Some("autocomplete"));
    }

    #[test]
    fn missing_form_type_leaves_type_unset() {
        let meta = FieldMetadata::new("assignee", FieldType::String);
        let mut config = FilterFormConfig::default();

        MetadataGuesser.guess(&mut config, &eq_leaf(), &meta);

        assert!(config.form_type.is_none());
        assert!(config.options.is_empty());
    }

    #[test]
    fn guess_twice_is_idempotent_on_type() {
        let meta = FieldMetadata::new("assignee", FieldType::String).with_form_type("user_picker");
        let leaf = eq_leaf();
        let mut config = FilterFormConfig::default();

        MetadataGuesser.guess(&mut config, &leaf, &meta);
        let first = config.form_type.clone();
        MetadataGuesser.guess(&mut config, &leaf, &meta);

        assert_eq!(config.form_type, first);
    }

    #[test]
    fn later_guesser_options_win() {
        let g1 = |config: &mut FilterFormConfig, _: &Leaf, _: &FieldMetadata| {
            config.merge_options(&options(json!({"a": 1, "b": 2})));
        };
        let g2 = |config: &mut FilterFormConfig, _: &Leaf, _: &FieldMetadata| {
            config.merge_options(&options(json!({"b": 3, "c": 4})));
        };
        let chain = GuesserChain::empty().with(g1).with(g2);
        let meta = FieldMetadata::new("assignee", FieldType::String);

        let config = chain.run(&eq_leaf(), &meta);

        assert_eq!(config.options, options(json!({"a": 1, "b": 3, "c": 4})));
    }

    #[test]
    fn default_chain_prefers_metadata_type() {
        let meta = FieldMetadata::new("priority", FieldType::Integer).with_form_type("slider");
        let config = GuesserChain::default().run(
            &leaf(OperatorKind::Gte, Operand::Single(3.0.into())),
            &meta,
        );

        assert_eq!(config.form_type.as_deref(), Some("slider"));
        assert_eq!(config.options, options(json!({"step": 1})));
    }

    #[test]
    fn default_chain_falls_back_to_field_type() {
        let meta = FieldMetadata::new("status", FieldType::Choice).with_choices(["open", "closed"]);
        let config = GuesserChain::default().run(
            &leaf(OperatorKind::In, Operand::List(vec!["open".into()])),
            &meta,
        );

        assert_eq!(config.form_type.as_deref(), Some("choice"));
        assert_eq!(
            config.options,
            options(json!({"multiple": true, "choices": ["open", "closed"]}))
        );
    }

    #[test]
    fn default_chain_keeps_metadata_options() {
        let meta = FieldMetadata::new("priority", FieldType::Integer)
            .with_form_option("step", json!(5));
        let config = GuesserChain::default().run(
            &leaf(OperatorKind::Gte, Operand::Single(3.0.into())),
            &meta,
        );

        assert_eq!(config.form_type.as_deref(), Some("number"));
        assert_eq!(config.options, options(json!({"step": 5})));

        let meta = FieldMetadata::new("status", FieldType::Choice)
            .with_choices(["open", "closed"])
            .with_form_option("choices", json!(["open"]));
        let config = GuesserChain::default().run(&eq_leaf(), &meta);
        assert_eq!(config.options, options(json!({"choices": ["open"]})));
    }

    #[test]
    fn null_check_uses_checkbox() {
        let meta = FieldMetadata::new("closed_at", FieldType::Datetime);
        let config = GuesserChain::default().run(&leaf(OperatorKind::IsNull, Operand::None), &meta);
        assert_eq!(config.form_type.as_deref(), Some("checkbox"));
    }

    #[test]
    fn guessers_do_not_touch_inputs() {
        let meta = FieldMetadata::new("assignee", FieldType::String)
            .with_form_type("user_picker")
            .with_form_option("searchable", json!(true));
        let leaf = eq_leaf();
        let (meta_before, leaf_before) = (meta.clone(), leaf.clone());

        GuesserChain::default().run(&leaf, &meta);

        assert_eq!(meta, meta_before);
        assert_eq!(leaf, leaf_before);
    }

    #[test]
    fn chain_debug_lists_names() {
        let chain = GuesserChain::default();
        assert_eq!(chain.len(), 3);
        assert_eq!(format!("{:?}", chain), r#"["metadata", "operator", "field_type"]"#);
    }
}
