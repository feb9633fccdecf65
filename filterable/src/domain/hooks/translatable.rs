//! Locale-aware field values on read

use serde_json::Value;

use super::{EntityHook, HookError, Record};

/// Record key holding per-locale field values:
/// `{"translations": {"fr": {"title": "..."}}}`
pub const TRANSLATIONS_KEY: &str = "translations";

/// Replaces the listed fields with their translation for `locale` on read,
/// falling back to `fallback` and then to the stored value
#[derive(Debug, Clone)]
pub struct Translatable {
    pub fields: Vec<String>,
    pub locale: String,
    pub fallback: Option<String>,
}

impl Translatable {
    pub fn new<I, S>(fields: I, locale: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            locale: locale.into(),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, locale: impl Into<String>) -> Self {
        self.fallback = Some(locale.into());
        self
    }

    fn lookup(&self, translations: &Value, field: &str) -> Option<Value> {
        std::iter::once(self.locale.as_str())
            .chain(self.fallback.as_deref())
            .find_map(|locale| match translations.get(locale)?.get(field)? {
                Value::Null => None,
                value => Some(value.clone()),
            })
    }
}

impl EntityHook for Translatable {
    fn name(&self) -> &'static str {
        "translatable"
    }

    fn on_read(&self, record: &mut Record) -> Result<(), HookError> {
        let Some(translations) = record.get(TRANSLATIONS_KEY) else {
            return Ok(());
        };
        if !translations.is_object() {
            return Err(HookError::invalid_field(
                TRANSLATIONS_KEY,
                "expected an object keyed by locale",
            ));
        }

        let resolved: Vec<(String, Value)> = self
            .fields
            .iter()
            .filter_map(|field| Some((field.clone(), self.lookup(translations, field)?)))
            .collect();

        for (field, value) in resolved {
            record.insert(field, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ticket() -> Record {
        json!({
            "title": "Broken login",
            "body": "Cannot sign in",
            "translations": {
                "fr": {"title": "Connexion cassée"},
                "de": {"title": "Anmeldung defekt", "body": "Kann mich nicht anmelden"}
            }
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_replaces_with_locale() {
        let hook = Translatable::new(["title", "body"], "de");
        let mut rec = ticket();
        hook.on_read(&mut rec).unwrap();
        assert_eq!(rec["title"], json!("Anmeldung defekt"));
        assert_eq!(rec["body"], json!("Kann mich nicht anmelden"));
    }

    #[test]
    fn test_falls_back_per_field() {
        let hook = Translatable::new(["title", "body"], "fr").with_fallback("de");
        let mut rec = ticket();
        hook.on_read(&mut rec).unwrap();
        assert_eq!(rec["title"], json!("Connexion cassée"));
        assert_eq!(rec["body"], json!("Kann mich nicht anmelden"));
    }

    #[test]
    fn test_keeps_stored_value_without_translation() {
        let hook = Translatable::new(["title", "body"], "fr");
        let mut rec = ticket();
        hook.on_read(&mut rec).unwrap();
        assert_eq!(rec["body"], json!("Cannot sign in"));
    }

    #[test]
    fn test_record_without_translations() {
        let hook = Translatable::new(["title"], "fr");
        let mut rec = json!({"title": "x"}).as_object().cloned().unwrap();
        hook.on_read(&mut rec).unwrap();
        assert_eq!(rec["title"], json!("x"));
    }

    #[test]
    fn test_rejects_malformed_translations() {
        let hook = Translatable::new(["title"], "fr");
        let mut rec = json!({"title": "x", "translations": "fr"})
            .as_object()
            .cloned()
            .unwrap();
        assert!(matches!(
            hook.on_read(&mut rec),
            Err(HookError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_insert_is_untouched() {
        let hook = Translatable::new(["title"], "fr");
        let mut rec = ticket();
        hook.before_insert(&mut rec).unwrap();
        assert_eq!(rec["title"], json!("Broken login"));
    }
}
