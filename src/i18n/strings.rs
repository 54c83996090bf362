//! UI string catalog: translation keys with one value per language.
//!
//! Values are stored raw. Placeholders use `{name}` syntax and are filled by
//! [`StringCatalog::format`].

use crate::i18n::resolver::{FallbackResolver, ResolutionSource, ResolvedString};
use crate::i18n::ResolutionMetrics;
use crate::validation::{normalize_language_code, validate_string_key, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A translation key and its per-language values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiString {
    pub key: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

/// Payload for creating a translation key.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewUiString {
    pub key: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl NewUiString {
    /// Validate the key and normalize the language codes of the values.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let key = self.key.trim().to_string();
        validate_string_key(&key)?;

        let values = self
            .values
            .into_iter()
            .map(|(code, value)| Ok((normalize_language_code(&code)?, value)))
            .collect::<Result<BTreeMap<_, _>, ValidationError>>()?;

        Ok(Self {
            key,
            description: self.description.filter(|d| !d.trim().is_empty()),
            values,
        })
    }
}

/// Lookup table over all UI strings for one default language.
#[derive(Debug, Clone)]
pub struct StringCatalog {
    default_language: String,
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl StringCatalog {
    pub fn new(strings: Vec<UiString>, default_language: &str) -> Self {
        Self {
            default_language: default_language.to_string(),
            entries: strings.into_iter().map(|s| (s.key, s.values)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve one key through requested → default → raw key.
    pub fn get(&self, key: &str, language: &str) -> ResolvedString {
        let resolver = FallbackResolver::new(language, &self.default_language);
        let empty = BTreeMap::new();
        let values = self.entries.get(key).unwrap_or(&empty);

        let resolved = resolver.resolve_string(key, values);
        ResolutionMetrics::global().record(resolved.source);
        resolved
    }

    /// Resolve a key and fill `{name}` placeholders.
    ///
    /// Unknown placeholders are left in place so missing arguments stay visible.
    pub fn format(&self, key: &str, language: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.get(key, language).value;
        for (name, value) in args {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        text
    }

    /// Every key resolved for one language, for shipping to the frontend.
    pub fn bundle(&self, language: &str) -> BTreeMap<String, String> {
        self.entries
            .keys()
            .map(|key| (key.clone(), self.get(key, language).value))
            .collect()
    }

    /// Keys that have no non-empty value in `language`.
    pub fn missing(&self, language: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, values)| values.get(language).map_or(true, |v| v.is_empty()))
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Count of keys per resolution source for one language.
    pub fn coverage(&self, language: &str) -> BTreeMap<&'static str, usize> {
        let resolver = FallbackResolver::new(language, &self.default_language);
        let mut counts = BTreeMap::new();
        for (key, values) in &self.entries {
            let label = match resolver.resolve_string(key, values).source {
                ResolutionSource::Exact => "exact",
                ResolutionSource::DefaultLanguage => "default_language",
                ResolutionSource::RawKey => "raw_key",
            };
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui(key: &str, values: &[(&str, &str)]) -> UiString {
        UiString {
            key: key.to_string(),
            description: None,
            values: values
                .iter()
                .map(|(code, value)| (code.to_string(), value.to_string()))
                .collect(),
        }
    }

    fn catalog() -> StringCatalog {
        StringCatalog::new(
            vec![
                ui("nav.projects", &[("nl", "Projecten"), ("fr", "Projets")]),
                ui("nav.about", &[("nl", "Over ons")]),
                ui("footer.copyright", &[("nl", "© {year} {name}"), ("fr", "© {year} {name}")]),
                ui("cta.contact", &[]),
            ],
            "nl",
        )
    }

    #[test]
    fn test_get_exact() {
        let resolved = catalog().get("nav.projects", "fr");
        assert_eq!(resolved.value, "Projets");
        assert_eq!(resolved.source, ResolutionSource::Exact);
    }

    #[test]
    fn test_get_falls_back_to_default() {
        let resolved = catalog().get("nav.about", "fr");
        assert_eq!(resolved.value, "Over ons");
        assert_eq!(resolved.used_language.as_deref(), Some("nl"));
    }

    #[test]
    fn test_get_unknown_key_is_raw_key() {
        let resolved = catalog().get("does.not.exist", "fr");
        assert_eq!(resolved.value, "does.not.exist");
        assert_eq!(resolved.source, ResolutionSource::RawKey);
    }

    #[test]
    fn test_get_key_without_values_is_raw_key() {
        assert_eq!(catalog().get("cta.contact", "nl").value, "cta.contact");
    }

    #[test]
    fn test_format_fills_placeholders() {
        let text = catalog().format(
            "footer.copyright",
            "fr",
            &[("year", "2024"), ("name", "Atelier")],
        );
        assert_eq!(text, "© 2024 Atelier");
    }

    #[test]
    fn test_format_leaves_unknown_placeholders() {
        let text = catalog().format("footer.copyright", "nl", &[("year", "2024")]);
        assert_eq!(text, "© 2024 {name}");
    }

    #[test]
    fn test_bundle_resolves_every_key() {
        let bundle = catalog().bundle("fr");
        assert_eq!(bundle.len(), 4);
        assert_eq!(bundle["nav.projects"], "Projets");
        assert_eq!(bundle["nav.about"], "Over ons");
        assert_eq!(bundle["cta.contact"], "cta.contact");
    }

    #[test]
    fn test_missing_keys() {
        let catalog = catalog();
        assert_eq!(catalog.missing("fr"), vec!["cta.contact", "nav.about"]);
        assert_eq!(catalog.missing("nl"), vec!["cta.contact"]);
    }

    #[test]
    fn test_coverage() {
        let coverage = catalog().coverage("fr");
        assert_eq!(coverage.get("exact"), Some(&2));
        assert_eq!(coverage.get("default_language"), Some(&1));
        assert_eq!(coverage.get("raw_key"), Some(&1));
    }

    #[test]
    fn test_new_ui_string_validated() {
        let input = NewUiString {
            key: " nav.home ".to_string(),
            description: Some("  ".to_string()),
            values: [("NL".to_string(), "Home".to_string())].into_iter().collect(),
        };

        let validated = input.validated().expect("valid");
        assert_eq!(validated.key, "nav.home");
        assert!(validated.description.is_none());
        assert_eq!(validated.values.get("nl").map(String::as_str), Some("Home"));
    }

    #[test]
    fn test_new_ui_string_rejects_bad_language() {
        let input = NewUiString {
            key: "nav.home".to_string(),
            description: None,
            values: [("dutch".to_string(), "Home".to_string())].into_iter().collect(),
        };
        assert!(input.validated().is_err());
    }

    #[test]
    fn test_catalog_len() {
        assert_eq!(catalog().len(), 4);
        assert!(!catalog().is_empty());
    }
}
