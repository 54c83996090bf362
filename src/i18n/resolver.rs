//! Fallback resolution: requested language, then default language, then the
//! raw key (UI strings) or nothing (content).
//!
//! Everything here is pure. Callers record metrics and decide how a miss is
//! reported (404 for content, the key itself for UI strings).

use serde::Serialize;
use std::collections::BTreeMap;

/// Anything stored as one row per language.
pub trait Localized {
    fn language_code(&self) -> &str;
}

/// Values that can be present but say nothing. A blank value counts as
/// missing and the chain moves on to the next language.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// The requested language had a value
    Exact,
    /// The default language stood in
    DefaultLanguage,
    /// Nothing matched; the key itself is displayed
    RawKey,
}

/// A value together with the language it was actually found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub requested_language: String,
    pub used_language: String,
    pub source: ResolutionSource,
}

impl<T> Resolved<T> {
    /// True when the visitor is not seeing their requested language.
    pub fn is_fallback(&self) -> bool {
        self.source != ResolutionSource::Exact
    }

    /// Transform the value, keeping the resolution metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            value: f(self.value),
            requested_language: self.requested_language,
            used_language: self.used_language,
            source: self.source,
        }
    }
}

/// A UI string after resolution. `used_language` is `None` when the raw key
/// is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedString {
    pub key: String,
    pub value: String,
    pub used_language: Option<String>,
    pub source: ResolutionSource,
}

/// The fallback chain for one request.
#[derive(Debug, Clone, Copy)]
pub struct FallbackResolver<'a> {
    requested: &'a str,
    default: &'a str,
}

impl<'a> FallbackResolver<'a> {
    pub fn new(requested: &'a str, default: &'a str) -> Self {
        Self { requested, default }
    }

    pub fn requested(&self) -> &'a str {
        self.requested
    }

    pub fn default_language(&self) -> &'a str {
        self.default
    }

    /// Resolve one row out of a set of per-language rows.
    ///
    /// Returns `None` when neither the requested nor the default language has
    /// a row. Rows in other languages are never used.
    pub fn resolve<'t, T: Localized>(&self, rows: &'t [T]) -> Option<Resolved<&'t T>> {
        self.pick(|code| rows.iter().find(|row| row.language_code() == code))
    }

    /// Resolve a value out of a `language code -> value` map, skipping blank
    /// values.
    pub fn resolve_map<'t, V: Blank>(&self, values: &'t BTreeMap<String, V>) -> Option<Resolved<&'t V>> {
        self.pick(|code| values.get(code).filter(|value| !value.is_blank()))
    }

    /// Resolve a UI string, degrading to the key itself.
    pub fn resolve_string(&self, key: &str, values: &BTreeMap<String, String>) -> ResolvedString {
        match self.resolve_map(values) {
            Some(resolved) => ResolvedString {
                key: key.to_string(),
                value: resolved.value.clone(),
                used_language: Some(resolved.used_language),
                source: resolved.source,
            },
            None => ResolvedString {
                key: key.to_string(),
                value: key.to_string(),
                used_language: None,
                source: ResolutionSource::RawKey,
            },
        }
    }

    fn pick<'t, V: ?Sized>(
        &self,
        lookup: impl Fn(&str) -> Option<&'t V>,
    ) -> Option<Resolved<&'t V>> {
        if let Some(value) = lookup(self.requested) {
            return Some(self.resolved(value, self.requested, ResolutionSource::Exact));
        }

        if self.default != self.requested {
            if let Some(value) = lookup(self.default) {
                return Some(self.resolved(value, self.default, ResolutionSource::DefaultLanguage));
            }
        }

        None
    }

    fn resolved<V>(&self, value: V, used: &str, source: ResolutionSource) -> Resolved<V> {
        Resolved {
            value,
            requested_language: self.requested.to_string(),
            used_language: used.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        language: String,
        title: String,
    }

    impl Localized for Row {
        fn language_code(&self) -> &str {
            &self.language
        }
    }

    fn row(language: &str, title: &str) -> Row {
        Row {
            language: language.to_string(),
            title: title.to_string(),
        }
    }

    // ==================== Scenario Tests ====================

    #[test]
    fn test_fallback_to_default_language() {
        let rows = vec![row("nl", "Over Ons")];
        let resolved = FallbackResolver::new("fr", "nl")
            .resolve(&rows)
            .expect("should fall back to nl");

        assert_eq!(resolved.value.title, "Over Ons");
        assert_eq!(resolved.used_language, "nl");
        assert_eq!(resolved.requested_language, "fr");
        assert_eq!(resolved.source, ResolutionSource::DefaultLanguage);
        assert!(resolved.is_fallback());
    }

    #[test]
    fn test_exact_match_in_default_language() {
        let rows = vec![row("nl", "Over Ons")];
        let resolved = FallbackResolver::new("nl", "nl").resolve(&rows).unwrap();

        assert_eq!(resolved.value.title, "Over Ons");
        assert_eq!(resolved.used_language, "nl");
        assert_eq!(resolved.source, ResolutionSource::Exact);
        assert!(!resolved.is_fallback());
    }

    #[test]
    fn test_exact_match_preferred_over_default() {
        let rows = vec![row("nl", "Over Ons"), row("fr", "À propos")];
        let resolved = FallbackResolver::new("fr", "nl").resolve(&rows).unwrap();
        assert_eq!(resolved.value.title, "À propos");
        assert_eq!(resolved.used_language, "fr");
    }

    #[test]
    fn test_no_translations_is_not_found() {
        let rows: Vec<Row> = Vec::new();
        assert!(FallbackResolver::new("fr", "nl").resolve(&rows).is_none());
        assert!(FallbackResolver::new("nl", "nl").resolve(&rows).is_none());
    }

    #[test]
    fn test_other_languages_never_used() {
        let rows = vec![row("en", "About us")];
        assert!(FallbackResolver::new("fr", "nl").resolve(&rows).is_none());
    }

    #[test]
    fn test_resolve_map() {
        let mut values = BTreeMap::new();
        values.insert("nl".to_string(), "Welkom".to_string());
        values.insert("fr".to_string(), "Bienvenue".to_string());

        let resolver = FallbackResolver::new("en", "nl");
        let resolved = resolver.resolve_map(&values).unwrap();
        assert_eq!(resolved.value, "Welkom");
        assert_eq!(resolved.used_language, "nl");
    }

    #[test]
    fn test_resolve_map_skips_blank_values() {
        let mut values = BTreeMap::new();
        values.insert("fr".to_string(), String::new());
        values.insert("nl".to_string(), "Welkom".to_string());

        let resolved = FallbackResolver::new("fr", "nl").resolve_map(&values).unwrap();
        assert_eq!(resolved.value, "Welkom");
        assert_eq!(resolved.source, ResolutionSource::DefaultLanguage);

        let mut blank = BTreeMap::new();
        blank.insert("nl".to_string(), String::new());
        assert!(FallbackResolver::new("nl", "nl").resolve_map(&blank).is_none());
    }

    #[test]
    fn test_resolve_string_raw_key() {
        let values = BTreeMap::new();
        let resolved = FallbackResolver::new("fr", "nl").resolve_string("nav.projects", &values);

        assert_eq!(resolved.value, "nav.projects");
        assert_eq!(resolved.source, ResolutionSource::RawKey);
        assert!(resolved.used_language.is_none());
    }

    #[test]
    fn test_resolve_string_skips_empty_values() {
        let mut values = BTreeMap::new();
        values.insert("fr".to_string(), String::new());
        values.insert("nl".to_string(), "Projecten".to_string());

        let resolved = FallbackResolver::new("fr", "nl").resolve_string("nav.projects", &values);
        assert_eq!(resolved.value, "Projecten");
        assert_eq!(resolved.used_language.as_deref(), Some("nl"));
        assert_eq!(resolved.source, ResolutionSource::DefaultLanguage);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let rows = vec![row("nl", "Over Ons")];
        let resolved = FallbackResolver::new("fr", "nl")
            .resolve(&rows)
            .unwrap()
            .map(|r| r.title.len());

        assert_eq!(resolved.value, 8);
        assert_eq!(resolved.used_language, "nl");
        assert!(resolved.is_fallback());
    }

    // ==================== Property Tests ====================

    fn code_strategy() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["nl", "fr", "en", "de", "es"]).prop_map(str::to_string)
    }

    fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
        prop::collection::btree_map(code_strategy(), "[a-zA-Z ]{1,12}", 0..5).prop_map(|map| {
            map.into_iter()
                .map(|(language, title)| Row { language, title })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_exact_translation_wins(rows in rows_strategy(), requested in code_strategy(), default in code_strategy()) {
            let resolver = FallbackResolver::new(&requested, &default);
            if let Some(expected) = rows.iter().find(|r| r.language == requested) {
                let resolved = resolver.resolve(&rows).expect("exact row exists");
                prop_assert_eq!(resolved.value, expected);
                prop_assert_eq!(&resolved.used_language, &requested);
                prop_assert_eq!(resolved.source, ResolutionSource::Exact);
            }
        }

        #[test]
        fn prop_default_used_when_requested_missing(rows in rows_strategy(), requested in code_strategy(), default in code_strategy()) {
            let has_requested = rows.iter().any(|r| r.language == requested);
            let default_row = rows.iter().find(|r| r.language == default);
            let resolver = FallbackResolver::new(&requested, &default);

            if !has_requested {
                match default_row {
                    Some(expected) => {
                        let resolved = resolver.resolve(&rows).expect("default row exists");
                        prop_assert_eq!(resolved.value, expected);
                        prop_assert_eq!(&resolved.used_language, &default);
                    }
                    None => prop_assert!(resolver.resolve(&rows).is_none()),
                }
            }
        }

        #[test]
        fn prop_empty_is_not_found(requested in code_strategy(), default in code_strategy()) {
            let rows: Vec<Row> = Vec::new();
            prop_assert!(FallbackResolver::new(&requested, &default).resolve(&rows).is_none());
        }

        #[test]
        fn prop_resolution_is_idempotent(rows in rows_strategy(), requested in code_strategy(), default in code_strategy()) {
            let resolver = FallbackResolver::new(&requested, &default);
            prop_assert_eq!(resolver.resolve(&rows), resolver.resolve(&rows));
        }
    }
}
