//! Translation completeness checks.
//!
//! A translatable entity is publishable only when the default language is
//! covered. Missing active languages are reported as warnings: visitors in
//! those languages will see the default-language fallback.

use crate::i18n::{LanguageRegistry, Localized};
use serde::Serialize;

/// Validation report containing errors and warnings about an entity's translations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Problems that block publishing
    pub errors: Vec<String>,

    /// Gaps that degrade to a fallback
    pub warnings: Vec<String>,

    /// Active languages with no translation
    pub missing_languages: Vec<String>,
}

impl ValidationReport {
    /// Create a new empty validation report
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            missing_languages: Vec::new(),
        }
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if the report has any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the report is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }

    /// An entity with no errors may be published.
    pub fn is_publishable(&self) -> bool {
        !self.has_errors()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for translation coverage.
pub struct TranslationValidator;

impl TranslationValidator {
    /// Check an entity's translation rows against the registry.
    ///
    /// # Arguments
    /// * `label` - Human-readable entity name for messages (e.g. "page 'about'")
    /// * `rows` - The entity's translation rows
    /// * `registry` - Current languages
    pub fn validate<T: Localized>(
        label: &str,
        rows: &[T],
        registry: &LanguageRegistry,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();
        let has = |code: &str| rows.iter().any(|row| row.language_code() == code);

        let default_code = registry.default_code();
        if !has(default_code) {
            report.errors.push(format!(
                "{} has no translation in the default language '{}'",
                label, default_code
            ));
        }

        for language in registry.active() {
            if language.code != default_code && !has(&language.code) {
                report.missing_languages.push(language.code.clone());
                report.warnings.push(format!(
                    "{} is not translated to {} ({}); visitors will see '{}'",
                    label, language.name, language.code, default_code
                ));
            }
        }

        for row in rows {
            if registry.get(row.language_code()).is_none() {
                report.warnings.push(format!(
                    "{} has a translation for unknown language '{}'",
                    label,
                    row.language_code()
                ));
            }
        }

        report
    }

    /// Shorthand for the publish gate.
    pub fn has_default_translation<T: Localized>(rows: &[T], registry: &LanguageRegistry) -> bool {
        rows.iter()
            .any(|row| row.language_code() == registry.default_code())
    }
}
