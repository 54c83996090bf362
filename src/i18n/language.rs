//! Language records as stored in the database.
//!
//! Languages are data, not code: editors add and retire locales at runtime,
//! so a `Language` is a plain record validated on write rather than a
//! compile-time constant.

use crate::validation::{normalize_language_code, require_text, ValidationError};
use serde::{Deserialize, Serialize};

/// A locale the site can be served in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Lowercase language tag, unique (e.g. "nl", "fr", "pt-br")
    pub code: String,

    /// English name (e.g. "Dutch")
    pub name: String,

    /// Name in the language itself (e.g. "Nederlands")
    pub native_name: Option<String>,

    /// Whether this is the fallback language. Exactly one language is default.
    pub is_default: bool,

    /// Inactive languages are hidden from visitors but keep their translations
    pub is_active: bool,

    /// Position in language switchers
    pub sort_order: i32,
}

impl Language {
    /// Primary subtag of the code ("pt" for "pt-br").
    pub fn primary_subtag(&self) -> &str {
        primary_subtag(&self.code)
    }

    /// Name to show in a language switcher.
    pub fn display_name(&self) -> &str {
        self.native_name.as_deref().unwrap_or(&self.name)
    }
}

/// Primary subtag of any language tag ("fr" for "fr-be").
pub fn primary_subtag(code: &str) -> &str {
    code.split('-').next().unwrap_or(code)
}

fn default_true() -> bool {
    true
}

/// Payload for creating a language.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewLanguage {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub native_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
}

impl NewLanguage {
    /// Validate and normalize the payload in place.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.code = normalize_language_code(&self.code)?;
        require_text("name", &self.name)?;
        self.name = self.name.trim().to_string();
        self.native_name = self
            .native_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Ok(self)
    }
}

/// Partial update for a language. The code itself is immutable.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LanguageUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub native_name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

impl LanguageUpdate {
    /// Apply this update to an existing record.
    pub fn apply_to(&self, language: &mut Language) {
        if let Some(name) = &self.name {
            language.name = name.trim().to_string();
        }
        if let Some(native_name) = &self.native_name {
            let trimmed = native_name.trim();
            language.native_name = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        if let Some(is_active) = self.is_active {
            language.is_active = is_active;
        }
        if let Some(sort_order) = self.sort_order {
            language.sort_order = sort_order;
        }
    }
}
