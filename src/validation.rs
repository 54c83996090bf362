//! Input validation shared by the admin API and the storage layer.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// A rejected piece of user input. Surfaces as HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

static SLUG_REGEX: OnceLock<Regex> = OnceLock::new();
static LANGUAGE_CODE_REGEX: OnceLock<Regex> = OnceLock::new();
static STRING_KEY_REGEX: OnceLock<Regex> = OnceLock::new();
static SETTING_KEY_REGEX: OnceLock<Regex> = OnceLock::new();

/// Maximum slug length accepted for pages and projects.
pub const MAX_SLUG_LEN: usize = 120;

/// Validate a URL slug: lowercase ASCII words separated by single hyphens.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let regex = SLUG_REGEX.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

    if slug.is_empty() {
        return Err(ValidationError::new("slug is required"));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(ValidationError::new(format!(
            "slug must be at most {} characters",
            MAX_SLUG_LEN
        )));
    }
    if !regex.is_match(slug) {
        return Err(ValidationError::new(format!(
            "invalid slug '{}': use lowercase letters, digits and single hyphens",
            slug
        )));
    }
    Ok(())
}

/// Normalize and validate a language code (`NL` -> `nl`, `pt_BR` -> `pt-br`).
pub fn normalize_language_code(code: &str) -> Result<String, ValidationError> {
    let regex = LANGUAGE_CODE_REGEX
        .get_or_init(|| Regex::new(r"^[a-z]{2,3}(?:-[a-z0-9]{2,8})?$").unwrap());

    let normalized = code.trim().to_ascii_lowercase().replace('_', "-");
    if !regex.is_match(&normalized) {
        return Err(ValidationError::new(format!(
            "invalid language code '{}'",
            code
        )));
    }
    Ok(normalized)
}

/// Validate a UI string key such as `nav.projects` or `footer.contact_us`.
pub fn validate_string_key(key: &str) -> Result<(), ValidationError> {
    let regex = STRING_KEY_REGEX
        .get_or_init(|| Regex::new(r"^[a-z0-9_]+(?:[.\-][a-z0-9_]+)*$").unwrap());

    if !regex.is_match(key) {
        return Err(ValidationError::new(format!(
            "invalid translation key '{}': use dotted lowercase segments",
            key
        )));
    }
    Ok(())
}

/// Validate a settings key (`site.title`, `contact.email`).
pub fn validate_setting_key(key: &str) -> Result<(), ValidationError> {
    let regex = SETTING_KEY_REGEX
        .get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*(?:\.[a-z0-9_]+)*$").unwrap());

    if !regex.is_match(key) {
        return Err(ValidationError::new(format!("invalid setting key '{}'", key)));
    }
    Ok(())
}

/// Reject blank required text fields.
pub fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(format!("{} is required", field)));
    }
    Ok(())
}
