//! Language registry: a validated snapshot of the configured languages.
//!
//! The registry is built per request from the languages table and answers
//! "which language is default", "is this code servable" and "which language
//! should this visitor get".

use crate::i18n::language::primary_subtag;
use crate::i18n::Language;
use crate::validation::ValidationError;

/// Immutable view over all languages, with exactly one default.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: Vec<Language>,
    default_index: usize,
}

impl LanguageRegistry {
    /// Build a registry from stored languages.
    ///
    /// # Errors
    /// Fails unless exactly one language is marked default and that language
    /// is active.
    pub fn new(mut languages: Vec<Language>) -> Result<Self, ValidationError> {
        languages.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.code.cmp(&b.code))
        });

        let defaults: Vec<usize> = languages
            .iter()
            .enumerate()
            .filter(|(_, lang)| lang.is_default)
            .map(|(index, _)| index)
            .collect();

        let default_index = match defaults.as_slice() {
            [] => return Err(ValidationError::new("no default language configured")),
            [index] => *index,
            _ => {
                return Err(ValidationError::new(
                    "multiple default languages configured",
                ))
            }
        };

        if !languages[default_index].is_active {
            return Err(ValidationError::new(format!(
                "default language '{}' is inactive",
                languages[default_index].code
            )));
        }

        Ok(Self {
            languages,
            default_index,
        })
    }

    /// Get a language by code, active or not.
    pub fn get(&self, code: &str) -> Option<&Language> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// The fallback language.
    pub fn default_language(&self) -> &Language {
        &self.languages[self.default_index]
    }

    /// Code of the fallback language.
    pub fn default_code(&self) -> &str {
        &self.default_language().code
    }

    /// Active languages in switcher order.
    pub fn active(&self) -> Vec<&Language> {
        self.languages.iter().filter(|lang| lang.is_active).collect()
    }

    /// All languages in switcher order.
    pub fn all(&self) -> &[Language] {
        &self.languages
    }

    /// Check whether a code names an active language.
    pub fn is_active(&self, code: &str) -> bool {
        self.get(code).map(|lang| lang.is_active).unwrap_or(false)
    }

    /// Pick the language to serve a visitor.
    ///
    /// Order: an explicit `requested` code naming an active language, then the
    /// first active match from an `Accept-Language` header, then the default.
    pub fn negotiate(&self, requested: Option<&str>, accept_language: Option<&str>) -> &Language {
        if let Some(code) = requested {
            let code = code.trim().to_ascii_lowercase();
            if let Some(lang) = self.get(&code).filter(|lang| lang.is_active) {
                return lang;
            }
        }

        if let Some(header) = accept_language {
            for tag in parse_accept_language(header) {
                if let Some(lang) = self.match_tag(&tag) {
                    return lang;
                }
            }
        }

        self.default_language()
    }

    /// Match a single language tag, exact first, then by primary subtag.
    fn match_tag(&self, tag: &str) -> Option<&Language> {
        let active = || self.languages.iter().filter(|lang| lang.is_active);

        active().find(|lang| lang.code == tag).or_else(|| {
            let primary = primary_subtag(tag);
            active().find(|lang| lang.primary_subtag() == primary)
        })
    }
}

/// Parse an `Accept-Language` header into lowercase tags ordered by quality.
///
/// Entries with `q=0` and the `*` wildcard are dropped. Ties keep header order.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut weighted: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.trim().split(';');
            let tag = pieces.next()?.trim().to_ascii_lowercase().replace('_', "-");
            if tag.is_empty() || tag == "*" {
                return None;
            }

            let quality = pieces
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);

            (quality > 0.0).then_some((tag, quality))
        })
        .collect();

    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    weighted.into_iter().map(|(tag, _)| tag).collect()
}
