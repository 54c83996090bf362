use anyhow::{bail, Context, Result};

use crate::i18n::NewLanguage;

#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_url: Option<String>,

    // Server
    pub port: u16,

    // Admin API keys
    pub admin_api_key: String,
    pub editor_api_key: Option<String>,

    // Languages created on first start
    pub seed_languages: Vec<NewLanguage>,

    // Social sync
    pub social_feed_url: Option<String>,
    pub social_access_token: Option<String>,
    pub social_sync_schedule: String,
    pub social_sync_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let seed_languages = parse_seed_languages(
            &std::env::var("SEED_LANGUAGES")
                .unwrap_or_else(|_| "nl:Nederlands,fr:Français,en:English".to_string()),
        )
        .context("SEED_LANGUAGES is invalid")?;

        Ok(Self {
            // Storage - in-memory store when unset
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            // Server
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            // Admin API keys
            admin_api_key: std::env::var("ADMIN_API_KEY").context("ADMIN_API_KEY not set")?,
            editor_api_key: std::env::var("EDITOR_API_KEY")
                .ok()
                .filter(|v| !v.is_empty()),

            seed_languages,

            // Social sync
            social_feed_url: std::env::var("SOCIAL_FEED_URL").ok().filter(|v| !v.is_empty()),
            social_access_token: std::env::var("SOCIAL_ACCESS_TOKEN")
                .ok()
                .filter(|v| !v.is_empty()),
            social_sync_schedule: std::env::var("SOCIAL_SYNC_SCHEDULE")
                .unwrap_or_else(|_| "0 0 */6 * * *".to_string()),
            social_sync_limit: std::env::var("SOCIAL_SYNC_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(25),
        })
    }

    /// Social sync runs only with both a feed URL and a token.
    pub fn social_sync_enabled(&self) -> bool {
        self.social_feed_url.is_some() && self.social_access_token.is_some()
    }
}

/// Parse `code:Name,code:Name`. The first entry becomes the default language.
pub fn parse_seed_languages(value: &str) -> Result<Vec<NewLanguage>> {
    let mut languages = Vec::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((code, name)) = entry.split_once(':') else {
            bail!("Invalid language entry '{}'. Expected code:Name", entry);
        };
        let language = NewLanguage {
            code: code.to_string(),
            name: name.to_string(),
            native_name: Some(name.to_string()),
            is_active: true,
            sort_order: languages.len() as i32,
        }
        .validated()?;
        languages.push(language);
    }

    if languages.is_empty() {
        bail!("At least one language is required");
    }
    Ok(languages)
}
