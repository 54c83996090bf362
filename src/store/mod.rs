//! Storage backends.
//!
//! `ContentStore` is plain persistence: it enforces uniqueness and keeps
//! translations attached to their entity, while the editorial rules
//! (publishing, default language) live in [`crate::editorial`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::i18n::{Language, UiString};
use crate::models::{
    ContentPage, NewPage, NewProject, PageTranslation, PageUpdate, PageView, Project,
    ProjectTranslation, ProjectUpdate, Setting, SocialPost,
};
use crate::validation::ValidationError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// Stored data breaks an invariant the write path should have upheld.
    #[error("Inconsistent data: {0}")]
    Inconsistent(String),

    #[error("Storage error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        StoreError::NotFound(what.to_string())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        StoreError::Invalid(ValidationError::new(message))
    }
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    // Languages
    async fn list_languages(&self) -> Result<Vec<Language>, StoreError>;
    async fn create_language(&self, language: Language) -> Result<Language, StoreError>;
    async fn update_language(&self, language: Language) -> Result<Language, StoreError>;
    /// Move the default flag to `code` in one step.
    async fn set_default_language(&self, code: &str) -> Result<Language, StoreError>;
    /// Delete a language together with every translation in it.
    async fn delete_language(&self, code: &str) -> Result<(), StoreError>;

    // UI strings
    async fn list_strings(&self) -> Result<Vec<UiString>, StoreError>;
    async fn create_string(&self, string: UiString) -> Result<UiString, StoreError>;
    /// Insert the key or merge `values` into the existing one.
    async fn upsert_string(&self, string: UiString) -> Result<UiString, StoreError>;
    async fn set_string_value(
        &self,
        key: &str,
        language_code: &str,
        value: &str,
    ) -> Result<UiString, StoreError>;
    async fn delete_string(&self, key: &str) -> Result<(), StoreError>;

    // Pages
    async fn list_pages(&self) -> Result<Vec<ContentPage>, StoreError>;
    async fn get_page(&self, id: i64) -> Result<Option<ContentPage>, StoreError>;
    async fn get_page_by_slug(&self, slug: &str) -> Result<Option<ContentPage>, StoreError>;
    async fn create_page(&self, page: NewPage) -> Result<ContentPage, StoreError>;
    async fn update_page(&self, id: i64, update: PageUpdate) -> Result<ContentPage, StoreError>;
    async fn delete_page(&self, id: i64) -> Result<(), StoreError>;
    async fn put_page_translation(
        &self,
        id: i64,
        translation: PageTranslation,
    ) -> Result<ContentPage, StoreError>;
    async fn delete_page_translation(
        &self,
        id: i64,
        language_code: &str,
    ) -> Result<ContentPage, StoreError>;

    // Projects
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;
    async fn get_project(&self, id: i64) -> Result<Option<Project>, StoreError>;
    async fn get_project_by_slug(&self, slug: &str) -> Result<Option<Project>, StoreError>;
    async fn create_project(&self, project: NewProject) -> Result<Project, StoreError>;
    async fn update_project(&self, id: i64, update: ProjectUpdate) -> Result<Project, StoreError>;
    async fn delete_project(&self, id: i64) -> Result<(), StoreError>;
    async fn put_project_translation(
        &self,
        id: i64,
        translation: ProjectTranslation,
    ) -> Result<Project, StoreError>;
    async fn delete_project_translation(
        &self,
        id: i64,
        language_code: &str,
    ) -> Result<Project, StoreError>;

    // Settings
    async fn list_settings(&self) -> Result<Vec<Setting>, StoreError>;
    async fn put_setting(&self, key: &str, value: serde_json::Value) -> Result<Setting, StoreError>;
    async fn delete_setting(&self, key: &str) -> Result<(), StoreError>;

    // Analytics
    async fn record_page_view(&self, view: PageView) -> Result<(), StoreError>;
    async fn page_views_since(&self, since: DateTime<Utc>) -> Result<Vec<PageView>, StoreError>;

    // Social
    /// Insert or refresh posts by `(platform, external_id)`. Returns how many
    /// were written.
    async fn upsert_social_posts(&self, posts: &[SocialPost]) -> Result<usize, StoreError>;
    /// Newest first.
    async fn list_social_posts(&self, limit: usize) -> Result<Vec<SocialPost>, StoreError>;
}
