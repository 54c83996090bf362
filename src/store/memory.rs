//! In-process store for tests and database-less development.
//!
//! Mirrors the constraints of the PostgreSQL schema: unique slugs and
//! codes, a single default language, translations that must point at an
//! existing language and that disappear with it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{ContentStore, StoreError};
use crate::i18n::{Language, Localized, UiString};
use crate::models::{
    ContentPage, NewPage, NewProject, PageTranslation, PageUpdate, PageView, Project,
    ProjectTranslation, ProjectUpdate, Setting, SocialPost,
};

#[derive(Default)]
struct State {
    languages: BTreeMap<String, Language>,
    strings: BTreeMap<String, UiString>,
    pages: BTreeMap<i64, ContentPage>,
    projects: BTreeMap<i64, Project>,
    settings: BTreeMap<String, Setting>,
    page_views: Vec<PageView>,
    social_posts: BTreeMap<(String, String), SocialPost>,
    next_page_id: i64,
    next_project_id: i64,
}

impl State {
    fn require_language(&self, code: &str) -> Result<(), StoreError> {
        if self.languages.contains_key(code) {
            Ok(())
        } else {
            Err(StoreError::invalid(format!("unknown language '{}'", code)))
        }
    }

    fn require_languages<T: Localized>(&self, rows: &[T]) -> Result<(), StoreError> {
        rows.iter()
            .try_for_each(|row| self.require_language(row.language_code()))
    }

    fn page_slug_taken(&self, slug: &str, except: Option<i64>) -> bool {
        self.pages
            .values()
            .any(|page| page.slug == slug && Some(page.id) != except)
    }

    fn project_slug_taken(&self, slug: &str, except: Option<i64>) -> bool {
        self.projects
            .values()
            .any(|project| project.slug == slug && Some(project.id) != except)
    }
}

fn upsert_translation<T: Localized>(rows: &mut Vec<T>, translation: T) {
    rows.retain(|row| row.language_code() != translation.language_code());
    rows.push(translation);
    rows.sort_by(|a, b| a.language_code().cmp(b.language_code()));
}

fn remove_translation<T: Localized>(rows: &mut Vec<T>, language_code: &str) -> bool {
    let before = rows.len();
    rows.retain(|row| row.language_code() != language_code);
    rows.len() != before
}

pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                next_page_id: 1,
                next_project_id: 1,
                ..State::default()
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list_languages(&self) -> Result<Vec<Language>, StoreError> {
        let state = self.state.read().await;
        let mut languages: Vec<Language> = state.languages.values().cloned().collect();
        languages.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.code.cmp(&b.code)));
        Ok(languages)
    }

    async fn create_language(&self, language: Language) -> Result<Language, StoreError> {
        let mut state = self.state.write().await;
        if state.languages.contains_key(&language.code) {
            return Err(StoreError::Conflict(format!(
                "language '{}' already exists",
                language.code
            )));
        }
        if language.is_default && state.languages.values().any(|l| l.is_default) {
            return Err(StoreError::Conflict(
                "a default language already exists".to_string(),
            ));
        }
        state.languages.insert(language.code.clone(), language.clone());
        Ok(language)
    }

    async fn update_language(&self, language: Language) -> Result<Language, StoreError> {
        let mut state = self.state.write().await;
        let stored = state
            .languages
            .get_mut(&language.code)
            .ok_or_else(|| StoreError::not_found(format!("language '{}'", language.code)))?;

        stored.name = language.name;
        stored.native_name = language.native_name;
        stored.is_active = language.is_active;
        stored.sort_order = language.sort_order;
        Ok(stored.clone())
    }

    async fn set_default_language(&self, code: &str) -> Result<Language, StoreError> {
        let mut state = self.state.write().await;
        if !state.languages.contains_key(code) {
            return Err(StoreError::not_found(format!("language '{}'", code)));
        }
        for language in state.languages.values_mut() {
            language.is_default = language.code == code;
        }
        Ok(state.languages[code].clone())
    }

    async fn delete_language(&self, code: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.languages.remove(code).is_none() {
            return Err(StoreError::not_found(format!("language '{}'", code)));
        }
        for page in state.pages.values_mut() {
            remove_translation(&mut page.translations, code);
        }
        for project in state.projects.values_mut() {
            remove_translation(&mut project.translations, code);
        }
        for string in state.strings.values_mut() {
            string.values.remove(code);
        }
        Ok(())
    }

    async fn list_strings(&self) -> Result<Vec<UiString>, StoreError> {
        Ok(self.state.read().await.strings.values().cloned().collect())
    }

    async fn create_string(&self, string: UiString) -> Result<UiString, StoreError> {
        let mut state = self.state.write().await;
        if state.strings.contains_key(&string.key) {
            return Err(StoreError::Conflict(format!(
                "translation key '{}' already exists",
                string.key
            )));
        }
        for code in string.values.keys() {
            state.require_language(code)?;
        }
        state.strings.insert(string.key.clone(), string.clone());
        Ok(string)
    }

    async fn upsert_string(&self, string: UiString) -> Result<UiString, StoreError> {
        let mut state = self.state.write().await;
        for code in string.values.keys() {
            state.require_language(code)?;
        }
        let entry = state
            .strings
            .entry(string.key.clone())
            .or_insert_with(|| UiString {
                key: string.key.clone(),
                description: None,
                values: BTreeMap::new(),
            });
        if string.description.is_some() {
            entry.description = string.description;
        }
        entry.values.extend(string.values);
        Ok(entry.clone())
    }

    async fn set_string_value(
        &self,
        key: &str,
        language_code: &str,
        value: &str,
    ) -> Result<UiString, StoreError> {
        let mut state = self.state.write().await;
        state.require_language(language_code)?;
        let string = state
            .strings
            .get_mut(key)
            .ok_or_else(|| StoreError::not_found(format!("translation key '{}'", key)))?;
        string
            .values
            .insert(language_code.to_string(), value.to_string());
        Ok(string.clone())
    }

    async fn delete_string(&self, key: &str) -> Result<(), StoreError> {
        match self.state.write().await.strings.remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found(format!("translation key '{}'", key))),
        }
    }

    async fn list_pages(&self) -> Result<Vec<ContentPage>, StoreError> {
        Ok(self.state.read().await.pages.values().cloned().collect())
    }

    async fn get_page(&self, id: i64) -> Result<Option<ContentPage>, StoreError> {
        Ok(self.state.read().await.pages.get(&id).cloned())
    }

    async fn get_page_by_slug(&self, slug: &str) -> Result<Option<ContentPage>, StoreError> {
        let state = self.state.read().await;
        Ok(state.pages.values().find(|page| page.slug == slug).cloned())
    }

    async fn create_page(&self, page: NewPage) -> Result<ContentPage, StoreError> {
        let mut state = self.state.write().await;
        if state.page_slug_taken(&page.slug, None) {
            return Err(StoreError::Conflict(format!(
                "page slug '{}' already exists",
                page.slug
            )));
        }
        state.require_languages(&page.translations)?;

        let id = state.next_page_id;
        state.next_page_id += 1;

        let now = Utc::now();
        let mut translations = page.translations;
        translations.sort_by(|a, b| a.language_code.cmp(&b.language_code));
        let stored = ContentPage {
            id,
            slug: page.slug,
            published: page.published,
            components: page.components,
            translations,
            created_at: now,
            updated_at: now,
        };
        state.pages.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_page(&self, id: i64, update: PageUpdate) -> Result<ContentPage, StoreError> {
        let mut state = self.state.write().await;
        if let Some(slug) = &update.slug {
            if state.page_slug_taken(slug, Some(id)) {
                return Err(StoreError::Conflict(format!(
                    "page slug '{}' already exists",
                    slug
                )));
            }
        }

        let page = state
            .pages
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(format!("page {}", id)))?;
        if let Some(slug) = update.slug {
            page.slug = slug;
        }
        if let Some(published) = update.published {
            page.published = published;
        }
        if let Some(components) = update.components {
            page.components = components;
        }
        page.updated_at = Utc::now();
        Ok(page.clone())
    }

    async fn delete_page(&self, id: i64) -> Result<(), StoreError> {
        match self.state.write().await.pages.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found(format!("page {}", id))),
        }
    }

    async fn put_page_translation(
        &self,
        id: i64,
        translation: PageTranslation,
    ) -> Result<ContentPage, StoreError> {
        let mut state = self.state.write().await;
        state.require_language(&translation.language_code)?;
        let page = state
            .pages
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(format!("page {}", id)))?;
        upsert_translation(&mut page.translations, translation);
        page.updated_at = Utc::now();
        Ok(page.clone())
    }

    async fn delete_page_translation(
        &self,
        id: i64,
        language_code: &str,
    ) -> Result<ContentPage, StoreError> {
        let mut state = self.state.write().await;
        let page = state
            .pages
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(format!("page {}", id)))?;
        if !remove_translation(&mut page.translations, language_code) {
            return Err(StoreError::not_found(format!(
                "'{}' translation of page {}",
                language_code, id
            )));
        }
        page.updated_at = Utc::now();
        Ok(page.clone())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let state = self.state.read().await;
        let mut projects: Vec<Project> = state.projects.values().cloned().collect();
        projects.sort_by_key(|project| (project.sort_order, project.id));
        Ok(projects)
    }

    async fn get_project(&self, id: i64) -> Result<Option<Project>, StoreError> {
        Ok(self.state.read().await.projects.get(&id).cloned())
    }

    async fn get_project_by_slug(&self, slug: &str) -> Result<Option<Project>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .values()
            .find(|project| project.slug == slug)
            .cloned())
    }

    async fn create_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let mut state = self.state.write().await;
        if state.project_slug_taken(&project.slug, None) {
            return Err(StoreError::Conflict(format!(
                "project slug '{}' already exists",
                project.slug
            )));
        }
        state.require_languages(&project.translations)?;

        let id = state.next_project_id;
        state.next_project_id += 1;

        let now = Utc::now();
        let mut translations = project.translations;
        translations.sort_by(|a, b| a.language_code.cmp(&b.language_code));
        let stored = Project {
            id,
            slug: project.slug,
            category: project.category,
            year: project.year,
            featured: project.featured,
            published: project.published,
            sort_order: project.sort_order,
            images: project.images,
            translations,
            created_at: now,
            updated_at: now,
        };
        state.projects.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_project(&self, id: i64, update: ProjectUpdate) -> Result<Project, StoreError> {
        let mut state = self.state.write().await;
        if let Some(slug) = &update.slug {
            if state.project_slug_taken(slug, Some(id)) {
                return Err(StoreError::Conflict(format!(
                    "project slug '{}' already exists",
                    slug
                )));
            }
        }

        let project = state
            .projects
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(format!("project {}", id)))?;
        if let Some(slug) = update.slug {
            project.slug = slug;
        }
        if let Some(category) = update.category {
            project.category = Some(category).filter(|c| !c.is_empty());
        }
        if let Some(year) = update.year {
            project.year = Some(year);
        }
        if let Some(featured) = update.featured {
            project.featured = featured;
        }
        if let Some(published) = update.published {
            project.published = published;
        }
        if let Some(sort_order) = update.sort_order {
            project.sort_order = sort_order;
        }
        if let Some(images) = update.images {
            project.images = images;
        }
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    async fn delete_project(&self, id: i64) -> Result<(), StoreError> {
        match self.state.write().await.projects.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found(format!("project {}", id))),
        }
    }

    async fn put_project_translation(
        &self,
        id: i64,
        translation: ProjectTranslation,
    ) -> Result<Project, StoreError> {
        let mut state = self.state.write().await;
        state.require_language(&translation.language_code)?;
        let project = state
            .projects
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(format!("project {}", id)))?;
        upsert_translation(&mut project.translations, translation);
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    async fn delete_project_translation(
        &self,
        id: i64,
        language_code: &str,
    ) -> Result<Project, StoreError> {
        let mut state = self.state.write().await;
        let project = state
            .projects
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(format!("project {}", id)))?;
        if !remove_translation(&mut project.translations, language_code) {
            return Err(StoreError::not_found(format!(
                "'{}' translation of project {}",
                language_code, id
            )));
        }
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    async fn list_settings(&self) -> Result<Vec<Setting>, StoreError> {
        Ok(self.state.read().await.settings.values().cloned().collect())
    }

    async fn put_setting(&self, key: &str, value: serde_json::Value) -> Result<Setting, StoreError> {
        let setting = Setting {
            key: key.to_string(),
            value,
            updated_at: Utc::now(),
        };
        self.state
            .write()
            .await
            .settings
            .insert(key.to_string(), setting.clone());
        Ok(setting)
    }

    async fn delete_setting(&self, key: &str) -> Result<(), StoreError> {
        match self.state.write().await.settings.remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found(format!("setting '{}'", key))),
        }
    }

    async fn record_page_view(&self, view: PageView) -> Result<(), StoreError> {
        self.state.write().await.page_views.push(view);
        Ok(())
    }

    async fn page_views_since(&self, since: DateTime<Utc>) -> Result<Vec<PageView>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .page_views
            .iter()
            .filter(|view| view.viewed_at >= since)
            .cloned()
            .collect())
    }

    async fn upsert_social_posts(&self, posts: &[SocialPost]) -> Result<usize, StoreError> {
        let mut state = self.state.write().await;
        for post in posts {
            state.social_posts.insert(
                (post.platform.clone(), post.external_id.clone()),
                post.clone(),
            );
        }
        Ok(posts.len())
    }

    async fn list_social_posts(&self, limit: usize) -> Result<Vec<SocialPost>, StoreError> {
        let state = self.state.read().await;
        let mut posts: Vec<SocialPost> = state.social_posts.values().cloned().collect();
        posts.sort_by(|a, b| {
            b.posted_at
                .cmp(&a.posted_at)
                .then_with(|| b.synced_at.cmp(&a.synced_at))
        });
        posts.truncate(limit);
        Ok(posts)
    }
}
