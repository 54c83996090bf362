use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

use super::{ContentStore, StoreError};
use crate::i18n::{Language, UiString};
use crate::models::{
    ContentPage, NewPage, NewProject, PageTranslation, PageUpdate, PageView, Project,
    ProjectImage, ProjectTranslation, ProjectUpdate, Setting, SocialPost, TranslationValue,
};
use crate::pagebuilder::ComponentDescriptor;

/// Tables are created on startup if missing. Translations cascade with both
/// their entity and their language; the partial unique index allows at most
/// one default language.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS languages (
        code TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        native_name TEXT,
        is_default BOOLEAN NOT NULL DEFAULT FALSE,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        sort_order INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS languages_single_default
        ON languages (is_default) WHERE is_default",
    "CREATE TABLE IF NOT EXISTS ui_strings (
        key TEXT PRIMARY KEY,
        description TEXT
    )",
    "CREATE TABLE IF NOT EXISTS ui_string_values (
        key TEXT NOT NULL REFERENCES ui_strings (key) ON DELETE CASCADE,
        language_code TEXT NOT NULL REFERENCES languages (code) ON DELETE CASCADE,
        value TEXT NOT NULL,
        PRIMARY KEY (key, language_code)
    )",
    "CREATE TABLE IF NOT EXISTS pages (
        id BIGSERIAL PRIMARY KEY,
        slug TEXT NOT NULL UNIQUE,
        published BOOLEAN NOT NULL DEFAULT FALSE,
        components JSONB NOT NULL DEFAULT '[]',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE TABLE IF NOT EXISTS page_translations (
        page_id BIGINT NOT NULL REFERENCES pages (id) ON DELETE CASCADE,
        language_code TEXT NOT NULL REFERENCES languages (code) ON DELETE CASCADE,
        title TEXT NOT NULL,
        body JSONB NOT NULL,
        meta_description TEXT,
        PRIMARY KEY (page_id, language_code)
    )",
    "CREATE TABLE IF NOT EXISTS projects (
        id BIGSERIAL PRIMARY KEY,
        slug TEXT NOT NULL UNIQUE,
        category TEXT,
        year INTEGER,
        featured BOOLEAN NOT NULL DEFAULT FALSE,
        published BOOLEAN NOT NULL DEFAULT FALSE,
        sort_order INTEGER NOT NULL DEFAULT 0,
        images JSONB NOT NULL DEFAULT '[]',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE TABLE IF NOT EXISTS project_translations (
        project_id BIGINT NOT NULL REFERENCES projects (id) ON DELETE CASCADE,
        language_code TEXT NOT NULL REFERENCES languages (code) ON DELETE CASCADE,
        title TEXT NOT NULL,
        summary TEXT,
        description JSONB NOT NULL,
        PRIMARY KEY (project_id, language_code)
    )",
    "CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value JSONB NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE TABLE IF NOT EXISTS page_views (
        id BIGSERIAL PRIMARY KEY,
        path TEXT NOT NULL,
        language_code TEXT,
        referrer TEXT,
        viewed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE INDEX IF NOT EXISTS page_views_viewed_at ON page_views (viewed_at)",
    "CREATE TABLE IF NOT EXISTS social_posts (
        platform TEXT NOT NULL,
        external_id TEXT NOT NULL,
        caption TEXT,
        media_url TEXT,
        permalink TEXT,
        posted_at TIMESTAMPTZ,
        synced_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (platform, external_id)
    )",
];

#[derive(sqlx::FromRow)]
struct LanguageRow {
    code: String,
    name: String,
    native_name: Option<String>,
    is_default: bool,
    is_active: bool,
    sort_order: i32,
}

impl From<LanguageRow> for Language {
    fn from(row: LanguageRow) -> Self {
        Language {
            code: row.code,
            name: row.name,
            native_name: row.native_name,
            is_default: row.is_default,
            is_active: row.is_active,
            sort_order: row.sort_order,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StringRow {
    key: String,
    description: Option<String>,
}

#[derive(sqlx::FromRow)]
struct StringValueRow {
    key: String,
    language_code: String,
    value: String,
}

#[derive(sqlx::FromRow)]
struct PageRow {
    id: i64,
    slug: String,
    published: bool,
    components: Json<Vec<ComponentDescriptor>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PageTranslationRow {
    page_id: i64,
    language_code: String,
    title: String,
    body: Json<TranslationValue>,
    meta_description: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: i64,
    slug: String,
    category: Option<String>,
    year: Option<i32>,
    featured: bool,
    published: bool,
    sort_order: i32,
    images: Json<Vec<ProjectImage>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ProjectTranslationRow {
    project_id: i64,
    language_code: String,
    title: String,
    summary: Option<String>,
    description: Json<TranslationValue>,
}

#[derive(sqlx::FromRow)]
struct SettingRow {
    key: String,
    value: serde_json::Value,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PageViewRow {
    path: String,
    language_code: Option<String>,
    referrer: Option<String>,
    viewed_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SocialPostRow {
    external_id: String,
    platform: String,
    caption: Option<String>,
    media_url: Option<String>,
    permalink: Option<String>,
    posted_at: Option<DateTime<Utc>>,
    synced_at: DateTime<Utc>,
}

const LANGUAGE_COLUMNS: &str = "code, name, native_name, is_default, is_active, sort_order";
const PAGE_COLUMNS: &str = "id, slug, published, components, created_at, updated_at";
const PROJECT_COLUMNS: &str =
    "id, slug, category, year, featured, published, sort_order, images, created_at, updated_at";

/// Turn constraint violations into the store's conflict / validation errors.
fn constraint_error(e: sqlx::Error, conflict: impl FnOnce() -> String) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Conflict(conflict());
        }
        if db.is_foreign_key_violation() {
            return StoreError::invalid("translation refers to an unknown language");
        }
    }
    StoreError::Database(e)
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        let store = PgStore { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("✓ Database schema ready");
        Ok(())
    }

    async fn pages_with_translations(&self, rows: Vec<PageRow>) -> Result<Vec<ContentPage>, StoreError> {
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let translations: Vec<PageTranslationRow> = sqlx::query_as(
            "SELECT page_id, language_code, title, body, meta_description
             FROM page_translations WHERE page_id = ANY($1) ORDER BY language_code",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_page: HashMap<i64, Vec<PageTranslation>> = HashMap::new();
        for row in translations {
            by_page.entry(row.page_id).or_default().push(PageTranslation {
                language_code: row.language_code,
                title: row.title,
                body: row.body.0,
                meta_description: row.meta_description,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| ContentPage {
                translations: by_page.remove(&row.id).unwrap_or_default(),
                id: row.id,
                slug: row.slug,
                published: row.published,
                components: row.components.0,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }

    async fn projects_with_translations(&self, rows: Vec<ProjectRow>) -> Result<Vec<Project>, StoreError> {
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let translations: Vec<ProjectTranslationRow> = sqlx::query_as(
            "SELECT project_id, language_code, title, summary, description
             FROM project_translations WHERE project_id = ANY($1) ORDER BY language_code",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_project: HashMap<i64, Vec<ProjectTranslation>> = HashMap::new();
        for row in translations {
            by_project
                .entry(row.project_id)
                .or_default()
                .push(ProjectTranslation {
                    language_code: row.language_code,
                    title: row.title,
                    summary: row.summary,
                    description: row.description.0,
                });
        }

        Ok(rows
            .into_iter()
            .map(|row| Project {
                translations: by_project.remove(&row.id).unwrap_or_default(),
                id: row.id,
                slug: row.slug,
                category: row.category,
                year: row.year,
                featured: row.featured,
                published: row.published,
                sort_order: row.sort_order,
                images: row.images.0,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }

    async fn require_page(&self, id: i64) -> Result<ContentPage, StoreError> {
        self.get_page(id)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("page {}", id)))
    }

    async fn require_project(&self, id: i64) -> Result<Project, StoreError> {
        self.get_project(id)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("project {}", id)))
    }

    async fn insert_page_translation(
        tx: &mut Transaction<'_, Postgres>,
        page_id: i64,
        translation: &PageTranslation,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO page_translations (page_id, language_code, title, body, meta_description)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (page_id, language_code) DO UPDATE
             SET title = EXCLUDED.title, body = EXCLUDED.body,
                 meta_description = EXCLUDED.meta_description",
        )
        .bind(page_id)
        .bind(&translation.language_code)
        .bind(&translation.title)
        .bind(Json(&translation.body))
        .bind(&translation.meta_description)
        .execute(&mut **tx)
        .await
        .map_err(|e| constraint_error(e, || "duplicate page translation".to_string()))?;
        Ok(())
    }

    async fn insert_project_translation(
        tx: &mut Transaction<'_, Postgres>,
        project_id: i64,
        translation: &ProjectTranslation,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO project_translations (project_id, language_code, title, summary, description)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (project_id, language_code) DO UPDATE
             SET title = EXCLUDED.title, summary = EXCLUDED.summary,
                 description = EXCLUDED.description",
        )
        .bind(project_id)
        .bind(&translation.language_code)
        .bind(&translation.title)
        .bind(&translation.summary)
        .bind(Json(&translation.description))
        .execute(&mut **tx)
        .await
        .map_err(|e| constraint_error(e, || "duplicate project translation".to_string()))?;
        Ok(())
    }

    async fn string_by_key(&self, key: &str) -> Result<UiString, StoreError> {
        let row: StringRow = sqlx::query_as("SELECT key, description FROM ui_strings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("translation key '{}'", key)))?;

        let values: Vec<StringValueRow> = sqlx::query_as(
            "SELECT key, language_code, value FROM ui_string_values WHERE key = $1",
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await?;

        Ok(UiString {
            key: row.key,
            description: row.description,
            values: values
                .into_iter()
                .map(|v| (v.language_code, v.value))
                .collect(),
        })
    }

    async fn write_string_values(
        tx: &mut Transaction<'_, Postgres>,
        string: &UiString,
    ) -> Result<(), StoreError> {
        for (language_code, value) in &string.values {
            sqlx::query(
                "INSERT INTO ui_string_values (key, language_code, value) VALUES ($1, $2, $3)
                 ON CONFLICT (key, language_code) DO UPDATE SET value = EXCLUDED.value",
            )
            .bind(&string.key)
            .bind(language_code)
            .bind(value)
            .execute(&mut **tx)
            .await
            .map_err(|e| constraint_error(e, || format!("duplicate value for '{}'", string.key)))?;
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn list_languages(&self) -> Result<Vec<Language>, StoreError> {
        let rows: Vec<LanguageRow> = sqlx::query_as(&format!(
            "SELECT {} FROM languages ORDER BY sort_order, code",
            LANGUAGE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Language::from).collect())
    }

    async fn create_language(&self, language: Language) -> Result<Language, StoreError> {
        let row: LanguageRow = sqlx::query_as(&format!(
            "INSERT INTO languages ({0}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {0}",
            LANGUAGE_COLUMNS
        ))
        .bind(&language.code)
        .bind(&language.name)
        .bind(&language.native_name)
        .bind(language.is_default)
        .bind(language.is_active)
        .bind(language.sort_order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            constraint_error(e, || {
                format!(
                    "language '{}' already exists or a default language is already set",
                    language.code
                )
            })
        })?;
        Ok(row.into())
    }

    async fn update_language(&self, language: Language) -> Result<Language, StoreError> {
        let row: Option<LanguageRow> = sqlx::query_as(&format!(
            "UPDATE languages SET name = $2, native_name = $3, is_active = $4, sort_order = $5
             WHERE code = $1 RETURNING {}",
            LANGUAGE_COLUMNS
        ))
        .bind(&language.code)
        .bind(&language.name)
        .bind(&language.native_name)
        .bind(language.is_active)
        .bind(language.sort_order)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Language::from)
            .ok_or_else(|| StoreError::not_found(format!("language '{}'", language.code)))
    }

    async fn set_default_language(&self, code: &str) -> Result<Language, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE languages SET is_default = FALSE WHERE is_default AND code <> $1")
            .bind(code)
            .execute(&mut *tx)
            .await?;

        let row: Option<LanguageRow> = sqlx::query_as(&format!(
            "UPDATE languages SET is_default = TRUE WHERE code = $1 RETURNING {}",
            LANGUAGE_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(StoreError::not_found(format!("language '{}'", code)));
        };

        tx.commit().await?;
        Ok(row.into())
    }

    async fn delete_language(&self, code: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM languages WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("language '{}'", code)));
        }
        Ok(())
    }

    async fn list_strings(&self) -> Result<Vec<UiString>, StoreError> {
        let rows: Vec<StringRow> = sqlx::query_as("SELECT key, description FROM ui_strings ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        let values: Vec<StringValueRow> =
            sqlx::query_as("SELECT key, language_code, value FROM ui_string_values")
                .fetch_all(&self.pool)
                .await?;

        let mut by_key: HashMap<String, BTreeMap<String, String>> = HashMap::new();
        for value in values {
            by_key
                .entry(value.key)
                .or_default()
                .insert(value.language_code, value.value);
        }

        Ok(rows
            .into_iter()
            .map(|row| UiString {
                values: by_key.remove(&row.key).unwrap_or_default(),
                key: row.key,
                description: row.description,
            })
            .collect())
    }

    async fn create_string(&self, string: UiString) -> Result<UiString, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO ui_strings (key, description) VALUES ($1, $2)")
            .bind(&string.key)
            .bind(&string.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                constraint_error(e, || format!("translation key '{}' already exists", string.key))
            })?;
        Self::write_string_values(&mut tx, &string).await?;
        tx.commit().await?;
        Ok(string)
    }

    async fn upsert_string(&self, string: UiString) -> Result<UiString, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO ui_strings (key, description) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE
             SET description = COALESCE(EXCLUDED.description, ui_strings.description)",
        )
        .bind(&string.key)
        .bind(&string.description)
        .execute(&mut *tx)
        .await?;
        Self::write_string_values(&mut tx, &string).await?;
        tx.commit().await?;
        self.string_by_key(&string.key).await
    }

    async fn set_string_value(
        &self,
        key: &str,
        language_code: &str,
        value: &str,
    ) -> Result<UiString, StoreError> {
        let exists: Option<(String,)> = sqlx::query_as("SELECT key FROM ui_strings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(StoreError::not_found(format!("translation key '{}'", key)));
        }

        sqlx::query(
            "INSERT INTO ui_string_values (key, language_code, value) VALUES ($1, $2, $3)
             ON CONFLICT (key, language_code) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(language_code)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| constraint_error(e, || format!("duplicate value for '{}'", key)))?;

        self.string_by_key(key).await
    }

    async fn delete_string(&self, key: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM ui_strings WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("translation key '{}'", key)));
        }
        Ok(())
    }

    async fn list_pages(&self) -> Result<Vec<ContentPage>, StoreError> {
        let rows: Vec<PageRow> =
            sqlx::query_as(&format!("SELECT {} FROM pages ORDER BY id", PAGE_COLUMNS))
                .fetch_all(&self.pool)
                .await?;
        self.pages_with_translations(rows).await
    }

    async fn get_page(&self, id: i64) -> Result<Option<ContentPage>, StoreError> {
        let rows: Vec<PageRow> =
            sqlx::query_as(&format!("SELECT {} FROM pages WHERE id = $1", PAGE_COLUMNS))
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
        Ok(self.pages_with_translations(rows).await?.into_iter().next())
    }

    async fn get_page_by_slug(&self, slug: &str) -> Result<Option<ContentPage>, StoreError> {
        let rows: Vec<PageRow> =
            sqlx::query_as(&format!("SELECT {} FROM pages WHERE slug = $1", PAGE_COLUMNS))
                .bind(slug)
                .fetch_all(&self.pool)
                .await?;
        Ok(self.pages_with_translations(rows).await?.into_iter().next())
    }

    async fn create_page(&self, page: NewPage) -> Result<ContentPage, StoreError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO pages (slug, published, components) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&page.slug)
        .bind(page.published)
        .bind(Json(&page.components))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| constraint_error(e, || format!("page slug '{}' already exists", page.slug)))?;

        for translation in &page.translations {
            Self::insert_page_translation(&mut tx, id, translation).await?;
        }

        tx.commit().await?;
        self.require_page(id).await
    }

    async fn update_page(&self, id: i64, update: PageUpdate) -> Result<ContentPage, StoreError> {
        let result = sqlx::query(
            "UPDATE pages SET
                slug = COALESCE($2, slug),
                published = COALESCE($3, published),
                components = COALESCE($4, components),
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(&update.slug)
        .bind(update.published)
        .bind(update.components.as_ref().map(Json))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            constraint_error(e, || {
                format!(
                    "page slug '{}' already exists",
                    update.slug.as_deref().unwrap_or_default()
                )
            })
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("page {}", id)));
        }
        self.require_page(id).await
    }

    async fn delete_page(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM pages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("page {}", id)));
        }
        Ok(())
    }

    async fn put_page_translation(
        &self,
        id: i64,
        translation: PageTranslation,
    ) -> Result<ContentPage, StoreError> {
        self.require_page(id).await?;

        let mut tx = self.pool.begin().await?;
        Self::insert_page_translation(&mut tx, id, &translation).await?;
        sqlx::query("UPDATE pages SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.require_page(id).await
    }

    async fn delete_page_translation(
        &self,
        id: i64,
        language_code: &str,
    ) -> Result<ContentPage, StoreError> {
        let result =
            sqlx::query("DELETE FROM page_translations WHERE page_id = $1 AND language_code = $2")
                .bind(id)
                .bind(language_code)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!(
                "'{}' translation of page {}",
                language_code, id
            )));
        }

        sqlx::query("UPDATE pages SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.require_page(id).await
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let rows: Vec<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {} FROM projects ORDER BY sort_order, id",
            PROJECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        self.projects_with_translations(rows).await
    }

    async fn get_project(&self, id: i64) -> Result<Option<Project>, StoreError> {
        let rows: Vec<ProjectRow> =
            sqlx::query_as(&format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS))
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
        Ok(self.projects_with_translations(rows).await?.into_iter().next())
    }

    async fn get_project_by_slug(&self, slug: &str) -> Result<Option<Project>, StoreError> {
        let rows: Vec<ProjectRow> =
            sqlx::query_as(&format!("SELECT {} FROM projects WHERE slug = $1", PROJECT_COLUMNS))
                .bind(slug)
                .fetch_all(&self.pool)
                .await?;
        Ok(self.projects_with_translations(rows).await?.into_iter().next())
    }

    async fn create_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO projects (slug, category, year, featured, published, sort_order, images)
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&project.slug)
        .bind(&project.category)
        .bind(project.year)
        .bind(project.featured)
        .bind(project.published)
        .bind(project.sort_order)
        .bind(Json(&project.images))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            constraint_error(e, || format!("project slug '{}' already exists", project.slug))
        })?;

        for translation in &project.translations {
            Self::insert_project_translation(&mut tx, id, translation).await?;
        }

        tx.commit().await?;
        self.require_project(id).await
    }

    async fn update_project(&self, id: i64, update: ProjectUpdate) -> Result<Project, StoreError> {
        // An empty category clears it; NULL keeps the current one.
        let result = sqlx::query(
            "UPDATE projects SET
                slug = COALESCE($2, slug),
                category = CASE WHEN $3::TEXT IS NULL THEN category ELSE NULLIF($3, '') END,
                year = COALESCE($4, year),
                featured = COALESCE($5, featured),
                published = COALESCE($6, published),
                sort_order = COALESCE($7, sort_order),
                images = COALESCE($8, images),
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(&update.slug)
        .bind(&update.category)
        .bind(update.year)
        .bind(update.featured)
        .bind(update.published)
        .bind(update.sort_order)
        .bind(update.images.as_ref().map(Json))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            constraint_error(e, || {
                format!(
                    "project slug '{}' already exists",
                    update.slug.as_deref().unwrap_or_default()
                )
            })
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("project {}", id)));
        }
        self.require_project(id).await
    }

    async fn delete_project(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("project {}", id)));
        }
        Ok(())
    }

    async fn put_project_translation(
        &self,
        id: i64,
        translation: ProjectTranslation,
    ) -> Result<Project, StoreError> {
        self.require_project(id).await?;

        let mut tx = self.pool.begin().await?;
        Self::insert_project_translation(&mut tx, id, &translation).await?;
        sqlx::query("UPDATE projects SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.require_project(id).await
    }

    async fn delete_project_translation(
        &self,
        id: i64,
        language_code: &str,
    ) -> Result<Project, StoreError> {
        let result = sqlx::query(
            "DELETE FROM project_translations WHERE project_id = $1 AND language_code = $2",
        )
        .bind(id)
        .bind(language_code)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!(
                "'{}' translation of project {}",
                language_code, id
            )));
        }

        sqlx::query("UPDATE projects SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.require_project(id).await
    }

    async fn list_settings(&self) -> Result<Vec<Setting>, StoreError> {
        let rows: Vec<SettingRow> =
            sqlx::query_as("SELECT key, value, updated_at FROM settings ORDER BY key")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|row| Setting {
                key: row.key,
                value: row.value,
                updated_at: row.updated_at,
            })
            .collect())
    }

    async fn put_setting(&self, key: &str, value: serde_json::Value) -> Result<Setting, StoreError> {
        let row: SettingRow = sqlx::query_as(
            "INSERT INTO settings (key, value, updated_at) VALUES ($1, $2, NOW())
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
             RETURNING key, value, updated_at",
        )
        .bind(key)
        .bind(&value)
        .fetch_one(&self.pool)
        .await?;

        Ok(Setting {
            key: row.key,
            value: row.value,
            updated_at: row.updated_at,
        })
    }

    async fn delete_setting(&self, key: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM settings WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("setting '{}'", key)));
        }
        Ok(())
    }

    async fn record_page_view(&self, view: PageView) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO page_views (path, language_code, referrer, viewed_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&view.path)
        .bind(&view.language_code)
        .bind(&view.referrer)
        .bind(view.viewed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn page_views_since(&self, since: DateTime<Utc>) -> Result<Vec<PageView>, StoreError> {
        let rows: Vec<PageViewRow> = sqlx::query_as(
            "SELECT path, language_code, referrer, viewed_at FROM page_views
             WHERE viewed_at >= $1 ORDER BY viewed_at",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PageView {
                path: row.path,
                language_code: row.language_code,
                referrer: row.referrer,
                viewed_at: row.viewed_at,
            })
            .collect())
    }

    async fn upsert_social_posts(&self, posts: &[SocialPost]) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        for post in posts {
            sqlx::query(
                "INSERT INTO social_posts
                    (platform, external_id, caption, media_url, permalink, posted_at, synced_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (platform, external_id) DO UPDATE SET
                    caption = EXCLUDED.caption,
                    media_url = EXCLUDED.media_url,
                    permalink = EXCLUDED.permalink,
                    posted_at = EXCLUDED.posted_at,
                    synced_at = EXCLUDED.synced_at",
            )
            .bind(&post.platform)
            .bind(&post.external_id)
            .bind(&post.caption)
            .bind(&post.media_url)
            .bind(&post.permalink)
            .bind(post.posted_at)
            .bind(post.synced_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(posts.len())
    }

    async fn list_social_posts(&self, limit: usize) -> Result<Vec<SocialPost>, StoreError> {
        let rows: Vec<SocialPostRow> = sqlx::query_as(
            "SELECT external_id, platform, caption, media_url, permalink, posted_at, synced_at
             FROM social_posts ORDER BY posted_at DESC NULLS LAST, synced_at DESC LIMIT $1",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SocialPost {
                external_id: row.external_id,
                platform: row.platform,
                caption: row.caption,
                media_url: row.media_url,
                permalink: row.permalink,
                posted_at: row.posted_at,
                synced_at: row.synced_at,
            })
            .collect())
    }
}
