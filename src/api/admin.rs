// Authenticated admin routes. Editors manage content; admins also manage
// languages, settings and the social sync.
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::analytics;
use crate::api::state::AppState;
use crate::editorial;
use crate::error::ApiError;
use crate::i18n::{LanguageUpdate, NewLanguage, NewUiString, ResolutionMetrics};
use crate::models::{
    NewPage, NewProject, PageTranslationInput, PageUpdate, ProjectTranslationInput, ProjectUpdate,
};
use crate::scheduler;
use crate::security::Role;
use crate::settings::{self, SettingsError};

#[derive(Debug, Deserialize)]
pub struct MissingQuery {
    pub lang: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StringValue {
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct SettingValue {
    pub value: serde_json::Value,
}

// ==================== Languages ====================

pub async fn list_languages(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Admin)?;
    Ok(Json(state.store().list_languages().await?))
}

pub async fn create_language(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewLanguage>,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Admin)?;
    let language = editorial::create_language(state.store(), payload).await?;
    Ok((StatusCode::CREATED, Json(language)))
}

pub async fn update_language(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<LanguageUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Admin)?;
    Ok(Json(editorial::update_language(state.store(), &code, payload).await?))
}

pub async fn set_default_language(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Admin)?;
    Ok(Json(editorial::set_default_language(state.store(), &code).await?))
}

pub async fn delete_language(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Admin)?;
    editorial::delete_language(state.store(), &code).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== UI Strings ====================

pub async fn list_strings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    Ok(Json(state.store().list_strings().await?))
}

pub async fn create_string(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewUiString>,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    let string = editorial::create_string(state.store(), payload).await?;
    Ok((StatusCode::CREATED, Json(string)))
}

pub async fn missing_strings(
    State(state): State<AppState>,
    Query(query): Query<MissingQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    let missing = editorial::missing_strings(state.store(), &query.lang).await?;
    Ok(Json(json!({ "language": query.lang, "missing": missing })))
}

pub async fn set_string_value(
    State(state): State<AppState>,
    Path((key, lang)): Path<(String, String)>,
    headers: HeaderMap,
    Json(payload): Json<StringValue>,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    let string = editorial::set_string_value(state.store(), &key, &lang, &payload.value).await?;
    Ok(Json(string))
}

pub async fn delete_string(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    state.store().delete_string(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Pages ====================

pub async fn list_pages(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    Ok(Json(state.store().list_pages().await?))
}

pub async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    state
        .store()
        .get_page(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("page {}", id)))
}

pub async fn create_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewPage>,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    let page = editorial::create_page(state.store(), payload).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

pub async fn update_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<PageUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    Ok(Json(editorial::update_page(state.store(), id, payload).await?))
}

pub async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    state.store().delete_page(id).await?;
    info!("Deleted page {}", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn put_page_translation(
    State(state): State<AppState>,
    Path((id, lang)): Path<(i64, String)>,
    headers: HeaderMap,
    Json(payload): Json<PageTranslationInput>,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    Ok(Json(
        editorial::put_page_translation(state.store(), id, &lang, payload).await?,
    ))
}

pub async fn delete_page_translation(
    State(state): State<AppState>,
    Path((id, lang)): Path<(i64, String)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    Ok(Json(
        editorial::delete_page_translation(state.store(), id, &lang).await?,
    ))
}

pub async fn page_completeness(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    Ok(Json(editorial::page_completeness(state.store(), id).await?))
}

// ==================== Projects ====================

pub async fn list_projects(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    Ok(Json(state.store().list_projects().await?))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    state
        .store()
        .get_project(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("project {}", id)))
}

pub async fn create_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewProject>,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    let project = editorial::create_project(state.store(), payload).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<ProjectUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    Ok(Json(editorial::update_project(state.store(), id, payload).await?))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    state.store().delete_project(id).await?;
    info!("Deleted project {}", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn put_project_translation(
    State(state): State<AppState>,
    Path((id, lang)): Path<(i64, String)>,
    headers: HeaderMap,
    Json(payload): Json<ProjectTranslationInput>,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    Ok(Json(
        editorial::put_project_translation(state.store(), id, &lang, payload).await?,
    ))
}

pub async fn delete_project_translation(
    State(state): State<AppState>,
    Path((id, lang)): Path<(i64, String)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    Ok(Json(
        editorial::delete_project_translation(state.store(), id, &lang).await?,
    ))
}

pub async fn project_completeness(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    Ok(Json(editorial::project_completeness(state.store(), id).await?))
}

// ==================== Settings ====================

pub async fn list_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Admin)?;
    Ok(Json(state.store().list_settings().await?))
}

pub async fn put_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<SettingValue>,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Admin)?;
    Ok(Json(settings::put_setting(state.store(), &key, payload.value).await?))
}

pub async fn delete_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Admin)?;
    state.store().delete_setting(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Download settings, languages and UI strings as a ZIP archive.
pub async fn export_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Admin)?;

    let bytes = settings::export_archive(state.store())
        .await
        .map_err(|e| match e {
            SettingsError::Store(e) => ApiError::from(e),
            other => ApiError::Internal(other.into()),
        })?;

    let filename = format!("settings-{}.zip", Utc::now().format("%Y%m%d-%H%M%S"));
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}

/// Apply an uploaded settings archive (raw ZIP body).
pub async fn import_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Admin)?;
    if body.is_empty() {
        return Err(ApiError::BadRequest("empty archive".to_string()));
    }

    let report = settings::import_archive(state.store(), &body).await?;
    Ok(Json(report))
}

// ==================== Analytics & Metrics ====================

pub async fn analytics_summary(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    Ok(Json(analytics::summary(state.store(), query.days).await?))
}

pub async fn resolution_metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Editor)?;
    Ok(Json(ResolutionMetrics::global().report()))
}

// ==================== Social ====================

pub async fn sync_social(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.authorize(&headers, Role::Admin)?;
    if !state.config.social_sync_enabled() {
        return Err(ApiError::BadRequest("social sync is not configured".to_string()));
    }

    let synced = scheduler::run_social_sync(&state.config, state.store()).await?;
    Ok(Json(json!({ "synced": synced })))
}
