// Public read routes and page-view tracking
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use maud::{html, PreEscaped};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::analytics::{self, TrackRequest};
use crate::api::state::AppState;
use crate::content::{self, ProjectFilter, ResolvedPage};
use crate::editorial;
use crate::error::ApiError;
use crate::i18n::{FallbackResolver, Language, LanguageRegistry, StringCatalog};

const DEFAULT_SOCIAL_LIMIT: usize = 12;
const MAX_SOCIAL_LIMIT: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectsQuery {
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SocialQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Languages and the visitor's negotiated language code.
async fn negotiate(
    state: &AppState,
    lang: Option<&str>,
    headers: &HeaderMap,
) -> Result<(LanguageRegistry, String), ApiError> {
    let registry = editorial::load_registry(state.store()).await?;
    let accept_language = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    let code = registry.negotiate(lang, accept_language).code.clone();
    debug!("Serving language {}", code);
    Ok((registry, code))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn list_languages(State(state): State<AppState>) -> Result<Json<Vec<Language>>, ApiError> {
    let registry = editorial::load_registry(state.store()).await?;
    Ok(Json(registry.active().into_iter().cloned().collect()))
}

pub async fn strings_bundle(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let (registry, code) = negotiate(&state, query.lang.as_deref(), &headers).await?;
    let strings = state.store().list_strings().await?;
    let catalog = StringCatalog::new(strings, registry.default_code());

    Ok(Json(json!({
        "language": code,
        "strings": catalog.bundle(&code),
    })))
}

async fn resolved_page(
    state: &AppState,
    slug: &str,
    lang: Option<&str>,
    headers: &HeaderMap,
) -> Result<ResolvedPage, ApiError> {
    let (registry, code) = negotiate(state, lang, headers).await?;
    let resolver = FallbackResolver::new(&code, registry.default_code());

    let page = state
        .store()
        .get_page_by_slug(slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("page '{}'", slug)))?;

    // Project grids on the page need the visible projects in this language.
    let projects = state.store().list_projects().await?;
    let cards = content::project_cards(&projects, &resolver, &ProjectFilter::default());

    content::resolve_page(&page, &resolver, &cards)
        .ok_or_else(|| ApiError::not_found(format!("page '{}'", slug)))
}

pub async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
) -> Result<Json<ResolvedPage>, ApiError> {
    let page = resolved_page(&state, &slug, query.lang.as_deref(), &headers).await?;
    Ok(Json(page))
}

/// The page as an HTML fragment, ready to embed.
pub async fn get_page_html(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let page = resolved_page(&state, &slug, query.lang.as_deref(), &headers).await?;

    let fallback = page.is_fallback.to_string();
    let markup = html! {
        article.page lang=(page.language) data-slug=(page.slug) data-fallback=(fallback) {
            h1 { (page.title) }
            @if !page.body_html.is_empty() {
                div.page-body { (PreEscaped(&page.body_html)) }
            }
            (PreEscaped(&page.components_html))
        }
    };

    Ok((
        [(header::CONTENT_LANGUAGE, page.language.clone())],
        Html(markup.into_string()),
    ))
}

pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectsQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let (registry, code) = negotiate(&state, query.lang.as_deref(), &headers).await?;
    let resolver = FallbackResolver::new(&code, registry.default_code());

    let filter = ProjectFilter {
        category: query.category,
        featured: query.featured,
    };
    let projects = state.store().list_projects().await?;
    let cards = content::project_cards(&projects, &resolver, &filter);

    Ok(Json(json!({
        "language": code,
        "projects": cards,
    })))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let (registry, code) = negotiate(&state, query.lang.as_deref(), &headers).await?;
    let resolver = FallbackResolver::new(&code, registry.default_code());

    let project = state
        .store()
        .get_project_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("project '{}'", slug)))?;

    content::resolve_project(&project, &resolver)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("project '{}'", slug)))
}

pub async fn list_social_posts(
    State(state): State<AppState>,
    Query(query): Query<SocialQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SOCIAL_LIMIT)
        .clamp(1, MAX_SOCIAL_LIMIT);
    let posts = state.store().list_social_posts(limit).await?;
    Ok(Json(posts))
}

pub async fn track_page_view(
    State(state): State<AppState>,
    Json(payload): Json<TrackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    analytics::track(state.store(), payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
