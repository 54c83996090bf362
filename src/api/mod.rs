// HTTP API: public read routes and the authenticated admin surface
pub mod admin;
pub mod public;
pub mod state;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use self::state::AppState;

/// Create the Axum application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(public::health_check))
        .route("/api/languages", get(public::list_languages))
        .route("/api/strings", get(public::strings_bundle))
        .route("/api/pages/:slug", get(public::get_page))
        .route("/api/pages/:slug/html", get(public::get_page_html))
        .route("/api/projects", get(public::list_projects))
        .route("/api/projects/:slug", get(public::get_project))
        .route("/api/social", get(public::list_social_posts))
        .route("/api/analytics/track", post(public::track_page_view));

    let admin = Router::new()
        .route(
            "/languages",
            get(admin::list_languages).post(admin::create_language),
        )
        .route(
            "/languages/:code",
            put(admin::update_language).delete(admin::delete_language),
        )
        .route("/languages/:code/default", post(admin::set_default_language))
        .route("/strings", get(admin::list_strings).post(admin::create_string))
        .route("/strings/missing", get(admin::missing_strings))
        .route("/strings/:key", axum::routing::delete(admin::delete_string))
        .route("/strings/:key/:lang", put(admin::set_string_value))
        .route("/pages", get(admin::list_pages).post(admin::create_page))
        .route(
            "/pages/:id",
            get(admin::get_page)
                .put(admin::update_page)
                .delete(admin::delete_page),
        )
        .route(
            "/pages/:id/translations/:lang",
            put(admin::put_page_translation).delete(admin::delete_page_translation),
        )
        .route("/pages/:id/completeness", get(admin::page_completeness))
        .route(
            "/projects",
            get(admin::list_projects).post(admin::create_project),
        )
        .route(
            "/projects/:id",
            get(admin::get_project)
                .put(admin::update_project)
                .delete(admin::delete_project),
        )
        .route(
            "/projects/:id/translations/:lang",
            put(admin::put_project_translation).delete(admin::delete_project_translation),
        )
        .route("/projects/:id/completeness", get(admin::project_completeness))
        .route("/settings", get(admin::list_settings))
        .route("/settings/export", get(admin::export_settings))
        .route("/settings/import", post(admin::import_settings))
        .route(
            "/settings/:key",
            put(admin::put_setting).delete(admin::delete_setting),
        )
        .route("/analytics", get(admin::analytics_summary))
        .route("/metrics", get(admin::resolution_metrics))
        .route("/social/sync", post(admin::sync_social));

    public
        .nest("/api/admin", admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server on the specified address
pub async fn run_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    info!("Server listening on {}", addr);
    info!("- Public API: http://{}/api", addr);
    info!("- Admin API: http://{}/api/admin", addr);
    info!("- Health endpoint: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
