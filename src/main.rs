use anyhow::{Context, Result};
use atelier_cms::api::{self, AppState};
use atelier_cms::config::Config;
use atelier_cms::editorial;
use atelier_cms::scheduler;
use atelier_cms::store::{ContentStore, MemoryStore, PgStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("atelier_cms=info".parse()?),
        )
        .init();

    info!("Starting atelier-cms");

    // Load configuration from environment
    let config = Arc::new(Config::from_env()?);

    let store: Arc<dyn ContentStore> = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url)
                .await
                .context("Failed to connect to database")?;
            info!("✓ Connected to PostgreSQL");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store (content is lost on restart)");
            Arc::new(MemoryStore::new())
        }
    };

    let seeded = editorial::seed_languages(store.as_ref(), &config.seed_languages)
        .await
        .context("Failed to seed languages")?;
    if seeded > 0 {
        info!("✓ Seeded {} languages", seeded);
    }

    // Keep the scheduler alive for the lifetime of the server
    let _scheduler = if config.social_sync_enabled() {
        Some(scheduler::start_scheduler(Arc::clone(&config), Arc::clone(&store)).await?)
    } else {
        info!("Social sync not configured, scheduler disabled");
        None
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = api::create_app(AppState::new(config, store));
    api::run_server(app, addr).await
}
