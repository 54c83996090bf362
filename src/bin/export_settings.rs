use anyhow::{Context, Result};
use atelier_cms::settings;
use atelier_cms::store::PgStore;
use tracing::info;

/// Write the settings archive of the configured database to a file.
///
/// Usage: export-settings <output.zip>
#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("atelier_cms=info".parse()?),
        )
        .init();

    let output = std::env::args()
        .nth(1)
        .context("Usage: export-settings <output.zip>")?;
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;

    let store = PgStore::connect(&database_url)
        .await
        .context("Failed to connect to database")?;
    let bytes = settings::export_archive(&store).await?;

    std::fs::write(&output, &bytes).with_context(|| format!("Failed to write {}", output))?;
    info!("✓ Wrote {} bytes to {}", bytes.len(), output);

    Ok(())
}
