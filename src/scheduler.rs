use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use std::sync::Arc;
use crate::config::Config;
use crate::retry::RetryConfig;
use crate::social;
use crate::store::ContentStore;

/// Initialize and start the scheduler
pub async fn start_scheduler(config: Arc<Config>, store: Arc<dyn ContentStore>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let cron_expr = config.social_sync_schedule.clone();
    info!("Scheduling social sync (cron: {})", cron_expr);

    let job = social_sync_job(&cron_expr, config, store)?;
    scheduler.add(job).await?;

    scheduler.start().await?;
    info!("✓ Scheduler started");

    Ok(scheduler)
}

fn social_sync_job(cron_expr: &str, config: Arc<Config>, store: Arc<dyn ContentStore>) -> Result<Job> {
    let job = Job::new_async(cron_expr, move |_uuid, _l| {
        let config = Arc::clone(&config);
        let store = Arc::clone(&store);

        Box::pin(async move {
            info!("⏰ Social sync triggered");
            if let Err(e) = run_social_sync(&config, store.as_ref()).await {
                error!("Social sync failed: {:#}", e);
            }
        })
    })
    .with_context(|| format!("Invalid social sync schedule '{}'", cron_expr))?;

    Ok(job)
}

/// Run one social sync with the production retry policy.
pub async fn run_social_sync(config: &Config, store: &dyn ContentStore) -> Result<usize> {
    social::sync_social_posts(config, store, &RetryConfig::social_feed()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn config(schedule: &str) -> Config {
        Config {
            database_url: None,
            port: 8080,
            admin_api_key: "admin".to_string(),
            editor_api_key: None,
            seed_languages: vec![],
            social_feed_url: None,
            social_access_token: None,
            social_sync_schedule: schedule.to_string(),
            social_sync_limit: 25,
        }
    }

    #[tokio::test]
    async fn test_valid_schedule_builds_job() {
        let config = Arc::new(config("0 0 */6 * * *"));
        let store: Arc<dyn ContentStore> = Arc::new(MemoryStore::new());
        assert!(social_sync_job("0 0 */6 * * *", config, store).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_schedule_is_rejected() {
        let config = Arc::new(config("every six hours"));
        let store: Arc<dyn ContentStore> = Arc::new(MemoryStore::new());
        let Err(err) = social_sync_job("every six hours", config, store) else {
            panic!("invalid cron expression was accepted");
        };
        assert!(err.to_string().contains("every six hours"));
    }

    #[tokio::test]
    async fn test_run_without_feed_is_noop() {
        let store = MemoryStore::new();
        assert_eq!(run_social_sync(&config("0 0 * * * *"), &store).await.unwrap(), 0);
    }
}
