//! Social media sync: mirror recent posts from the workshop's Instagram
//! account so the site can show them without client-side API calls.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::SocialPost;
use crate::retry::{with_retry_if, RetryConfig};
use crate::store::ContentStore;

const PLATFORM: &str = "instagram";
const MEDIA_FIELDS: &str = "id,caption,media_url,permalink,timestamp";

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("social feed request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("social feed returned HTTP {0}")]
    Status(StatusCode),
}

impl FeedError {
    /// Rate limits, server errors and network failures are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::Status(status) => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            FeedError::Request(e) => !e.is_decode() && !e.is_builder(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MediaPage {
    #[serde(default)]
    data: Vec<MediaItem>,
}

#[derive(Debug, Deserialize)]
struct MediaItem {
    id: String,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    media_url: Option<String>,
    #[serde(default)]
    permalink: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Graph API timestamps look like `2024-03-01T09:30:00+0000`; RFC 3339 is
/// accepted too.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn to_post(item: MediaItem, synced_at: DateTime<Utc>) -> Option<SocialPost> {
    if item.id.trim().is_empty() {
        return None;
    }
    Some(SocialPost {
        posted_at: item.timestamp.as_deref().and_then(parse_timestamp),
        external_id: item.id,
        platform: PLATFORM.to_string(),
        caption: item.caption.filter(|c| !c.trim().is_empty()),
        media_url: item.media_url,
        permalink: item.permalink,
        synced_at,
    })
}

async fn fetch_page(
    client: &reqwest::Client,
    feed_url: &str,
    access_token: &str,
    limit: u32,
) -> Result<MediaPage, FeedError> {
    let limit = limit.to_string();
    let response = client
        .get(feed_url)
        .query(&[
            ("fields", MEDIA_FIELDS),
            ("limit", limit.as_str()),
            ("access_token", access_token),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::Status(status));
    }

    Ok(response.json::<MediaPage>().await?)
}

/// Fetch the most recent posts from an Instagram-Graph-shaped media endpoint.
pub async fn fetch_recent_posts(
    feed_url: &str,
    access_token: &str,
    limit: u32,
    retry: &RetryConfig,
) -> Result<Vec<SocialPost>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .context("Failed to build HTTP client")?;

    let page = with_retry_if(
        retry,
        "Social feed",
        || fetch_page(&client, feed_url, access_token, limit),
        FeedError::is_retryable,
    )
    .await
    .context("Failed to fetch social feed")?;

    let synced_at = Utc::now();
    let total = page.data.len();
    let posts: Vec<SocialPost> = page
        .data
        .into_iter()
        .filter_map(|item| to_post(item, synced_at))
        .collect();

    if posts.len() < total {
        warn!("Skipped {} social feed items without an id", total - posts.len());
    }
    Ok(posts)
}

/// Fetch recent posts and store them. Returns how many posts were written,
/// or zero when the sync is not configured.
pub async fn sync_social_posts(
    config: &Config,
    store: &dyn ContentStore,
    retry: &RetryConfig,
) -> Result<usize> {
    let (Some(feed_url), Some(token)) = (&config.social_feed_url, &config.social_access_token)
    else {
        info!("Social sync not configured, skipping");
        return Ok(0);
    };

    let posts = fetch_recent_posts(feed_url, token, config.social_sync_limit, retry).await?;
    if posts.is_empty() {
        info!("Social feed returned no posts");
        return Ok(0);
    }

    let written = store
        .upsert_social_posts(&posts)
        .await
        .context("Failed to store social posts")?;
    info!("✓ Synced {} social posts", written);
    Ok(written)
}
