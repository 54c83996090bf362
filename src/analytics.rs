//! Page-view tracking and the admin traffic summary.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::models::PageView;
use crate::store::{ContentStore, StoreError};
use crate::validation::{normalize_language_code, ValidationError};

const MAX_PATH_LEN: usize = 2048;
const MAX_REFERRER_LEN: usize = 512;
const TOP_ENTRIES: usize = 10;

pub const DEFAULT_DAYS: i64 = 30;
pub const MAX_DAYS: i64 = 365;

/// Body of `POST /api/analytics/track`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackRequest {
    pub path: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
}

impl TrackRequest {
    /// Validate into a page view stamped `now`.
    pub fn into_page_view(self, now: DateTime<Utc>) -> Result<PageView, ValidationError> {
        let path = self.path.trim();
        if !path.starts_with('/') {
            return Err(ValidationError::new("path must start with '/'"));
        }
        if path.len() > MAX_PATH_LEN {
            return Err(ValidationError::new("path is too long"));
        }

        let language_code = match self.language.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => Some(normalize_language_code(code)?),
            _ => None,
        };

        // Only absolute http(s) referrers are kept.
        let referrer = self
            .referrer
            .as_deref()
            .and_then(|r| Url::parse(r.trim()).ok())
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .map(|url| url.as_str().chars().take(MAX_REFERRER_LEN).collect());

        Ok(PageView {
            path: path.to_string(),
            language_code,
            referrer,
            viewed_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Traffic over the last `days` days.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub days: i64,
    pub since: DateTime<Utc>,
    pub total_views: usize,
    pub top_paths: Vec<CountEntry>,
    pub by_language: Vec<CountEntry>,
    pub top_referrers: Vec<CountEntry>,
    /// One entry per day, oldest first, zero-filled
    pub by_day: Vec<DayCount>,
}

/// Clamp a requested window to 1..=365 days, defaulting to 30.
pub fn window_days(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS)
}

fn ranked(counts: HashMap<String, usize>, limit: usize) -> Vec<CountEntry> {
    let mut entries: Vec<CountEntry> = counts
        .into_iter()
        .map(|(key, count)| CountEntry { key, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    entries.truncate(limit);
    entries
}

fn referrer_host(referrer: &str) -> Option<String> {
    Url::parse(referrer).ok()?.host_str().map(str::to_string)
}

/// Aggregate page views for the window ending at `now`.
pub fn summarize(views: &[PageView], days: i64, now: DateTime<Utc>) -> AnalyticsSummary {
    let since = now - Duration::days(days);
    let in_window: Vec<&PageView> = views.iter().filter(|v| v.viewed_at >= since).collect();

    let mut paths = HashMap::new();
    let mut languages = HashMap::new();
    let mut referrers = HashMap::new();
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();

    for view in &in_window {
        *paths.entry(view.path.clone()).or_insert(0) += 1;
        let language = view.language_code.clone().unwrap_or_else(|| "unknown".to_string());
        *languages.entry(language).or_insert(0) += 1;
        if let Some(host) = view.referrer.as_deref().and_then(referrer_host) {
            *referrers.entry(host).or_insert(0) += 1;
        }
        *per_day.entry(view.viewed_at.date_naive()).or_insert(0) += 1;
    }

    let first_day = since.date_naive();
    let by_day = first_day
        .iter_days()
        .take_while(|day| *day <= now.date_naive())
        .map(|date| DayCount {
            date,
            count: per_day.get(&date).copied().unwrap_or(0),
        })
        .collect();

    AnalyticsSummary {
        days,
        since,
        total_views: in_window.len(),
        top_paths: ranked(paths, TOP_ENTRIES),
        by_language: ranked(languages, usize::MAX),
        top_referrers: ranked(referrers, TOP_ENTRIES),
        by_day,
    }
}

pub async fn track(store: &dyn ContentStore, request: TrackRequest) -> Result<(), StoreError> {
    let view = request.into_page_view(Utc::now())?;
    store.record_page_view(view).await
}

pub async fn summary(store: &dyn ContentStore, days: Option<i64>) -> Result<AnalyticsSummary, StoreError> {
    let days = window_days(days);
    let now = Utc::now();
    let views = store.page_views_since(now - Duration::days(days)).await?;
    Ok(summarize(&views, days, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn view(path: &str, lang: Option<&str>, referrer: Option<&str>, at: DateTime<Utc>) -> PageView {
        PageView {
            path: path.to_string(),
            language_code: lang.map(str::to_string),
            referrer: referrer.map(str::to_string),
            viewed_at: at,
        }
    }

    fn request(path: &str) -> TrackRequest {
        TrackRequest {
            path: path.to_string(),
            language: None,
            referrer: None,
        }
    }

    #[test]
    fn test_track_request_validation() {
        let now = Utc::now();
        assert!(request("projects").into_page_view(now).is_err());
        assert!(request(&format!("/{}", "a".repeat(MAX_PATH_LEN))).into_page_view(now).is_err());

        let view = TrackRequest {
            path: " /projects ".to_string(),
            language: Some("FR".to_string()),
            referrer: Some("javascript:alert(1)".to_string()),
        }
        .into_page_view(now)
        .unwrap();
        assert_eq!(view.path, "/projects");
        assert_eq!(view.language_code.as_deref(), Some("fr"));
        assert!(view.referrer.is_none());
    }

    #[test]
    fn test_track_request_bad_language() {
        let result = TrackRequest {
            path: "/".to_string(),
            language: Some("not a language".to_string()),
            referrer: None,
        }
        .into_page_view(Utc::now());
        assert!(result.is_err());
    }

    #[test]
    fn test_window_days() {
        assert_eq!(window_days(None), 30);
        assert_eq!(window_days(Some(0)), 1);
        assert_eq!(window_days(Some(7)), 7);
        assert_eq!(window_days(Some(10_000)), 365);
    }

    #[test]
    fn test_summarize() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let views = vec![
            view("/", Some("nl"), Some("https://www.google.com/search?q=tafel"), now),
            view("/", Some("fr"), None, now - Duration::days(1)),
            view("/projects", Some("nl"), Some("https://google.com/"), now - Duration::days(1)),
            view("/old", Some("nl"), None, now - Duration::days(30)),
        ];

        let summary = summarize(&views, 7, now);
        assert_eq!(summary.total_views, 3);
        assert_eq!(summary.top_paths[0], CountEntry { key: "/".to_string(), count: 2 });
        assert_eq!(summary.by_language[0], CountEntry { key: "nl".to_string(), count: 2 });
        assert_eq!(summary.top_referrers.len(), 2);

        assert_eq!(summary.by_day.len(), 8);
        assert_eq!(summary.by_day.first().unwrap().date, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
        assert_eq!(summary.by_day.last().unwrap().count, 1);
        assert_eq!(summary.by_day[6].count, 2);
        assert_eq!(summary.by_day.iter().map(|d| d.count).sum::<usize>(), 3);
    }

    #[test]
    fn test_unknown_language_bucket() {
        let now = Utc::now();
        let summary = summarize(&[view("/", None, None, now)], 1, now);
        assert_eq!(summary.by_language[0].key, "unknown");
    }
}
