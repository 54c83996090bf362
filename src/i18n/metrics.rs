//! Resolution metrics: how often visitors get their own language.

use crate::i18n::ResolutionSource;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Counters for fallback resolution outcomes.
pub struct ResolutionMetrics {
    /// Requested language had a value
    exact_hits: AtomicUsize,

    /// Default language stood in
    default_fallbacks: AtomicUsize,

    /// UI string degraded to its key
    raw_key_fallbacks: AtomicUsize,

    /// Content had neither requested nor default translation
    not_found: AtomicUsize,
}

/// Global metrics instance (initialized lazily)
static METRICS: OnceLock<ResolutionMetrics> = OnceLock::new();

impl ResolutionMetrics {
    pub fn new() -> Self {
        Self {
            exact_hits: AtomicUsize::new(0),
            default_fallbacks: AtomicUsize::new(0),
            raw_key_fallbacks: AtomicUsize::new(0),
            not_found: AtomicUsize::new(0),
        }
    }

    /// Get the process-wide metrics instance.
    pub fn global() -> &'static ResolutionMetrics {
        METRICS.get_or_init(ResolutionMetrics::new)
    }

    /// Record a successful resolution by its source.
    pub fn record(&self, source: ResolutionSource) {
        let counter = match source {
            ResolutionSource::Exact => &self.exact_hits,
            ResolutionSource::DefaultLanguage => &self.default_fallbacks,
            ResolutionSource::RawKey => &self.raw_key_fallbacks,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record content that could not be resolved at all.
    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn exact_hits(&self) -> usize {
        self.exact_hits.load(Ordering::Relaxed)
    }

    pub fn default_fallbacks(&self) -> usize {
        self.default_fallbacks.load(Ordering::Relaxed)
    }

    pub fn raw_key_fallbacks(&self) -> usize {
        self.raw_key_fallbacks.load(Ordering::Relaxed)
    }

    pub fn not_found(&self) -> usize {
        self.not_found.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let exact = self.exact_hits();
        let defaults = self.default_fallbacks();
        let raw_keys = self.raw_key_fallbacks();
        let not_found = self.not_found();

        let total = exact + defaults + raw_keys + not_found;
        let fallback_rate = if total > 0 {
            ((defaults + raw_keys + not_found) as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            exact_hits: exact,
            default_fallbacks: defaults,
            raw_key_fallbacks: raw_keys,
            not_found,
            total_resolutions: total,
            fallback_rate,
        }
    }
}

impl Default for ResolutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of resolution metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub exact_hits: usize,
    pub default_fallbacks: usize,
    pub raw_key_fallbacks: usize,
    pub not_found: usize,
    pub total_resolutions: usize,
    /// Percentage of resolutions that did not use the requested language
    pub fallback_rate: f64,
}

impl MetricsReport {
    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "Resolutions: {} total, {} exact, {} default-language, {} raw-key, {} not found ({:.1}% fallback)",
            self.total_resolutions,
            self.exact_hits,
            self.default_fallbacks,
            self.raw_key_fallbacks,
            self.not_found,
            self.fallback_rate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_is_singleton() {
        assert!(std::ptr::eq(
            ResolutionMetrics::global(),
            ResolutionMetrics::global()
        ));
    }

    #[test]
    fn test_new_metrics_are_zero() {
        let report = ResolutionMetrics::new().report();
        assert_eq!(report.total_resolutions, 0);
        assert_eq!(report.fallback_rate, 0.0);
    }

    #[test]
    fn test_record_by_source() {
        let metrics = ResolutionMetrics::new();
        metrics.record(ResolutionSource::Exact);
        metrics.record(ResolutionSource::Exact);
        metrics.record(ResolutionSource::DefaultLanguage);
        metrics.record(ResolutionSource::RawKey);
        metrics.record_not_found();

        assert_eq!(metrics.exact_hits(), 2);
        assert_eq!(metrics.default_fallbacks(), 1);
        assert_eq!(metrics.raw_key_fallbacks(), 1);
        assert_eq!(metrics.not_found(), 1);
    }

    #[test]
    fn test_fallback_rate() {
        let metrics = ResolutionMetrics::new();
        for _ in 0..3 {
            metrics.record(ResolutionSource::Exact);
        }
        metrics.record(ResolutionSource::DefaultLanguage);

        let report = metrics.report();
        assert_eq!(report.total_resolutions, 4);
        assert!((report.fallback_rate - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_format() {
        let metrics = ResolutionMetrics::new();
        metrics.record(ResolutionSource::Exact);
        metrics.record_not_found();

        let summary = metrics.report().summary();
        assert!(summary.contains("2 total"));
        assert!(summary.contains("1 exact"));
        assert!(summary.contains("1 not found"));
        assert!(summary.contains("50.0% fallback"));
    }

    #[test]
    fn test_concurrent_recording() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(ResolutionMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..100 {
                        metrics.record(ResolutionSource::DefaultLanguage);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.default_fallbacks(), 800);
    }
}
