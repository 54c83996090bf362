//! Exponential backoff for outbound calls, used by the social feed sync.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total tries, the first call included. Never below one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Four tries against the Graph API, waiting 2s, 4s, then 8s.
    pub fn social_feed() -> Self {
        Self::new(4, Duration::from_secs(2)).with_max_delay(Duration::from_secs(10))
    }

    /// Wait before try number `attempt`, counting from zero.
    pub(crate) fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let Some(retry) = attempt.checked_sub(1) else {
            return Duration::ZERO;
        };
        let scale = self.backoff_multiplier.powi(retry as i32);
        let millis = self.initial_delay.as_millis() as f64 * scale;
        Duration::from_millis(millis as u64).min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::social_feed()
    }
}

/// Run `operation` until it succeeds, `should_retry` rejects its error, or
/// the attempts are used up. The last error is returned as is.
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let wait = config.delay_for_attempt(attempt);
        if !wait.is_zero() {
            debug!("{}: waiting {:?} before try {}/{}", operation_name, wait, attempt + 1, attempts);
            sleep(wait).await;
        }

        let error = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{}: recovered on try {}", operation_name, attempt + 1);
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        attempt += 1;
        if !should_retry(&error) {
            debug!("{}: giving up on permanent error: {}", operation_name, error);
            return Err(error);
        }
        if attempt >= attempts {
            warn!("{}: failed after {} tries: {}", operation_name, attempts, error);
            return Err(error);
        }
        warn!("{}: try {}/{} failed: {}", operation_name, attempt, attempts, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    // ==================== RetryConfig Tests ====================

    #[test]
    fn test_social_feed_preset() {
        let config = RetryConfig::social_feed();
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.initial_delay, Duration::from_secs(2));
        assert_eq!(config.max_delay, Duration::from_secs(10));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(8));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryConfig::new(0, Duration::from_millis(1)).max_attempts, 1);
    }

    #[test]
    fn test_delay_calculation() {
        let config = RetryConfig::new(4, Duration::from_secs(1));

        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(4));
    }

    #[test]
    fn test_delay_respects_max() {
        let config = RetryConfig::new(10, Duration::from_secs(1)).with_max_delay(Duration::from_secs(3));
        assert_eq!(config.delay_for_attempt(4), Duration::from_secs(3));
    }

    #[test]
    fn test_flat_backoff() {
        let config = RetryConfig::new(5, Duration::from_millis(250)).with_backoff_multiplier(1.0);
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(250));
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(250));
    }

    // ==================== with_retry_if Tests ====================

    /// Fails `failures` times with `error`, then yields 42. Returns the
    /// outcome and how many calls were made.
    async fn flaky(config: &RetryConfig, failures: u32, error: &'static str) -> (Result<u32, &'static str>, u32) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = with_retry_if(
            config,
            "feed",
            || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < failures {
                        Err(error)
                    } else {
                        Ok(42)
                    }
                }
            },
            |e: &&str| !e.contains("400"),
        )
        .await;

        (result, calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let config = RetryConfig::new(3, Duration::from_millis(10));
        assert_eq!(flaky(&config, 0, "server error 500").await, (Ok(42), 1));
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let config = RetryConfig::new(3, Duration::from_millis(10));
        assert_eq!(flaky(&config, 2, "server error 500").await, (Ok(42), 3));
    }

    #[tokio::test]
    async fn test_all_attempts_fail() {
        let config = RetryConfig::new(3, Duration::from_millis(10));
        assert_eq!(
            flaky(&config, 10, "server error 500").await,
            (Err("server error 500"), 3)
        );
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_fast() {
        let config = RetryConfig::new(3, Duration::from_millis(10));
        assert_eq!(
            flaky(&config, 10, "client error 400").await,
            (Err("client error 400"), 1)
        );
    }

    #[tokio::test]
    async fn test_single_attempt_never_waits() {
        let config = RetryConfig::new(1, Duration::from_secs(60));
        let started = std::time::Instant::now();
        assert_eq!(
            flaky(&config, 10, "server error 500").await,
            (Err("server error 500"), 1)
        );
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
