use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Exponential backoff schedule for startup connections
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    /// Scale each delay into 50-100% of its value
    pub use_jitter: bool,
}

impl RetryConfig {
    /// 3 retries, 100ms doubling up to 5s, jitter on
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    pub fn with_max_delay(mut self, delay_ms: u64) -> Self {
        self.max_delay_ms = delay_ms;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    /// Total attempts including the first one
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Sleep before each retry, in order; yields `max_retries` items.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..=self.max_retries).map(move |retry| {
            let factor = self.backoff_multiplier.powi(retry as i32 - 1);
            let base = ((self.initial_delay_ms as f64 * factor) as u64).min(self.max_delay_ms);
            let ms = if self.use_jitter { jitter(base) } else { base };
            Duration::from_millis(ms)
        })
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

/// Run `operation` until it succeeds or the schedule in `config` runs out;
/// the last error is returned.
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, config: RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delays = config.delays();
    let mut attempt = 1;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Succeeded after retrying");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let Some(delay) = delays.next() else {
            warn!(attempts = attempt, error = %err, "Giving up");
            return Err(err);
        };

        debug!(
            attempt,
            of = config.attempts(),
            error = %err,
            retry_in_ms = delay.as_millis() as u64,
            "Attempt failed"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

fn jitter(delay_ms: u64) -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let percent = 50 + RandomState::new().hash_one(std::time::SystemTime::now()) % 51;
    delay_ms * percent / 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting(fail_first: u32, calls: Arc<AtomicU32>) -> impl FnMut() -> std::future::Ready<Result<&'static str, &'static str>> {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if n < fail_first { Err("connection refused") } else { Ok("connected") })
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let config = RetryConfig::new().with_initial_delay(5).without_jitter();

        let result = retry_with_backoff(counting(2, calls.clone()), config).await;

        assert_eq!(result, Ok("connected"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_with_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let config = RetryConfig::new()
            .with_max_retries(2)
            .with_initial_delay(5)
            .without_jitter();

        let result = retry_with_backoff(counting(u32::MAX, calls.clone()), config).await;

        assert_eq!(result, Err("connection refused"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retries_means_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let config = RetryConfig::new().with_max_retries(0);

        let result = retry_with_backoff(counting(1, calls.clone()), config).await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delays_double_and_cap() {
        let config = RetryConfig::new()
            .with_max_retries(4)
            .with_initial_delay(100)
            .with_max_delay(350)
            .without_jitter();
        let delays: Vec<u128> = config.delays().map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 350, 350]);
        assert_eq!(config.attempts(), 5);
    }

    #[test]
    fn test_jitter_stays_in_range() {
        for _ in 0..10 {
            assert!((500..=1000).contains(&jitter(1000)));
        }
    }
}
