//! 活动重试
//! Activity retry with exponential backoff

use flock_kernel::config::RetrySettings;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Exponential backoff between activity attempts, capped at `max_interval_ms`.
///
/// Jitter is a deterministic ±12.5% alternation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts (1 = no retry).
    pub max_attempts: usize,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub jitter: bool,
}

impl RetryConfig {
    /// Sleep before the given retry (0-indexed).
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exp = 1u64
            .checked_shl(attempt as u32)
            .and_then(|s| self.initial_interval_ms.checked_mul(s))
            .unwrap_or(self.max_interval_ms);
        let capped = exp.min(self.max_interval_ms);
        let ms = if self.jitter {
            let eighth = capped / 8;
            if attempt % 2 == 0 {
                capped.saturating_add(eighth).min(self.max_interval_ms)
            } else {
                capped.saturating_sub(eighth)
            }
        } else {
            capped
        };
        Duration::from_millis(ms)
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts as usize,
            initial_interval_ms: settings.initial_interval_ms,
            max_interval_ms: settings.max_interval_ms,
            jitter: settings.jitter,
        }
    }
}

/// Retry `f` up to `config.max_attempts` times while `is_retryable` holds.
pub async fn retry_with_policy<F, Fut, T, E>(
    config: &RetryConfig,
    is_retryable: impl Fn(&E) -> bool,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt + 1 < max_attempts && is_retryable(&e) => {
                let delay = config.delay_for(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
