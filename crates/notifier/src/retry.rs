//! Bounded retry for rate-limited remote calls.
//!
//! The delay before attempt `n + 1` is the larger of the server's retry hint and
//! `base_delay * 2^(n - 1)`, capped at `max_delay`. When every attempt is rate
//! limited the caller gets `AppError::RateLimitExhausted`.

use std::future::Future;
use std::time::Duration;

use relay_common::error::AppError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }

    pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    /// Delay after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32, hint: Duration) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self.base_delay.saturating_mul(1u32 << exponent);
        backoff.max(hint).min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails with a non-rate-limit error, or the
    /// attempt budget is spent.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Err(AppError::RateLimited { retry_after_secs }) => {
                    if attempt >= self.max_attempts {
                        tracing::warn!(
                            call = label,
                            attempts = attempt,
                            "Rate limit persisted, giving up"
                        );
                        return Err(AppError::RateLimitExhausted { attempts: attempt });
                    }

                    let delay = self.delay_for(attempt, Duration::from_secs(retry_after_secs));
                    tracing::info!(
                        call = label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limit hit, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5)
    }
}
