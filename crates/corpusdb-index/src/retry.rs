//! Exponential backoff for transient failures.

use std::future::Future;
use std::time::Duration;

use corpusdb_core::error::Result;

/// Backoff schedule shared by retries and readiness polling.
///
/// `max_attempts` counts the first try, so `max_attempts = 3` means at
/// most two retries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay after `attempt` failures: base * 2^attempt.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(u32::MAX as usize) as u32);
        self.base_delay.saturating_mul(factor)
    }
}

/// Runs `operation` until it succeeds, returns a permanent error, or the
/// attempt budget is spent. Only errors marked transient are retried.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut run: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match run().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt + 1 < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
