//! Exponential backoff for transient model failures.

use super::ModelError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Hard upper bound on retries regardless of configuration.
pub const MAX_RETRY_CEILING: u32 = 5;

/// Retry policy for model requests.
///
/// Only [`ModelError::Transient`] failures are retried; the delay before
/// retry `n` (zero based) is `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// Create a policy; `max_retries` is clamped to [`MAX_RETRY_CEILING`].
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.min(MAX_RETRY_CEILING),
            base_delay,
        }
    }

    #[cfg(test)]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay to wait before retry number `attempt` (zero based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }

    /// Run `op`, retrying transient failures with backoff.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, ModelError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ModelError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "Model request failed ({}), retrying in {:?} (attempt {}/{})",
                        e,
                        delay,
                        attempt + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
