//! Bounded retry for GitLab network calls

use std::{future::Future, time::Duration};

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::error::{ClientError, Result};

/// Retry schedule: exponential backoff, capped by attempts and by total time.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Factor applied to the delay after each failed attempt
    pub multiplier: u32,
    /// No attempt is started after this much time has passed
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            multiplier: 2,
            max_elapsed: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    #[cfg(test)]
    pub fn none() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or
    /// the budget runs out. Exhaustion wraps the last error in
    /// [`ClientError::RetriesExhausted`].
    pub async fn run<T, F, Fut>(&self, name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let mut delay = self.initial_delay;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            let wait = error.retry_after().unwrap_or(delay);
            let out_of_time = started
                .elapsed()
                .checked_add(wait)
                .map_or(true, |finish| finish > self.max_elapsed);
            if attempt >= self.max_attempts || out_of_time {
                warn!(operation = name, attempts = attempt, error = %error, "Giving up on GitLab request");
                return Err(ClientError::RetriesExhausted { attempts: attempt, last: Box::new(error) });
            }

            debug!(operation = name, attempt, wait = ?wait, error = %error, "Retrying GitLab request");
            sleep(wait).await;
            delay = delay.saturating_mul(self.multiplier);
        }
    }
}
