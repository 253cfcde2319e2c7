//! Retry loop with exponential backoff.
//!
//! An operation is attempted, and on failure retried after
//! `min(base * 2^n, max)` until the policy's retry budget is spent. The
//! wait is a tokio sleep, so other tasks keep running meanwhile.

use std::future::Future;

use tokio::time::sleep;

use crate::observability::metrics;
use crate::resilience::backoff::RetryPolicy;
use crate::resilience::error::{BoxError, FailureCategory, ResilienceError};

/// Retries a single async operation according to a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct Retrier {
    policy: RetryPolicy,
    category: FailureCategory,
}

impl Retrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, category: FailureCategory::None }
    }

    /// Label attempts with the dependency they hit.
    pub fn with_category(mut self, category: FailureCategory) -> Self {
        self.category = category;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `op` until it succeeds or the retry budget is exhausted.
    ///
    /// Returns the first success. After `max_retries` failed retries the
    /// last error is returned wrapped in [`ResilienceError::RetriesExhausted`].
    pub async fn execute<F, Fut, T, E>(&self, mut op: F) -> Result<T, ResilienceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let mut retries = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let cause: BoxError = e.into();
                    if retries >= self.policy.max_retries() {
                        tracing::warn!(
                            category = %self.category,
                            retries,
                            error = %cause,
                            "Retry budget exhausted"
                        );
                        return Err(ResilienceError::exhausted(retries, cause));
                    }

                    let delay = self.policy.delay_for(retries);
                    retries += 1;
                    tracing::info!(
                        category = %self.category,
                        attempt = retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %cause,
                        "Attempt failed, retrying"
                    );
                    metrics::record_retry(self.category);
                    sleep(delay).await;
                }
            }
        }
    }
}
