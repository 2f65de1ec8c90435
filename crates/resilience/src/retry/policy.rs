//! The retry engine.

use super::backoff;
use super::config::RetryConfig;
use crate::classify::{FailureClassifier, TransientClassifier};
use crate::presets::OperationCategory;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tripwire_core::{duration_millis, error_chain, Error, Result};

/// Retries failed operations according to an immutable [`RetryConfig`].
///
/// The policy keeps no state between executions, so one instance can be
/// shared by any number of concurrent callers.
#[derive(Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    classifier: Arc<dyn FailureClassifier>,
}

impl RetryPolicy {
    /// Create a policy using the default transient classifier
    pub fn new(config: RetryConfig) -> Self {
        Self::with_classifier(config, Arc::new(TransientClassifier))
    }

    /// Create a policy with a custom failure classifier
    pub fn with_classifier(config: RetryConfig, classifier: Arc<dyn FailureClassifier>) -> Self {
        Self { config, classifier }
    }

    /// Named preset for an operation category
    pub fn for_category(category: OperationCategory) -> Self {
        Self::new(RetryConfig::for_category(category))
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Arc<dyn FailureClassifier> {
        &self.classifier
    }

    /// Delay to wait before retry number `retry_count` (1-based) after `error`.
    ///
    /// A positive delay recommended by the classifier wins; otherwise the
    /// configured backoff applies.
    pub fn next_delay(&self, retry_count: u32, error: &Error) -> Duration {
        if let Some(recommended) = self.classifier.retry_delay(error) {
            return recommended;
        }
        if self.config.use_exponential_backoff {
            backoff::exponential_delay(
                self.config.initial_delay,
                self.config.max_delay,
                retry_count,
                backoff::jitter(),
            )
        } else {
            self.config.initial_delay
        }
    }

    /// Execute an operation with retry logic
    pub async fn execute<F, Fut, T>(&self, name: &str, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute_cancellable(name, &CancellationToken::new(), operation)
            .await
    }

    /// Execute an operation with retry logic, stopping when `cancel` fires.
    ///
    /// Cancellation is checked before every attempt and interrupts the wait
    /// between attempts; it always surfaces as [`Error::Cancelled`] and never
    /// consumes a retry.
    pub async fn execute_cancellable<F, Fut, T>(
        &self,
        name: &str,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retry_count: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                debug!(source = name, retry_count, "Cancelled before attempt");
                return Err(Error::cancelled(name));
            }

            let error = match operation().await {
                Ok(value) => {
                    if retry_count > 0 {
                        info!(source = name, retry_count, "Operation succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if error.is_cancellation() {
                debug!(source = name, retry_count, "Operation cancelled");
                return Err(error);
            }

            if !self.classifier.is_retryable(&error) {
                error!(
                    source = name,
                    attempt = retry_count + 1,
                    error = %self.describe(&error),
                    "Operation failed with non-retryable error"
                );
                return Err(error);
            }

            if retry_count >= self.config.max_retries {
                error!(
                    source = name,
                    attempts = retry_count + 1,
                    error = %self.describe(&error),
                    "Operation failed after exhausting retries"
                );
                return Err(error);
            }

            retry_count += 1;
            let delay = self.next_delay(retry_count, &error);
            warn!(
                source = name,
                attempt = retry_count,
                max_attempts = self.config.max_attempts(),
                delay_ms = duration_millis(delay),
                error = %error,
                "Operation failed, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(source = name, retry_count, "Cancelled while waiting to retry");
                    return Err(Error::cancelled(name));
                }
                _ = sleep(delay) => {}
            }
        }
    }

    fn describe(&self, error: &Error) -> String {
        if self.config.include_error_chain {
            error_chain(error)
        } else {
            error.to_string()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
