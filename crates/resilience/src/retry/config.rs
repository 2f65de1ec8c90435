//! Tuning parameters for the retry engine.

use crate::presets::{self, OperationCategory};
use std::time::Duration;

/// Default maximum number of retry attempts
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry (1s)
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Default maximum delay between retries (30s)
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Configuration for retry behavior
///
/// Plain value; it becomes immutable once handed to a
/// [`RetryPolicy`](super::RetryPolicy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt
    pub max_retries: u32,
    /// Delay before the first retry, and the fixed delay without backoff
    pub initial_delay: Duration,
    /// Upper bound for computed backoff delays
    pub max_delay: Duration,
    /// Double the delay on every retry (with jitter) instead of a fixed delay
    pub use_exponential_backoff: bool,
    /// Log the full cause chain when the retry sequence gives up
    pub include_error_chain: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            use_exponential_backoff: true,
            include_error_chain: true,
        }
    }
}

impl RetryConfig {
    /// Named preset for an operation category
    pub fn for_category(category: OperationCategory) -> Self {
        presets::preset(category).retry
    }

    /// A config that never retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Total number of attempts allowed, including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}
