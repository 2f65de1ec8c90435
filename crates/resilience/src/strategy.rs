//! A circuit breaker wrapped around a retry policy.

use crate::circuit::{CircuitBreaker, CircuitBreakerConfig};
use crate::presets::{self, OperationCategory, ResiliencePreset};
use crate::retry::{RetryConfig, RetryPolicy};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tripwire_core::Result;

/// Composes a [`CircuitBreaker`] with a [`RetryPolicy`].
///
/// The breaker sits outside the retry loop: each external call is admitted
/// once, retried inside that admission, and only the final outcome of the
/// retry sequence is recorded by the breaker.
#[derive(Debug, Clone)]
pub struct ResilienceStrategy {
    name: String,
    breaker: Arc<CircuitBreaker>,
    policy: RetryPolicy,
}

impl ResilienceStrategy {
    pub fn new(name: impl Into<String>, breaker: CircuitBreakerConfig, retry: RetryConfig) -> Self {
        let name = name.into();
        let breaker = Arc::new(CircuitBreaker::new(name.clone(), breaker));
        Self::with_shared_breaker(name, breaker, RetryPolicy::new(retry))
    }

    /// Build a strategy around an existing breaker, e.g. one shared by several
    /// strategies that guard the same dependency
    pub fn with_shared_breaker(
        name: impl Into<String>,
        breaker: Arc<CircuitBreaker>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            breaker,
            policy,
        }
    }

    pub fn for_category(name: impl Into<String>, category: OperationCategory) -> Self {
        Self::from_preset(name, &presets::preset(category))
    }

    pub fn from_preset(name: impl Into<String>, preset: &ResiliencePreset) -> Self {
        Self::new(name, preset.breaker.clone(), preset.retry.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an operation through the breaker and the retry policy
    pub async fn execute<F, Fut, T>(&self, name: &str, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        debug!(strategy = %self.name, source = name, "Executing with resilience strategy");
        self.breaker
            .execute(|| self.policy.execute(name, operation))
            .await
    }

    /// Like [`execute`](Self::execute), stopping retries when `cancel` fires.
    ///
    /// A cancelled call is never recorded as a breaker failure.
    pub async fn execute_cancellable<F, Fut, T>(
        &self,
        name: &str,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        debug!(strategy = %self.name, source = name, "Executing with resilience strategy");
        self.breaker
            .execute(|| self.policy.execute_cancellable(name, cancel, operation))
            .await
    }

    /// Reset the circuit breaker; the retry policy holds no state
    pub fn reset(&self) {
        self.breaker.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tripwire_core::{CircuitState, Error};

    fn strategy(threshold: u32, max_retries: u32) -> ResilienceStrategy {
        ResilienceStrategy::new(
            "test",
            CircuitBreakerConfig::new(threshold, Duration::from_secs(60)),
            RetryConfig {
                max_retries,
                initial_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(50),
                use_exponential_backoff: true,
                include_error_chain: true,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_count_as_one_failure() {
        let strategy = strategy(1, 3);
        let calls = AtomicU32::new(0);

        let result: Result<()> = strategy
            .execute("read", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::prosim("read", "unreachable"))
            })
            .await;

        assert!(matches!(result, Err(Error::Connection { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(strategy.breaker().state(), CircuitState::Open);

        let result: Result<()> = strategy
            .execute("read", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert!(result.unwrap_err().is_circuit_open());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_retries_records_no_failure() {
        let strategy = strategy(1, 3);
        let calls = AtomicU32::new(0);

        let result = strategy
            .execute("read", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::gsx("read", "busy"))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(strategy.breaker().state(), CircuitState::Closed);
        assert_eq!(strategy.breaker().failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_failure_is_recorded_once() {
        let strategy = strategy(2, 3);
        let calls = AtomicU32::new(0);

        let result: Result<()> = strategy
            .execute("parse", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::operation("parse", "bad payload"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(strategy.breaker().failure_count(), 1);
        assert_eq!(strategy.breaker().state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_is_not_recorded() {
        let strategy = strategy(1, 3);
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let result: Result<()> = strategy
            .execute_cancellable("read", &cancel, || {
                calls.fetch_add(1, Ordering::SeqCst);
                cancel.cancel();
                async { Err(Error::network("read", "reset")) }
            })
            .await;

        assert!(matches!(result, Err(Error::Cancelled { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(strategy.breaker().state(), CircuitState::Closed);
        assert_eq!(strategy.breaker().failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_breaker_sees_failures_from_both_strategies() {
        let breaker = Arc::new(CircuitBreaker::new(
            "gsx",
            CircuitBreakerConfig::new(2, Duration::from_secs(60)),
        ));
        let policy = RetryPolicy::new(RetryConfig::no_retry());
        let a = ResilienceStrategy::with_shared_breaker("a", Arc::clone(&breaker), policy.clone());
        let b = ResilienceStrategy::with_shared_breaker("b", Arc::clone(&breaker), policy);

        let _: Result<()> = a.execute("a", || async { Err(Error::gsx("a", "down")) }).await;
        let _: Result<()> = b.execute("b", || async { Err(Error::gsx("b", "down")) }).await;

        assert_eq!(breaker.state(), CircuitState::Open);
        a.reset();
        assert_eq!(b.breaker().state(), CircuitState::Closed);
    }

    #[test]
    fn test_for_category_uses_preset() {
        let strategy = ResilienceStrategy::for_category("prosim", OperationCategory::ProSim);
        assert_eq!(strategy.name(), "prosim");
        assert_eq!(strategy.breaker().name(), "prosim");
        assert_eq!(strategy.policy().config().max_retries, 5);
        assert_eq!(strategy.breaker().config().failure_threshold, 3);
    }
}
