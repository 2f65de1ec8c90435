//! Resilience patterns for calls to flaky dependencies.
//!
//! This crate wraps async operations in a circuit breaker and a retry loop
//! so that transient failures are retried and persistent ones stop being
//! attempted until the dependency has had time to recover.
//!
//! ## Key Components
//!
//! - **`circuit`**: The three-state circuit breaker with a single half-open
//!   probe and state change notifications.
//! - **`retry`**: Exponential backoff with jitter, classifier-driven retry
//!   decisions and cancellation.
//! - **`classify`**: Decides which failures are transient and whether they
//!   carry a recommended delay.
//! - **`strategy`**: A breaker placed outside a retry policy.
//! - **`presets`**: Built-in settings per operation category.
//! - **`registry`**: Named strategies shared across an application.

pub mod circuit;
pub mod classify;
pub mod presets;
pub mod registry;
pub mod retry;
pub mod strategy;

pub use circuit::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats};
pub use classify::{FailureClassifier, PredicateClassifier, TransientClassifier};
pub use presets::{preset, OperationCategory, ResiliencePreset};
pub use registry::StrategyRegistry;
pub use retry::{RetryConfig, RetryPolicy};
pub use strategy::ResilienceStrategy;
pub use tokio_util::sync::CancellationToken;
