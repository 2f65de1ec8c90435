//! Circuit breaker: a three-state gate around any async operation.
//!
//! ## Architecture
//!
//! - [`config`] - Threshold and recovery time ([`CircuitBreakerConfig`])
//! - [`types`] - Diagnostics snapshot ([`CircuitBreakerStats`])
//! - `transitions` - The state machine guarded by the breaker's mutex
//! - [`state`] - [`CircuitBreaker`] itself: admission, recording, notifications
//! - `tests` - Integration tests
//!
//! ## State Transitions
//!
//! ```text
//! Closed   → Open:     failure_count >= failure_threshold
//! Open     → HalfOpen: recovery_time elapsed, checked on the next admission
//! HalfOpen → Closed:   the single probe succeeds
//! HalfOpen → Open:     the probe fails (recovery timer restarts)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use tripwire_resilience::circuit::{CircuitBreaker, CircuitBreakerConfig};
//!
//! # async fn example() -> tripwire_core::Result<String> {
//! let cb = CircuitBreaker::new("prosim", CircuitBreakerConfig::default());
//!
//! let result = cb.execute(|| async {
//!     // Your operation here
//!     Ok("success".to_string())
//! }).await;
//! result
//! # }
//! ```

pub mod config;
pub mod state;
pub(crate) mod transitions;
pub mod types;

// Re-export public API
pub use config::CircuitBreakerConfig;
pub use state::CircuitBreaker;
pub use types::CircuitBreakerStats;
