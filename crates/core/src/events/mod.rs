//! Event system for resilience diagnostics
//!
//! Circuit breakers publish [`StateChange`] records through a [`StateEvents`]
//! emitter. Async consumers (dashboards, health checks) subscribe to the
//! broadcast channel; synchronous observers register a [`StateListener`].

mod emitter;
mod types;

pub use emitter::{ListenerId, StateEvents, StateListener};
pub use types::StateChange;
