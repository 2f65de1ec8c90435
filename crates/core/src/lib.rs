//! Core domain types, errors, and events for the `tripwire` resilience engine.
//!
//! ## Key Components
//!
//! - **`errors`**: Defines the primary `Error` enum and `Result` type alias,
//!   including the circuit-open and cancellation kinds surfaced by the engine
//!   and the transient connection failures it knows how to retry.
//! - **`events`**: State change records and the emitter that fans them out.
//! - **`types`**: Shared enums such as `CircuitState` and `ConnectionTarget`.
//! - **`constants`**: Environment variable names and engine-wide bounds.

pub mod constants;
pub mod errors;
pub mod events;
pub mod types;

pub use self::{
    constants::*,
    errors::{causes, error_chain, BoxError, Error, Result, ResultExt},
    events::{ListenerId, StateChange, StateEvents, StateListener},
    types::*,
};
