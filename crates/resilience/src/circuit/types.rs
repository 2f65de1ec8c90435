//! Snapshot types for circuit breaker diagnostics.

use serde::Serialize;
use tripwire_core::CircuitState;

/// Point-in-time view of a circuit breaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircuitBreakerStats {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub failure_threshold: u32,
    pub recovery_time_ms: u64,
    /// Remaining time until an open breaker admits a probe
    pub open_remaining_ms: Option<u64>,
    pub probe_in_flight: bool,
    /// Calls admitted since creation
    pub admitted_calls: u64,
    /// Calls refused with a circuit-open error since creation
    pub rejected_calls: u64,
}
