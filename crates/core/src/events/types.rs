//! Event payloads published by resilience components

use crate::types::CircuitState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A circuit breaker changed state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    /// Name of the breaker that changed
    pub breaker: String,
    /// State before the transition
    pub previous: CircuitState,
    /// State after the transition
    pub current: CircuitState,
    /// Per-breaker sequence number, strictly increasing in transition order
    pub sequence: u64,
    /// Wall-clock time of the transition
    pub timestamp: DateTime<Utc>,
}

impl StateChange {
    pub fn new(
        breaker: impl Into<String>,
        previous: CircuitState,
        current: CircuitState,
        sequence: u64,
    ) -> Self {
        Self {
            breaker: breaker.into(),
            previous,
            current,
            sequence,
            timestamp: Utc::now(),
        }
    }
}
