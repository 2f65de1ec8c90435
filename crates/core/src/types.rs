//! Shared domain types used across the tripwire crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Circuit is closed - requests pass through normally
    Closed,
    /// Circuit is open - requests fail immediately
    Open,
    /// Circuit is half-open - a single probe request tests recovery
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// External systems whose connection failures are considered transient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionTarget {
    /// The flight simulator itself
    Simulator,
    /// ProSim aircraft systems
    ProSim,
    /// GSX ground services
    Gsx,
    /// Generic network endpoints
    Network,
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionTarget::Simulator => write!(f, "Simulator"),
            ConnectionTarget::ProSim => write!(f, "ProSim"),
            ConnectionTarget::Gsx => write!(f, "GSX"),
            ConnectionTarget::Network => write!(f, "Network"),
        }
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
