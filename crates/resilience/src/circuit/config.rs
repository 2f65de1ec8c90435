//! Configuration for circuit breaker behavior.

use crate::presets::{self, OperationCategory};
use std::time::Duration;

/// Default number of failures before the circuit opens
const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default time an open circuit waits before allowing a probe (60s)
const DEFAULT_RECOVERY_TIME: Duration = Duration::from_secs(60);

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Number of failures before opening the circuit (values below 1 act as 1)
    pub failure_threshold: u32,
    /// Duration to wait in the open state before admitting a half-open probe
    pub recovery_time: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_time: DEFAULT_RECOVERY_TIME,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new(failure_threshold: u32, recovery_time: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_time,
        }
    }

    /// Named preset for an operation category
    pub fn for_category(category: OperationCategory) -> Self {
        presets::preset(category).breaker
    }

    /// Threshold actually enforced by the breaker
    pub(crate) fn effective_threshold(&self) -> u32 {
        self.failure_threshold.max(1)
    }
}
