//! State transition logic for circuit breaker.
//!
//! [`BreakerState`] is the data guarded by the breaker's mutex. Every method
//! runs inside one critical section, so admission and the lazy Open→HalfOpen
//! flip are a single atomic step.

use super::config::CircuitBreakerConfig;
use std::time::Duration;
use tokio::time::Instant;
use tripwire_core::CircuitState;

/// A state change produced by one of the transition methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transition {
    pub previous: CircuitState,
    pub current: CircuitState,
    pub sequence: u64,
}

/// Ticket handed to an admitted call, identifying the state it was admitted under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Admission {
    pub generation: u64,
    pub probe: bool,
}

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admit {
    Granted(Admission),
    Rejected { retry_after: Option<Duration> },
}

#[derive(Debug)]
pub(crate) struct BreakerState {
    pub state: CircuitState,
    pub failure_count: u32,
    pub opened_at: Option<Instant>,
    pub probe_in_flight: bool,
    /// Bumped on every state change; completions from older generations are ignored
    pub generation: u64,
    pub sequence: u64,
    pub admitted_calls: u64,
    pub rejected_calls: u64,
}

impl BreakerState {
    pub fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            opened_at: None,
            probe_in_flight: false,
            generation: 0,
            sequence: 0,
            admitted_calls: 0,
            rejected_calls: 0,
        }
    }

    fn transition_to(&mut self, next: CircuitState) -> Option<Transition> {
        self.generation += 1;
        if self.state == next {
            return None;
        }
        let previous = self.state;
        self.state = next;
        self.sequence += 1;
        Some(Transition {
            previous,
            current: next,
            sequence: self.sequence,
        })
    }

    fn open(&mut self, now: Instant) -> Option<Transition> {
        self.opened_at = Some(now);
        self.probe_in_flight = false;
        self.transition_to(CircuitState::Open)
    }

    fn close(&mut self) -> Option<Transition> {
        self.failure_count = 0;
        self.opened_at = None;
        self.probe_in_flight = false;
        self.transition_to(CircuitState::Closed)
    }

    /// Time left before an open breaker becomes eligible for a probe
    pub fn open_remaining(&self, config: &CircuitBreakerConfig, now: Instant) -> Option<Duration> {
        if self.state != CircuitState::Open {
            return None;
        }
        let opened_at = self.opened_at?;
        let elapsed = now.saturating_duration_since(opened_at);
        config.recovery_time.checked_sub(elapsed).filter(|d| !d.is_zero())
    }

    /// Decide whether a call may proceed.
    pub fn admit(
        &mut self,
        config: &CircuitBreakerConfig,
        now: Instant,
    ) -> (Admit, Option<Transition>) {
        let mut transition = None;

        if self.state == CircuitState::Open {
            if let Some(remaining) = self.open_remaining(config, now) {
                self.rejected_calls += 1;
                return (
                    Admit::Rejected {
                        retry_after: Some(remaining),
                    },
                    None,
                );
            }
            transition = self.transition_to(CircuitState::HalfOpen);
        }

        let admission = match self.state {
            CircuitState::HalfOpen if self.probe_in_flight => {
                self.rejected_calls += 1;
                return (Admit::Rejected { retry_after: None }, transition);
            }
            CircuitState::HalfOpen => {
                // Each probe gets its own generation so an earlier probe's
                // release can never clear a later probe's flag.
                self.generation += 1;
                self.probe_in_flight = true;
                Admission {
                    generation: self.generation,
                    probe: true,
                }
            }
            _ => Admission {
                generation: self.generation,
                probe: false,
            },
        };

        self.admitted_calls += 1;
        (Admit::Granted(admission), transition)
    }

    /// Record a successful call
    pub fn record_success(&mut self, admission: Admission) -> Option<Transition> {
        if admission.generation != self.generation {
            return None;
        }
        if admission.probe && self.state == CircuitState::HalfOpen {
            return self.close();
        }
        None
    }

    /// Record a failed call
    pub fn record_failure(
        &mut self,
        admission: Admission,
        config: &CircuitBreakerConfig,
        now: Instant,
    ) -> Option<Transition> {
        if admission.generation != self.generation {
            return None;
        }
        match self.state {
            CircuitState::HalfOpen if admission.probe => self.open(now),
            CircuitState::Closed => {
                self.failure_count = self.failure_count.saturating_add(1);
                if self.failure_count >= config.effective_threshold() {
                    self.open(now)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Clear the probe flag if the probe identified by `admission` still holds it
    pub fn release_probe(&mut self, admission: Admission) {
        if admission.probe
            && admission.generation == self.generation
            && self.state == CircuitState::HalfOpen
        {
            self.probe_in_flight = false;
        }
    }

    /// Force the closed state
    pub fn reset(&mut self) -> Option<Transition> {
        self.close()
    }

    /// Force the open state; an already open breaker keeps its timer
    pub fn trip(&mut self, now: Instant) -> Option<Transition> {
        if self.state == CircuitState::Open {
            return None;
        }
        self.open(now)
    }
}
