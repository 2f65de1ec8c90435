//! Circuit breaker state management and execution logic.

use super::config::CircuitBreakerConfig;
use super::transitions::{Admission, Admit, BreakerState, Transition};
use super::types::CircuitBreakerStats;
use crate::presets::OperationCategory;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use tripwire_core::{
    duration_millis, CircuitState, Error, ListenerId, Result, StateChange, StateEvents,
    StateListener,
};

/// Circuit breaker implementation
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
    events: StateEvents,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: Mutex::new(BreakerState::new()),
            events: StateEvents::default(),
        }
    }

    /// Named preset for an operation category
    pub fn for_category(name: impl Into<String>, category: OperationCategory) -> Self {
        Self::new(name, CircuitBreakerConfig::for_category(category))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state as last recorded.
    ///
    /// An open breaker whose recovery time has elapsed still reports `Open`
    /// until the next admission check moves it to `HalfOpen`.
    pub fn state(&self) -> CircuitState {
        self.state.lock().state
    }

    /// Failures counted while closed
    pub fn failure_count(&self) -> u32 {
        self.state.lock().failure_count
    }

    /// Get current circuit breaker statistics
    pub fn stats(&self) -> CircuitBreakerStats {
        let now = Instant::now();
        let state = self.state.lock();
        CircuitBreakerStats {
            name: self.name.clone(),
            state: state.state,
            failure_count: state.failure_count,
            failure_threshold: self.config.effective_threshold(),
            recovery_time_ms: duration_millis(self.config.recovery_time),
            open_remaining_ms: state.open_remaining(&self.config, now).map(duration_millis),
            probe_in_flight: state.probe_in_flight,
            admitted_calls: state.admitted_calls,
            rejected_calls: state.rejected_calls,
        }
    }

    /// Receive state changes on a broadcast channel
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.events.subscribe()
    }

    /// Register a synchronous state change listener
    pub fn add_listener(&self, listener: Arc<dyn StateListener>) -> ListenerId {
        self.events.add_listener(listener)
    }

    /// Remove a previously registered listener
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.events.remove_listener(id)
    }

    /// Execute an operation through the circuit breaker.
    ///
    /// Fails with [`Error::CircuitOpen`] without invoking the operation when
    /// the circuit is open or a half-open probe is already running.
    /// Cancellation errors are passed through without being counted.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let admission = self.admit()?;
        let guard = ProbeGuard {
            breaker: self,
            admission,
        };

        let result = operation().await;

        match &result {
            Ok(_) => self.on_success(admission),
            Err(error) if error.is_cancellation() => {
                debug!(breaker = %self.name, "Call cancelled; not counted as a failure");
            }
            Err(error) => self.on_failure(admission, error),
        }

        drop(guard);
        result
    }

    /// Force the breaker closed and clear its counters
    pub fn reset(&self) {
        let changed = self.apply(|state| {
            let transition = state.reset();
            (transition.is_some(), transition)
        });
        if changed {
            info!(breaker = %self.name, "Circuit breaker reset");
        }
    }

    /// Force the breaker open.
    ///
    /// An already open breaker keeps its recovery timer.
    pub fn trip(&self) {
        let now = Instant::now();
        let changed = self.apply(|state| {
            let transition = state.trip(now);
            (transition.is_some(), transition)
        });
        if changed {
            warn!(breaker = %self.name, "Circuit breaker tripped manually");
        }
    }

    fn admit(&self) -> Result<Admission> {
        let now = Instant::now();
        let admit = self.apply(|state| state.admit(&self.config, now));

        match admit {
            Admit::Granted(admission) => {
                if admission.probe {
                    info!(breaker = %self.name, "Admitting half-open probe");
                }
                Ok(admission)
            }
            Admit::Rejected { retry_after } => {
                warn!(
                    breaker = %self.name,
                    retry_after_ms = retry_after.map(duration_millis),
                    "Circuit breaker rejected call"
                );
                Err(Error::circuit_open(&self.name, retry_after))
            }
        }
    }

    fn on_success(&self, admission: Admission) {
        self.apply(|state| ((), state.record_success(admission)));
    }

    fn on_failure(&self, admission: Admission, error: &Error) {
        let now = Instant::now();
        let failure_count = self.apply(|state| {
            let transition = state.record_failure(admission, &self.config, now);
            (state.failure_count, transition)
        });

        warn!(
            breaker = %self.name,
            failure_count,
            failure_threshold = self.config.effective_threshold(),
            probe = admission.probe,
            error = %error,
            "Circuit breaker recorded failure"
        );
    }

    /// Run `f` under the state lock and publish any resulting transition.
    ///
    /// The change is published while the lock is held, which fixes the order
    /// seen by subscribers and listeners; listeners run after it is released.
    fn apply<R>(&self, f: impl FnOnce(&mut BreakerState) -> (R, Option<Transition>)) -> R {
        let (result, change) = {
            let mut state = self.state.lock();
            let (result, transition) = f(&mut state);
            let change = transition.map(|t| {
                let change = StateChange::new(&self.name, t.previous, t.current, t.sequence);
                self.events.publish(&change);
                change
            });
            (result, change)
        };

        if let Some(change) = &change {
            self.log_transition(change);
        }
        self.events.dispatch();
        result
    }

    fn log_transition(&self, change: &StateChange) {
        match change.current {
            CircuitState::Open => warn!(
                breaker = %self.name,
                previous = %change.previous,
                "Circuit breaker opened"
            ),
            CircuitState::HalfOpen => info!(
                breaker = %self.name,
                "Circuit breaker entering half-open state"
            ),
            CircuitState::Closed => info!(
                breaker = %self.name,
                previous = %change.previous,
                "Circuit breaker closed"
            ),
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

/// Releases the half-open probe slot however `execute` exits, including when
/// the future is dropped or the operation panics.
struct ProbeGuard<'a> {
    breaker: &'a CircuitBreaker,
    admission: Admission,
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        if self.admission.probe {
            self.breaker.state.lock().release_probe(self.admission);
        }
    }
}
