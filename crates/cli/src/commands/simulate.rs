//! Drive a scripted flaky operation through a resilience strategy.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::info;
use tripwire_config::ResilienceSettings;
use tripwire_core::{CircuitState, ConnectionTarget, Error, Result, StateChange};
use tripwire_resilience::{OperationCategory, ResiliencePreset, ResilienceStrategy};

const OPERATION: &str = "simulated_call";

/// How the scripted operation misbehaves
#[derive(Debug, Clone, Copy, Default)]
pub struct FailurePlan {
    /// Invocations, counted across all calls, that fail before the first success
    pub failures: u32,
    /// Fail with a non-transient error
    pub permanent: bool,
}

/// An operation that fails according to a [`FailurePlan`]
#[derive(Debug)]
pub struct ScriptedOperation {
    plan: FailurePlan,
    target: ConnectionTarget,
    invocations: AtomicU32,
}

impl ScriptedOperation {
    pub fn new(plan: FailurePlan, target: ConnectionTarget) -> Self {
        Self {
            plan,
            target,
            invocations: AtomicU32::new(0),
        }
    }

    pub fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::SeqCst)
    }

    /// One invocation; returns its 1-based number on success
    pub async fn invoke(&self) -> Result<u32> {
        let n = self.invocations.fetch_add(1, Ordering::SeqCst) + 1;
        if n > self.plan.failures {
            return Ok(n);
        }
        if self.plan.permanent {
            Err(Error::operation(OPERATION, format!("scripted failure #{n}")))
        } else {
            Err(Error::connection(
                self.target,
                OPERATION,
                format!("scripted failure #{n}"),
            ))
        }
    }
}

/// What happened to one external call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Succeeded { attempts: u32 },
    Failed { attempts: u32, error: String },
    Rejected { retry_after: Option<Duration> },
}

impl fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallOutcome::Succeeded { attempts } => write!(f, "ok after {attempts} attempt(s)"),
            CallOutcome::Failed { attempts, error } => {
                write!(f, "failed after {attempts} attempt(s): {error}")
            }
            CallOutcome::Rejected {
                retry_after: Some(delay),
            } => write!(f, "rejected, circuit open for {}ms", delay.as_millis()),
            CallOutcome::Rejected { retry_after: None } => {
                write!(f, "rejected, probe in flight")
            }
        }
    }
}

#[derive(Debug)]
pub struct SimulationReport {
    pub outcomes: Vec<CallOutcome>,
    pub transitions: Vec<StateChange>,
    pub invocations: u32,
    pub final_state: CircuitState,
}

/// Connection target used for scripted transient failures
pub fn target_for(category: OperationCategory) -> ConnectionTarget {
    match category {
        OperationCategory::Simulator => ConnectionTarget::Simulator,
        OperationCategory::ProSim => ConnectionTarget::ProSim,
        OperationCategory::Gsx => ConnectionTarget::Gsx,
        OperationCategory::Network | OperationCategory::Default => ConnectionTarget::Network,
    }
}

/// Make `calls` external calls through `strategy`
pub async fn run(
    strategy: &ResilienceStrategy,
    operation: &ScriptedOperation,
    calls: u32,
) -> SimulationReport {
    let mut changes = strategy.breaker().subscribe();
    let mut outcomes = Vec::with_capacity(calls as usize);

    for _ in 0..calls {
        let before = operation.invocations();
        let result = strategy.execute(OPERATION, || operation.invoke()).await;
        let attempts = operation.invocations() - before;

        outcomes.push(match result {
            Ok(_) => CallOutcome::Succeeded { attempts },
            Err(Error::CircuitOpen { retry_after, .. }) => CallOutcome::Rejected { retry_after },
            Err(e) => CallOutcome::Failed {
                attempts,
                error: e.to_string(),
            },
        });
    }

    SimulationReport {
        outcomes,
        transitions: std::iter::from_fn(|| changes.try_recv().ok()).collect(),
        invocations: operation.invocations(),
        final_state: strategy.breaker().state(),
    }
}

pub async fn execute(
    settings: &ResilienceSettings,
    category: OperationCategory,
    calls: u32,
    plan: FailurePlan,
    no_delay: bool,
) -> eyre::Result<()> {
    let mut preset: ResiliencePreset = settings.preset(category);
    if no_delay {
        preset.retry.initial_delay = Duration::ZERO;
        preset.retry.max_delay = Duration::ZERO;
    }

    let strategy = ResilienceStrategy::from_preset(category.as_str(), &preset);
    let operation = ScriptedOperation::new(plan, target_for(category));

    info!(
        category = %category,
        calls,
        failures = plan.failures,
        permanent = plan.permanent,
        "Starting simulation"
    );

    let report = run(&strategy, &operation, calls).await;

    for (i, outcome) in report.outcomes.iter().enumerate() {
        println!("call {}: {outcome}", i + 1);
    }
    for change in &report.transitions {
        println!(
            "state #{}: {} -> {}",
            change.sequence, change.previous, change.current
        );
    }
    println!(
        "total invocations: {}, final state: {}",
        report.invocations, report.final_state
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripwire_resilience::{CircuitBreakerConfig, RetryConfig};

    fn strategy(threshold: u32, max_retries: u32) -> ResilienceStrategy {
        ResilienceStrategy::new(
            "sim",
            CircuitBreakerConfig::new(threshold, Duration::from_secs(60)),
            RetryConfig {
                max_retries,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
                use_exponential_backoff: false,
                include_error_chain: true,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried_within_a_call() {
        let operation = ScriptedOperation::new(
            FailurePlan {
                failures: 2,
                permanent: false,
            },
            ConnectionTarget::ProSim,
        );

        let report = run(&strategy(3, 3), &operation, 2).await;

        assert_eq!(
            report.outcomes,
            vec![
                CallOutcome::Succeeded { attempts: 3 },
                CallOutcome::Succeeded { attempts: 1 },
            ]
        );
        assert!(report.transitions.is_empty());
        assert_eq!(report.final_state, CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failures_open_the_breaker() {
        let operation = ScriptedOperation::new(
            FailurePlan {
                failures: 10,
                permanent: true,
            },
            ConnectionTarget::Gsx,
        );

        let report = run(&strategy(2, 3), &operation, 3).await;

        assert!(matches!(report.outcomes[0], CallOutcome::Failed { attempts: 1, .. }));
        assert!(matches!(report.outcomes[1], CallOutcome::Failed { attempts: 1, .. }));
        assert!(matches!(
            report.outcomes[2],
            CallOutcome::Rejected {
                retry_after: Some(_)
            }
        ));
        assert_eq!(report.invocations, 2);
        assert_eq!(report.transitions.len(), 1);
        assert_eq!(report.final_state, CircuitState::Open);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            CallOutcome::Succeeded { attempts: 2 }.to_string(),
            "ok after 2 attempt(s)"
        );
        assert_eq!(
            CallOutcome::Rejected { retry_after: None }.to_string(),
            "rejected, probe in flight"
        );
    }
}
