//! Named resilience presets per operation category.

use crate::circuit::CircuitBreakerConfig;
use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tripwire_core::Error;

/// The kind of dependency an operation talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationCategory {
    Simulator,
    ProSim,
    Gsx,
    Network,
    Default,
}

impl OperationCategory {
    pub const ALL: [OperationCategory; 5] = [
        OperationCategory::Simulator,
        OperationCategory::ProSim,
        OperationCategory::Gsx,
        OperationCategory::Network,
        OperationCategory::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationCategory::Simulator => "simulator",
            OperationCategory::ProSim => "prosim",
            OperationCategory::Gsx => "gsx",
            OperationCategory::Network => "network",
            OperationCategory::Default => "default",
        }
    }
}

impl fmt::Display for OperationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| {
                Error::configuration(format!(
                    "unknown operation category '{s}' (expected one of: simulator, prosim, gsx, network, default)"
                ))
            })
    }
}

/// Retry and breaker settings that belong together
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResiliencePreset {
    pub retry: RetryConfig,
    pub breaker: CircuitBreakerConfig,
}

fn retry(max_retries: u32, initial_ms: u64, max_ms: u64) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_delay: Duration::from_millis(initial_ms),
        max_delay: Duration::from_millis(max_ms),
        ..RetryConfig::default()
    }
}

fn breaker(failure_threshold: u32, recovery_secs: u64) -> CircuitBreakerConfig {
    CircuitBreakerConfig::new(failure_threshold, Duration::from_secs(recovery_secs))
}

/// Built-in preset for `category`
pub fn preset(category: OperationCategory) -> ResiliencePreset {
    match category {
        OperationCategory::Simulator => ResiliencePreset {
            retry: retry(3, 500, 5_000),
            breaker: breaker(5, 30),
        },
        OperationCategory::ProSim => ResiliencePreset {
            retry: retry(5, 1_000, 10_000),
            breaker: breaker(3, 60),
        },
        OperationCategory::Gsx => ResiliencePreset {
            retry: retry(3, 2_000, 15_000),
            breaker: breaker(3, 60),
        },
        OperationCategory::Network => ResiliencePreset {
            retry: retry(4, 1_000, 30_000),
            breaker: breaker(5, 30),
        },
        OperationCategory::Default => ResiliencePreset::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OperationCategory::Simulator, 3, 500, 5)]
    #[case(OperationCategory::ProSim, 5, 1_000, 3)]
    #[case(OperationCategory::Gsx, 3, 2_000, 3)]
    #[case(OperationCategory::Network, 4, 1_000, 5)]
    #[case(OperationCategory::Default, 3, 1_000, 5)]
    fn test_preset_values(
        #[case] category: OperationCategory,
        #[case] max_retries: u32,
        #[case] initial_ms: u64,
        #[case] threshold: u32,
    ) {
        let preset = preset(category);
        assert_eq!(preset.retry.max_retries, max_retries);
        assert_eq!(preset.retry.initial_delay, Duration::from_millis(initial_ms));
        assert_eq!(preset.breaker.failure_threshold, threshold);
        assert!(preset.retry.max_delay >= preset.retry.initial_delay);
        assert!(preset.retry.use_exponential_backoff);
    }

    #[rstest]
    #[case("simulator", OperationCategory::Simulator)]
    #[case("ProSim", OperationCategory::ProSim)]
    #[case(" GSX ", OperationCategory::Gsx)]
    #[case("network", OperationCategory::Network)]
    #[case("default", OperationCategory::Default)]
    fn test_parse_category(#[case] input: &str, #[case] expected: OperationCategory) {
        assert_eq!(input.parse::<OperationCategory>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_category_is_configuration_error() {
        let err = "mainframe".parse::<OperationCategory>().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("mainframe"));
    }

    #[test]
    fn test_display_round_trips() {
        for category in OperationCategory::ALL {
            assert_eq!(category.to_string().parse::<OperationCategory>().unwrap(), category);
        }
    }
}
