//! Resolved resilience settings and their on-disk representation.

use crate::validation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tripwire_core::{duration_millis, Result};
use tripwire_resilience::{
    preset, CircuitBreakerConfig, OperationCategory, ResiliencePreset, ResilienceStrategy,
    RetryConfig,
};

/// Overrides for one operation category.
///
/// Every field is optional; unset fields keep the built-in preset value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_exponential_backoff: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_error_chain: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_time_ms: Option<u64>,
}

impl CategorySettings {
    /// Fully populated settings describing `preset`
    pub fn from_preset(preset: &ResiliencePreset) -> Self {
        Self {
            max_retries: Some(preset.retry.max_retries),
            initial_delay_ms: Some(duration_millis(preset.retry.initial_delay)),
            max_delay_ms: Some(duration_millis(preset.retry.max_delay)),
            use_exponential_backoff: Some(preset.retry.use_exponential_backoff),
            include_error_chain: Some(preset.retry.include_error_chain),
            failure_threshold: Some(preset.breaker.failure_threshold),
            recovery_time_ms: Some(duration_millis(preset.breaker.recovery_time)),
        }
    }

    /// Apply the set fields on top of `base`
    pub fn apply(&self, base: &ResiliencePreset) -> ResiliencePreset {
        let retry = RetryConfig {
            max_retries: self.max_retries.unwrap_or(base.retry.max_retries),
            initial_delay: self
                .initial_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(base.retry.initial_delay),
            max_delay: self
                .max_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(base.retry.max_delay),
            use_exponential_backoff: self
                .use_exponential_backoff
                .unwrap_or(base.retry.use_exponential_backoff),
            include_error_chain: self
                .include_error_chain
                .unwrap_or(base.retry.include_error_chain),
        };
        let breaker = CircuitBreakerConfig {
            failure_threshold: self
                .failure_threshold
                .unwrap_or(base.breaker.failure_threshold),
            recovery_time: self
                .recovery_time_ms
                .map(Duration::from_millis)
                .unwrap_or(base.breaker.recovery_time),
        };
        ResiliencePreset { retry, breaker }
    }

    /// Overlay `other`'s set fields onto `self`
    pub fn merge(&mut self, other: &CategorySettings) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        take!(
            max_retries,
            initial_delay_ms,
            max_delay_ms,
            use_exponential_backoff,
            include_error_chain,
            failure_threshold,
            recovery_time_ms
        );
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Settings file layout: one optional section per category
pub type SettingsFile = BTreeMap<OperationCategory, CategorySettings>;

/// Validated, immutable settings for every operation category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResilienceSettings {
    presets: BTreeMap<OperationCategory, ResiliencePreset>,
}

impl ResilienceSettings {
    /// Resolve `overrides` against the built-in presets and validate the result
    pub fn from_overrides(overrides: &SettingsFile) -> Result<Self> {
        let mut presets = BTreeMap::new();
        for category in OperationCategory::ALL {
            let builtin = preset(category);
            let resolved = match overrides.get(&category) {
                Some(settings) => settings.apply(&builtin),
                None => builtin,
            };
            validation::validate_preset(category, &resolved)?;
            presets.insert(category, resolved);
        }
        Ok(Self { presets })
    }

    pub fn preset(&self, category: OperationCategory) -> ResiliencePreset {
        self.presets
            .get(&category)
            .cloned()
            .unwrap_or_else(|| preset(category))
    }

    pub fn retry_config(&self, category: OperationCategory) -> RetryConfig {
        self.preset(category).retry
    }

    pub fn breaker_config(&self, category: OperationCategory) -> CircuitBreakerConfig {
        self.preset(category).breaker
    }

    /// Build a strategy named `name` from the settings for `category`
    pub fn strategy(&self, name: impl Into<String>, category: OperationCategory) -> ResilienceStrategy {
        ResilienceStrategy::from_preset(name, &self.preset(category))
    }

    /// Fully populated view of every category, suitable for display
    pub fn effective(&self) -> SettingsFile {
        OperationCategory::ALL
            .into_iter()
            .map(|category| (category, CategorySettings::from_preset(&self.preset(category))))
            .collect()
    }
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        Self {
            presets: OperationCategory::ALL
                .into_iter()
                .map(|category| (category, preset(category)))
                .collect(),
        }
    }
}
