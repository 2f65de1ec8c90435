//! Semantic checks on resolved settings

use tripwire_core::{Error, Result};
use tripwire_resilience::{OperationCategory, ResiliencePreset};

/// Validates that a resolved preset is usable
pub fn validate_preset(category: OperationCategory, preset: &ResiliencePreset) -> Result<()> {
    if preset.breaker.failure_threshold == 0 {
        return Err(Error::configuration(format!(
            "{category}: failure_threshold must be at least 1"
        )));
    }

    if preset.breaker.recovery_time.is_zero() {
        return Err(Error::configuration(format!(
            "{category}: recovery_time_ms must be greater than 0"
        )));
    }

    if preset.retry.max_delay < preset.retry.initial_delay {
        return Err(Error::configuration(format!(
            "{category}: max_delay_ms ({}) must not be less than initial_delay_ms ({})",
            preset.retry.max_delay.as_millis(),
            preset.retry.initial_delay.as_millis()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tripwire_resilience::preset;

    #[test]
    fn test_builtin_presets_are_valid() {
        for category in OperationCategory::ALL {
            assert!(validate_preset(category, &preset(category)).is_ok());
        }
    }

    #[test]
    fn test_validate_preset() {
        let mut p = preset(OperationCategory::Gsx);
        p.breaker.failure_threshold = 0;
        let err = validate_preset(OperationCategory::Gsx, &p).unwrap_err();
        assert!(err.to_string().contains("gsx: failure_threshold"));

        let mut p = preset(OperationCategory::Gsx);
        p.breaker.recovery_time = Duration::ZERO;
        assert!(validate_preset(OperationCategory::Gsx, &p).is_err());

        let mut p = preset(OperationCategory::Gsx);
        p.retry.max_delay = Duration::from_millis(1);
        assert!(validate_preset(OperationCategory::Gsx, &p).is_err());

        // Equal delays are fine
        let mut p = preset(OperationCategory::Gsx);
        p.retry.max_delay = p.retry.initial_delay;
        assert!(validate_preset(OperationCategory::Gsx, &p).is_ok());
    }
}
