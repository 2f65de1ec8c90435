//! Exponential backoff with multiplicative jitter.

use rand::Rng;
use std::time::Duration;
use tripwire_core::{JITTER_MAX, JITTER_MIN};

/// Draw a jitter factor uniformly from `[JITTER_MIN, JITTER_MAX)`.
pub fn jitter() -> f64 {
    rand::thread_rng().gen_range(JITTER_MIN..JITTER_MAX)
}

/// Backoff delay before retry number `retry_count` (1-based).
///
/// `min(initial * 2^(retry_count - 1) * jitter, max)`. The doubling saturates
/// instead of overflowing, so very large retry counts simply yield `max`.
pub fn exponential_delay(
    initial: Duration,
    max: Duration,
    retry_count: u32,
    jitter: f64,
) -> Duration {
    let factor = 2u32
        .checked_pow(retry_count.saturating_sub(1))
        .unwrap_or(u32::MAX);
    let scaled = initial.saturating_mul(factor).as_secs_f64() * jitter;

    if !scaled.is_finite() || scaled >= max.as_secs_f64() {
        max
    } else {
        Duration::from_secs_f64(scaled.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const INITIAL: Duration = Duration::from_millis(1000);
    const MAX: Duration = Duration::from_millis(30_000);

    #[test]
    fn test_backoff_without_jitter_doubles() {
        assert_eq!(exponential_delay(INITIAL, MAX, 1, 1.0), Duration::from_secs(1));
        assert_eq!(exponential_delay(INITIAL, MAX, 2, 1.0), Duration::from_secs(2));
        assert_eq!(exponential_delay(INITIAL, MAX, 3, 1.0), Duration::from_secs(4));
        assert_eq!(exponential_delay(INITIAL, MAX, 6, 1.0), MAX);
    }

    #[test]
    fn test_backoff_saturates_for_huge_retry_counts() {
        assert_eq!(exponential_delay(INITIAL, MAX, u32::MAX, 1.19), MAX);
        assert_eq!(
            exponential_delay(Duration::MAX, Duration::MAX, 40, 1.1),
            Duration::MAX
        );
    }

    #[test]
    fn test_jitter_stays_in_range() {
        for _ in 0..1000 {
            let j = jitter();
            assert!((JITTER_MIN..JITTER_MAX).contains(&j));
        }
    }

    proptest! {
        #[test]
        fn proptest_first_retry_within_jitter_band(j in JITTER_MIN..JITTER_MAX) {
            let delay = exponential_delay(INITIAL, MAX, 1, j).as_millis();
            prop_assert!((800..1200).contains(&delay));
        }

        #[test]
        fn proptest_second_retry_within_jitter_band(j in JITTER_MIN..JITTER_MAX) {
            let delay = exponential_delay(INITIAL, MAX, 2, j).as_millis();
            prop_assert!((1600..2400).contains(&delay));
        }

        #[test]
        fn proptest_delay_never_exceeds_max(
            retry_count in 1u32..64,
            j in JITTER_MIN..JITTER_MAX,
        ) {
            prop_assert!(exponential_delay(INITIAL, MAX, retry_count, j) <= MAX);
        }
    }
}
