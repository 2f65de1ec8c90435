/// Constants used throughout the tripwire codebase
// Environment variable names
pub const TRIPWIRE_LOG_VAR: &str = "TRIPWIRE_LOG";
pub const TRIPWIRE_CONFIG_VAR: &str = "TRIPWIRE_CONFIG";
pub const TRIPWIRE_ENV_PREFIX: &str = "TRIPWIRE";

// Backoff jitter bounds, applied multiplicatively (upper bound exclusive)
pub const JITTER_MIN: f64 = 0.8;
pub const JITTER_MAX: f64 = 1.2;

// Capacity of the per-breaker state change broadcast channel
pub const STATE_EVENT_CAPACITY: usize = 64;
