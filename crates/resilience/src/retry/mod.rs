//! Retry engine: bounded retries with exponential backoff, jitter and
//! classifier-recommended delays.
//!
//! - [`config`] - Tuning parameters ([`RetryConfig`])
//! - [`backoff`] - Delay computation
//! - [`policy`] - The execution loop ([`RetryPolicy`])

pub mod backoff;
pub mod config;
pub mod policy;

pub use config::RetryConfig;
pub use policy::RetryPolicy;
