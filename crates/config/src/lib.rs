//! Configuration loading for tripwire
//!
//! This crate resolves per-category retry and circuit breaker settings from
//! the built-in presets, an optional JSON file and environment overrides.

pub mod loader;
pub mod settings;
pub mod validation;

pub use loader::SettingsLoader;
pub use settings::{CategorySettings, ResilienceSettings, SettingsFile};
