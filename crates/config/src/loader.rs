//! Settings loader for tripwire
//!
//! Resolution order, later sources winning: built-in presets, the settings
//! file, then `<PREFIX>_<CATEGORY>_<FIELD>` environment variables.

use crate::settings::{CategorySettings, ResilienceSettings, SettingsFile};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tripwire_core::{
    constants::{TRIPWIRE_CONFIG_VAR, TRIPWIRE_ENV_PREFIX},
    Error, Result,
};
use tripwire_resilience::OperationCategory;

const FIELDS: [&str; 7] = [
    "MAX_RETRIES",
    "INITIAL_DELAY_MS",
    "MAX_DELAY_MS",
    "USE_EXPONENTIAL_BACKOFF",
    "INCLUDE_ERROR_CHAIN",
    "FAILURE_THRESHOLD",
    "RECOVERY_TIME_MS",
];

/// Builder that resolves [`ResilienceSettings`]
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    /// Settings file; falls back to the path in `TRIPWIRE_CONFIG` when unset
    file: Option<PathBuf>,
    env_prefix: String,
    use_env: bool,
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            env_prefix: TRIPWIRE_ENV_PREFIX.to_string(),
            use_env: true,
        }
    }

    /// Read overrides from a JSON settings file
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Set the prefix for environment overrides
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Ignore the process environment
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Load and validate the settings
    pub fn load(self) -> Result<ResilienceSettings> {
        let mut overrides = match self.settings_path() {
            Some(path) => read_settings_file(&path)?,
            None => SettingsFile::new(),
        };

        if self.use_env {
            for (category, settings) in self.env_overrides()? {
                overrides.entry(category).or_default().merge(&settings);
            }
        }

        ResilienceSettings::from_overrides(&overrides)
    }

    fn settings_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.file {
            return Some(path.clone());
        }
        if !self.use_env {
            return None;
        }
        env::var_os(TRIPWIRE_CONFIG_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }

    fn env_overrides(&self) -> Result<SettingsFile> {
        let mut overrides = SettingsFile::new();

        for category in OperationCategory::ALL {
            let mut settings = CategorySettings::default();
            for field in FIELDS {
                let key = format!(
                    "{}_{}_{field}",
                    self.env_prefix,
                    category.as_str().to_ascii_uppercase()
                );
                let Ok(value) = env::var(&key) else {
                    continue;
                };
                debug!(key = %key, value = %value, "Applying environment override");
                apply_field(&mut settings, field, &key, value.trim())?;
            }
            if !settings.is_empty() {
                overrides.insert(category, settings);
            }
        }

        Ok(overrides)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_settings_file(path: &Path) -> Result<SettingsFile> {
    let contents = fs::read_to_string(path).map_err(|e| Error::file_system(path, "read", e))?;
    let settings: SettingsFile = serde_json::from_str(&contents).map_err(|e| Error::Json {
        message: format!("Failed to parse settings file '{}'", path.display()),
        source: e,
    })?;
    debug!(path = %path.display(), categories = settings.len(), "Loaded settings file");
    Ok(settings)
}

fn apply_field(settings: &mut CategorySettings, field: &str, key: &str, value: &str) -> Result<()> {
    match field {
        "MAX_RETRIES" => settings.max_retries = Some(parse_number(key, value)?),
        "INITIAL_DELAY_MS" => settings.initial_delay_ms = Some(parse_number(key, value)?),
        "MAX_DELAY_MS" => settings.max_delay_ms = Some(parse_number(key, value)?),
        "USE_EXPONENTIAL_BACKOFF" => settings.use_exponential_backoff = Some(parse_bool(key, value)?),
        "INCLUDE_ERROR_CHAIN" => settings.include_error_chain = Some(parse_bool(key, value)?),
        "FAILURE_THRESHOLD" => settings.failure_threshold = Some(parse_number(key, value)?),
        "RECOVERY_TIME_MS" => settings.recovery_time_ms = Some(parse_number(key, value)?),
        _ => {}
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::configuration(format!("Invalid value '{value}' for {key}: {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::configuration(format!(
            "Invalid boolean '{value}' for {key}"
        ))),
    }
}
