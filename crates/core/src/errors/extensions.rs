//! Extension traits and cause-chain helpers for error handling

use super::types::{Error, Result};
use std::error::Error as StdError;
use std::time::Duration;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result, keeping the original error as the cause
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a lazy message
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| wrap(message.into(), e.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(f(), e.into()))
    }
}

fn wrap(context: String, base_error: Error) -> Error {
    Error::Operation {
        operation: context,
        message: base_error.to_string(),
        source: Some(Box::new(base_error)),
    }
}

/// Iterate an error and its causes, outermost first.
pub fn causes<'a>(
    error: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(error), |&e| e.source())
}

/// Render an error with all of its causes, joined by `": "`.
///
/// Links whose message is already contained in the previous link are skipped,
/// since several variants repeat their source in their own display.
pub fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut rendered = String::new();
    for link in causes(error) {
        let message = link.to_string();
        if rendered.contains(&message) {
            continue;
        }
        if !rendered.is_empty() {
            rendered.push_str(": ");
        }
        rendered.push_str(&message);
    }
    rendered
}

impl Error {
    /// Whether this error, or anything in its cause chain, is a cancellation
    pub fn is_cancellation(&self) -> bool {
        causes(self).any(|link| matches!(link.downcast_ref::<Error>(), Some(Error::Cancelled { .. })))
    }

    /// Whether this error is a circuit breaker rejection
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Error::CircuitOpen { .. })
    }

    /// Retry delay carried by this error itself, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::Connection { retry_after, .. } | Error::CircuitOpen { retry_after, .. } => {
                *retry_after
            }
            _ => None,
        }
    }
}
