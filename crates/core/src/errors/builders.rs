//! Builder methods for creating errors with context

use super::types::{BoxError, Error};
use crate::types::ConnectionTarget;
use std::path::PathBuf;
use std::time::Duration;

impl Error {
    /// Create a circuit-open rejection
    #[must_use]
    pub fn circuit_open(breaker: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Error::CircuitOpen {
            breaker: breaker.into(),
            retry_after,
        }
    }

    /// Create a cancellation error
    #[must_use]
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Error::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create a transient connection error
    #[must_use]
    pub fn connection(
        target: ConnectionTarget,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Connection {
            target,
            operation: operation.into(),
            message: message.into(),
            retry_after: None,
            source: None,
        }
    }

    /// Create a simulator connection error
    #[must_use]
    pub fn simulator(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::connection(ConnectionTarget::Simulator, operation, message)
    }

    /// Create a ProSim connection error
    #[must_use]
    pub fn prosim(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::connection(ConnectionTarget::ProSim, operation, message)
    }

    /// Create a GSX connection error
    #[must_use]
    pub fn gsx(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::connection(ConnectionTarget::Gsx, operation, message)
    }

    /// Create a network error
    #[must_use]
    pub fn network(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::connection(ConnectionTarget::Network, operation, message)
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create an operation error
    #[must_use]
    pub fn operation(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Operation {
            operation: operation.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an operation error wrapping an underlying cause
    #[must_use]
    pub fn operation_with_source(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Error::Operation {
            operation: operation.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Attach a recommended retry delay to a connection error.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        if let Error::Connection { retry_after, .. } = &mut self {
            *retry_after = Some(delay);
        }
        self
    }

    /// Attach an underlying cause to a connection error.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn with_source(mut self, cause: impl Into<BoxError>) -> Self {
        if let Error::Connection { source, .. } = &mut self {
            *source = Some(cause.into());
        }
        self
    }
}
