//! Core error type definitions

use crate::types::ConnectionTarget;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for tripwire operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error used as the cause of wrapped failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type for tripwire operations using thiserror
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A circuit breaker refused admission
    #[error("circuit breaker '{breaker}' is open")]
    CircuitOpen {
        breaker: String,
        /// Time left until the breaker accepts a probe, when known
        retry_after: Option<Duration>,
    },

    /// The caller's cancellation signal fired
    #[error("operation '{operation}' was cancelled")]
    Cancelled { operation: String },

    /// Transient connection failure talking to an external system
    #[error("{target} connection failed during '{operation}': {message}")]
    Connection {
        target: ConnectionTarget,
        operation: String,
        message: String,
        /// Delay the remote side asked for before trying again
        retry_after: Option<Duration>,
        #[source]
        source: Option<BoxError>,
    },

    /// Operation timeout errors
    #[error("operation '{operation}' timed out after {duration:?}")]
    Timeout { operation: String, duration: Duration },

    /// Failure of a protected operation that is not itself transient
    #[error("operation '{operation}' failed: {message}")]
    Operation {
        operation: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// File system operations
    #[error("file system {operation} operation failed for '{}': {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}
