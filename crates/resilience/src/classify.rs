//! Failure classification: which errors are worth retrying, and how long to wait.
//!
//! A classifier only inspects one link of an error chain at a time. The
//! provided [`FailureClassifier::is_retryable`] and
//! [`FailureClassifier::retry_delay`] walk the full `source()` chain,
//! outermost first.

use std::error::Error as StdError;
use std::fmt;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;
use tripwire_core::{causes, Error};

/// Decides whether failures are transient and whether they carry a delay hint
pub trait FailureClassifier: Send + Sync {
    /// Whether this single link of a chain is a transient failure
    fn is_transient(&self, error: &(dyn StdError + 'static)) -> bool;

    /// Retry delay recommended by this single link, if any
    fn recommended_delay(&self, error: &(dyn StdError + 'static)) -> Option<Duration>;

    /// Whether the error, or any of its causes, is transient
    fn is_retryable(&self, error: &(dyn StdError + 'static)) -> bool {
        causes(error).any(|link| self.is_transient(link))
    }

    /// First positive recommended delay found along the chain
    fn retry_delay(&self, error: &(dyn StdError + 'static)) -> Option<Duration> {
        causes(error)
            .filter_map(|link| self.recommended_delay(link))
            .find(|delay| !delay.is_zero())
    }
}

/// Default classifier.
///
/// Transient: `Error::Connection`, `Error::Timeout`, and I/O errors whose kind
/// indicates a dropped or refused connection. Delay hints come from
/// `Error::Connection::retry_after`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientClassifier;

impl TransientClassifier {
    fn transient_io_kind(kind: ErrorKind) -> bool {
        matches!(
            kind,
            ErrorKind::ConnectionRefused
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::NotConnected
                | ErrorKind::BrokenPipe
                | ErrorKind::TimedOut
                | ErrorKind::Interrupted
                | ErrorKind::WouldBlock
        )
    }
}

impl FailureClassifier for TransientClassifier {
    fn is_transient(&self, error: &(dyn StdError + 'static)) -> bool {
        if let Some(error) = error.downcast_ref::<Error>() {
            return matches!(error, Error::Connection { .. } | Error::Timeout { .. });
        }
        if let Some(io) = error.downcast_ref::<std::io::Error>() {
            return Self::transient_io_kind(io.kind());
        }
        false
    }

    fn recommended_delay(&self, error: &(dyn StdError + 'static)) -> Option<Duration> {
        match error.downcast_ref::<Error>() {
            Some(Error::Connection { retry_after, .. }) => *retry_after,
            _ => None,
        }
    }
}

type Predicate = dyn Fn(&(dyn StdError + 'static)) -> bool + Send + Sync;

/// Classifier driven by a caller-supplied predicate.
///
/// Delay hints are still taken from the transient classifier, so connection
/// errors keep their `retry_after` even when the predicate decides eligibility.
#[derive(Clone)]
pub struct PredicateClassifier {
    predicate: Arc<Predicate>,
}

impl PredicateClassifier {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&(dyn StdError + 'static)) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Treat every failure as transient
    pub fn all() -> Self {
        Self::new(|_| true)
    }
}

impl fmt::Debug for PredicateClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PredicateClassifier(<predicate>)")
    }
}

impl FailureClassifier for PredicateClassifier {
    fn is_transient(&self, error: &(dyn StdError + 'static)) -> bool {
        (self.predicate)(error)
    }

    fn recommended_delay(&self, error: &(dyn StdError + 'static)) -> Option<Duration> {
        TransientClassifier.recommended_delay(error)
    }
}
