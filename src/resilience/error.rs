//! Resilience error taxonomy.

use std::fmt;

use thiserror::Error;

/// Boxed error produced by a wrapped operation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Logical dependency a breaker protects.
///
/// The category selects which service flags are flipped when the breaker
/// trips or recovers. `None` guards a dependency with no user-visible flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    UserStore,
    CommentStore,
    GameApi,
    None,
}

impl FailureCategory {
    /// Stable label used in config keys, logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::UserStore => "user_store",
            FailureCategory::CommentStore => "comment_store",
            FailureCategory::GameApi => "game_api",
            FailureCategory::None => "none",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the retrier and the circuit breaker.
#[derive(Debug, Error)]
pub enum ResilienceError {
    /// The wrapped operation itself failed.
    #[error("operation failed: {0}")]
    OperationFailed(#[source] BoxError),

    /// Every attempt allowed by the retry policy failed.
    #[error("failed after {retries} retries: {last}")]
    RetriesExhausted {
        retries: u32,
        #[source]
        last: Box<ResilienceError>,
    },

    /// The breaker is cooling down; the dependency was not called.
    #[error("circuit breaker for {category} is open, try later")]
    CircuitOpen { category: FailureCategory },
}

impl ResilienceError {
    pub(crate) fn exhausted(retries: u32, cause: BoxError) -> Self {
        ResilienceError::RetriesExhausted {
            retries,
            last: Box::new(ResilienceError::OperationFailed(cause)),
        }
    }

    /// True for the outcomes a caller should report as "temporarily unavailable".
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ResilienceError::RetriesExhausted { .. } | ResilienceError::CircuitOpen { .. }
        )
    }

    /// The error raised by the last attempt of the wrapped operation, if any.
    pub fn last_cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            ResilienceError::OperationFailed(cause) => Some(cause.as_ref()),
            ResilienceError::RetriesExhausted { last, .. } => last.last_cause(),
            ResilienceError::CircuitOpen { .. } => None,
        }
    }
}
