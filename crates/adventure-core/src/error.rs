//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
///
/// Only `InvalidChoice`, `PlayerNotFound`, `TransientFailure` and
/// `GenerationFailure` are expected to cross the engine boundary. The other
/// variants are raised by stores and retried or wrapped before surfacing.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The requested branch is not one of the two choice keys.
    #[error("invalid choice: {0}")]
    InvalidChoice(String),

    /// No progression record exists for the player.
    #[error("player not found: {0}")]
    PlayerNotFound(String),

    /// A conditional write lost against a concurrent writer.
    #[error("concurrency conflict on {key}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The store key that had the conflict.
        key: String,
        /// The version the writer expected (0 = absent).
        expected: i64,
        /// The version found in the store (0 = absent).
        actual: i64,
    },

    /// Retries were exhausted; nothing was applied.
    #[error("transient failure: {0}")]
    TransientFailure(String),

    /// Neither generation path produced a valid scene; nothing was applied.
    #[error("generation failure: {0}")]
    GenerationFailure(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Whether an in-flight attempt should be retried from a fresh read.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyConflict { .. } | Self::Infrastructure(_)
        )
    }

    /// Whether a caller may safely resubmit the same request.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyConflict { .. }
                | Self::TransientFailure(_)
                | Self::GenerationFailure(_)
                | Self::Infrastructure(_)
        )
    }
}
