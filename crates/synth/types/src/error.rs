//! Error taxonomy for the synthesis core.
//!
//! Only [`SynthError::InvalidConfiguration`] and [`SynthError::InvalidProblem`]
//! are fatal. The remaining variants describe local, recoverable outcomes:
//! a strategy reports [`SynthError::SynthesisExhausted`] and the orchestrator
//! moves on to the next one, while capability promotion refuses programs
//! that did not pass verification with [`SynthError::VerificationFailed`] or
//! [`SynthError::NonTerminationSuspected`].

use thiserror::Error;

use crate::primitive::PrimitiveId;

/// Errors that can occur during synthesis operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    /// No candidate was found within the active budget.
    #[error("synthesis exhausted: {0}")]
    SynthesisExhausted(String),

    /// An expression was built with ill-typed arguments.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A candidate was found but failed example replay.
    #[error("verification failed: {0}")]
    VerificationFailed(String),

    /// A fixpoint iteration exceeded its cap.
    #[error("non-termination suspected: {0}")]
    NonTerminationSuspected(String),

    /// The caller supplied an unusable configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The example set violates the problem invariants.
    #[error("invalid problem: {0}")]
    InvalidProblem(String),

    /// An expression refers to a primitive that is not registered.
    #[error("unknown primitive: {0}")]
    UnknownPrimitive(PrimitiveId),

    /// A capability name is already taken in the registry.
    #[error("duplicate primitive name: {0}")]
    DuplicateName(String),
}

impl SynthError {
    /// Whether the error is a caller error that must be reported immediately.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration(_) | Self::InvalidProblem(_)
        )
    }
}

/// Result type for synthesis operations.
pub type SynthResult<T> = Result<T, SynthError>;
