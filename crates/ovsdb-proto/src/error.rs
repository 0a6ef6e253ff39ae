//! Error types for the wire model.

use thiserror::Error;

/// Errors raised while converting between native values, protocol datums and
/// their JSON forms.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtoError {
    #[error("expected {expected}, got {got}")]
    ValueTypeMismatch { expected: String, got: String },

    #[error("malformed {kind} value: {reason}")]
    Malformed { kind: &'static str, reason: String },

    #[error("{0} is not a valid atomic type")]
    UnknownAtomicType(String),

    #[error("{0} is not a valid mutator")]
    UnknownMutator(String),

    #[error("{0} is not a valid condition function")]
    UnknownFunction(String),
}

pub type Result<T> = std::result::Result<T, ProtoError>;
