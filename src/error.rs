//! Error taxonomy for the rainflow engine (FR-err-1..3 of SPEC_FULL §7).
//!
//! Every fallible public method returns `Result<T, RainflowError>`. There is
//! no internal recovery: a fatal error moves the engine to
//! [`crate::EngineState::Error`] and the caller decides whether to rebuild
//! the context.

/// Error kind returned by a fallible [`crate::RainflowEngine`] operation.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum RainflowError {
    /// Class or Wöhler parameters out of the documented range, or an
    /// operation was requested with malformed arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An allocation-dependent precondition could not be satisfied
    /// (e.g. a histogram cell would need more than `usize` capacity).
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// The operation is not valid in the engine's current lifecycle state,
    /// or a histogram cell has reached `COUNTS_LIMIT`.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, RainflowError>;
