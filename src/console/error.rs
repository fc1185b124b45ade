//! Error types for the operator console

use crate::mqtt::topics::Role;
use thiserror::Error;

/// Operator text that could not be turned into a typed value.
///
/// Never leaves the validator; the operator is simply asked again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid number")]
    NotANumber(String),

    #[error("{value} is not an option, choose one of {allowed:?}")]
    NotInSet { value: i64, allowed: Vec<i64> },
}

/// A value that does not fit the channel it was routed to.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("{role} expects {expected}, got {got}")]
    TypeMismatch {
        role: Role,
        expected: &'static str,
        got: &'static str,
    },

    #[error("{role} cannot carry a non-finite value")]
    NonFinite { role: Role },

    #[error("{0} is a report channel and cannot be written")]
    NotWritable(Role),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// Operator I/O conditions that end the control loop.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Operator input closed")]
    InputClosed,

    #[error("Console I/O error: {0}")]
    Io(#[from] std::io::Error),
}
