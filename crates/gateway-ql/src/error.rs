//! Errors raised while rendering a query fragment.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QlError>;

/// Errors that can occur while assembling a rendered query string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QlError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("{op} requires an array literal")]
    ArrayLiteralRequired { op: &'static str },

    #[error("between requires exactly two elements, got {0}")]
    BetweenArity(usize),

    #[error("{op} requires a string literal")]
    StringLiteralRequired { op: &'static str },
}
