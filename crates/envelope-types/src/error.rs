use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),

    #[error("value is not {expected}: found {found}")]
    WrongValueType {
        expected: &'static str,
        found: &'static str,
    },
}

/// Result alias for type operations.
pub type TypeResult<T> = Result<T, TypeError>;
