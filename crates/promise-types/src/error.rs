//! Error types for promise domain values

use thiserror::Error;

/// Result type for domain value construction
pub type Result<T> = std::result::Result<T, TypesError>;

/// Errors raised while building or decoding domain values
#[derive(Debug, Clone, Error)]
pub enum TypesError {
    /// Currency code is empty or contains non-alphanumeric characters
    #[error("Invalid currency code: {code:?}")]
    InvalidCurrency { code: String },

    /// Identity address is empty
    #[error("Identity address must not be empty")]
    EmptyIdentity,

    /// Money arithmetic across two different currencies
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    /// Money arithmetic overflowed
    #[error("Amount overflow during arithmetic operation")]
    AmountOverflow,

    /// Serialization or deserialization failed
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<serde_json::Error> for TypesError {
    fn from(e: serde_json::Error) -> Self {
        TypesError::Serialization {
            message: e.to_string(),
        }
    }
}
