//! Promise Crypto - signing for the promise issuance protocol
//!
//! This crate provides:
//! - Ed25519 key generation and identity derivation
//! - Digital signatures over arbitrary content
//! - The [`Signer`] capability the issuer depends on, plus a keystore-backed
//!   implementation
//!
//! # Security Invariant
//!
//! **Signing keys never leave the keystore.** Callers hand content in and
//! receive a [`Signature`] back.

pub mod keys;
pub mod signature;
pub mod signer;

pub use keys::*;
pub use signature::*;
pub use signer::*;

use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Key not found for identity: {0}")]
    KeyNotFound(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),
}

impl From<promise_types::TypesError> for CryptoError {
    fn from(e: promise_types::TypesError) -> Self {
        CryptoError::InvalidContent(e.to_string())
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;
