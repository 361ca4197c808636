//! Error types for the issuing session
//!
//! Every error returned from `start` leaves the session Idle, so the caller
//! may retry the whole issuance.

use crate::{SessionPhase, TransmissionError};
use promise_crypto::CryptoError;
use promise_types::TypesError;
use thiserror::Error;

/// Errors surfaced to the caller of a session operation
#[derive(Error, Debug)]
pub enum IssuerError {
    #[error("Cannot {operation} a session in phase {phase}")]
    InvalidState {
        operation: &'static str,
        phase: SessionPhase,
    },

    #[error("Signing error: {0}")]
    Signing(#[from] CryptoError),

    #[error("Transmission error: {0}")]
    Transmission(#[from] TransmissionError),

    #[error("Invalid proposal: {0}")]
    InvalidProposal(#[from] TypesError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, IssuerError>;
