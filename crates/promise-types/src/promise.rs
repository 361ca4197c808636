//! Promises and signed promises
//!
//! A promise is created fresh for every issuance attempt and is never mutated
//! afterwards. Signing does not alter the promise; it wraps it together with
//! the signature produced over [`Promise::signable_bytes`].

use crate::{Identity, Money, Result};
use serde::{Deserialize, Serialize};

/// A claim from the issuer to the recipient of an amount of value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promise {
    issuer: Identity,
    recipient: Identity,
    amount: Money,
}

impl Promise {
    /// Create a new unsigned promise
    pub fn new(issuer: Identity, recipient: Identity, amount: Money) -> Self {
        Self {
            issuer,
            recipient,
            amount,
        }
    }

    pub fn issuer(&self) -> &Identity {
        &self.issuer
    }

    pub fn recipient(&self) -> &Identity {
        &self.recipient
    }

    pub fn amount(&self) -> &Money {
        &self.amount
    }

    /// Canonical bytes the issuer signs
    pub fn signable_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Signature attached to a promise, as carried on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromiseSignature {
    /// Hex-encoded signature bytes
    pub signature: String,
    /// Hex-encoded public key of the signer
    pub public_key: String,
    /// Signing time, unix millis
    pub signed_at: i64,
}

/// A promise bound to its issuer by a signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPromise {
    promise: Promise,
    signature: PromiseSignature,
}

impl SignedPromise {
    pub fn new(promise: Promise, signature: PromiseSignature) -> Self {
        Self { promise, signature }
    }

    pub fn promise(&self) -> &Promise {
        &self.promise
    }

    pub fn signature(&self) -> &PromiseSignature {
        &self.signature
    }
}
