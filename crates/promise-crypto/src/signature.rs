//! Ed25519 signatures over promise content
//!
//! A [`Signature`] converts to and from the wire form [`PromiseSignature`],
//! so a receiving side can check a signed promise without any shared state.

use crate::{CryptoError, CryptoResult, KeyPair, PublicKey};
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature as Ed25519Signature, Signer as _, Verifier};
use promise_types::PromiseSignature;
use serde::{Deserialize, Serialize};

/// A signature together with the key and time it was produced with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Hex-encoded signature bytes
    pub signature: String,
    pub public_key: PublicKey,
    pub signed_at: DateTime<Utc>,
}

impl Signature {
    /// Sign `content` with `keypair`, stamped with the current time
    pub fn sign(keypair: &KeyPair, content: &[u8]) -> CryptoResult<Self> {
        let signed_at = Utc::now();
        keypair
            .signing_key()
            .try_sign(content)
            .map(|raw| Self {
                signature: hex::encode(raw.to_bytes()),
                public_key: PublicKey::from_keypair(keypair),
                signed_at,
            })
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))
    }

    /// Whether this signature is valid for `content`
    ///
    /// Errors only when the signature or key cannot be decoded.
    pub fn verify(&self, content: &[u8]) -> CryptoResult<bool> {
        let bytes: [u8; 64] = hex::decode(&self.signature)
            .map_err(|e| CryptoError::VerificationFailed(e.to_string()))?
            .try_into()
            .map_err(|_| CryptoError::VerificationFailed("Signature must be 64 bytes".to_string()))?;

        let verifying_key = self.public_key.to_verifying_key()?;
        Ok(verifying_key
            .verify(content, &Ed25519Signature::from_bytes(&bytes))
            .is_ok())
    }
}

impl From<Signature> for PromiseSignature {
    fn from(signature: Signature) -> Self {
        PromiseSignature {
            signature: signature.signature,
            public_key: signature.public_key.key,
            signed_at: signature.signed_at.timestamp_millis(),
        }
    }
}

impl TryFrom<&PromiseSignature> for Signature {
    type Error = CryptoError;

    fn try_from(wire: &PromiseSignature) -> CryptoResult<Self> {
        let signed_at = DateTime::<Utc>::from_timestamp_millis(wire.signed_at).ok_or_else(|| {
            CryptoError::InvalidContent(format!("signing time out of range: {}", wire.signed_at))
        })?;

        Ok(Self {
            signature: wire.signature.clone(),
            public_key: PublicKey {
                key: wire.public_key.clone(),
            },
            signed_at,
        })
    }
}
