//! Key management

use crate::{CryptoError, CryptoResult};
use ed25519_dalek::{SigningKey, VerifyingKey};
use promise_types::Identity;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of digest bytes kept in an identity address
const ADDRESS_BYTES: usize = 20;

/// A key pair for signing operations
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create from existing signing key bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Get the signing key (private - never expose!)
    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Get the verifying key (public)
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Get the public key as hex string
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key.as_bytes())
    }

    /// Identity address owned by this key: `0x` + hex of the first 20 bytes
    /// of SHA-256 over the public key
    pub fn identity(&self) -> CryptoResult<Identity> {
        let digest = Sha256::digest(self.verifying_key.as_bytes());
        let address = format!("0x{}", hex::encode(&digest[..ADDRESS_BYTES]));
        Ok(Identity::from_address(address)?)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Public key reference (safe to share)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    /// Hex-encoded public key
    pub key: String,
}

impl PublicKey {
    /// Create from a key pair
    pub fn from_keypair(keypair: &KeyPair) -> Self {
        Self {
            key: keypair.public_key_hex(),
        }
    }

    /// Parse the verifying key
    pub fn to_verifying_key(&self) -> CryptoResult<VerifyingKey> {
        let bytes: [u8; 32] = hex::decode(&self.key)
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyFormat("Public key must be 32 bytes".to_string()))?;

        VerifyingKey::from_bytes(&bytes).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))
    }
}
