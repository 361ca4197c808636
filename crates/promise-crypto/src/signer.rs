//! The signing capability used by the promise issuer
//!
//! The issuer never holds key material. It asks a [`Signer`] to sign content
//! on behalf of an identity; the signer decides whether it can.

use crate::{CryptoError, CryptoResult, KeyPair, Signature};
use dashmap::DashMap;
use promise_types::{Identity, Promise, SignedPromise};

/// Produces signatures over arbitrary content for a holder identity
pub trait Signer: Send + Sync {
    /// Sign `content` as `identity`
    fn sign(&self, identity: &Identity, content: &[u8]) -> CryptoResult<Signature>;
}

/// Sign a promise as its issuer
pub fn sign_promise(signer: &dyn Signer, promise: Promise) -> CryptoResult<SignedPromise> {
    let content = promise.signable_bytes()?;
    let signature = signer.sign(promise.issuer(), &content)?;
    Ok(SignedPromise::new(promise, signature.into()))
}

/// Keystore-backed Ed25519 signer
///
/// Holds one key pair per identity. Signing for an identity with no key
/// fails with [`CryptoError::KeyNotFound`].
#[derive(Debug, Default)]
pub struct Ed25519Signer {
    keys: DashMap<Identity, KeyPair>,
}

impl Ed25519Signer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a key pair under its derived identity
    pub fn add_key(&self, keypair: KeyPair) -> CryptoResult<Identity> {
        let identity = keypair.identity()?;
        self.keys.insert(identity.clone(), keypair);
        Ok(identity)
    }

    /// Generate and store a fresh key pair
    pub fn create_identity(&self) -> CryptoResult<Identity> {
        self.add_key(KeyPair::generate())
    }

    pub fn has_identity(&self, identity: &Identity) -> bool {
        self.keys.contains_key(identity)
    }
}

impl Signer for Ed25519Signer {
    fn sign(&self, identity: &Identity, content: &[u8]) -> CryptoResult<Signature> {
        let keypair = self
            .keys
            .get(identity)
            .ok_or_else(|| CryptoError::KeyNotFound(identity.to_string()))?;
        Signature::sign(keypair.value(), content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promise_types::Money;

    #[test]
    fn test_sign_promise_as_issuer() {
        let signer = Ed25519Signer::new();
        let issuer = signer.create_identity().unwrap();
        let provider = Identity::from_address("0xprovider").unwrap();

        let promise = Promise::new(issuer, provider, Money::from_code(10, "MYST").unwrap());
        let signed = sign_promise(&signer, promise.clone()).unwrap();

        assert_eq!(signed.promise(), &promise);

        let signature = Signature::try_from(signed.signature()).unwrap();
        assert!(signature.verify(&promise.signable_bytes().unwrap()).unwrap());
        assert!(signed.signature().signed_at > 0);
    }

    #[test]
    fn test_unknown_identity() {
        let signer = Ed25519Signer::new();
        let stranger = Identity::from_address("0xstranger").unwrap();

        let result = signer.sign(&stranger, b"content");
        assert!(matches!(result, Err(CryptoError::KeyNotFound(_))));
    }

    #[test]
    fn test_add_key_is_deterministic() {
        let signer = Ed25519Signer::new();
        let identity = signer.add_key(KeyPair::from_bytes(&[1u8; 32])).unwrap();

        assert!(signer.has_identity(&identity));
        assert_eq!(identity, KeyPair::from_bytes(&[1u8; 32]).identity().unwrap());
    }
}
