//! Identity addresses
//!
//! Both sides of a session are named by an address string. Addresses are
//! compared case-insensitively, so they are normalised to lowercase on entry.

use crate::{Result, TypesError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a protocol participant (issuer or provider)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Create from an address string, normalising to lowercase
    pub fn from_address(address: impl AsRef<str>) -> Result<Self> {
        let address = address.as_ref().trim();
        if address.is_empty() {
            return Err(TypesError::EmptyIdentity);
        }
        Ok(Self(address.to_ascii_lowercase()))
    }

    /// Get the address
    pub fn address(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identity {
    type Error = TypesError;

    fn try_from(address: String) -> Result<Self> {
        Self::from_address(address)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_normalised() {
        let identity = Identity::from_address("0xABCdef").unwrap();
        assert_eq!(identity.address(), "0xabcdef");
        assert_eq!(identity.to_string(), "0xabcdef");
    }

    #[test]
    fn test_address_normalised_on_decode() {
        let identity: Identity = serde_json::from_str(r#""0xABC""#).unwrap();
        assert_eq!(identity.address(), "0xabc");
        assert!(serde_json::from_str::<Identity>(r#""""#).is_err());
    }

    #[test]
    fn test_empty_address_rejected() {
        assert!(matches!(
            Identity::from_address("   "),
            Err(TypesError::EmptyIdentity)
        ));
    }
}
