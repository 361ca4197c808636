//! Messages exchanged over the session dialog
//!
//! The messaging layer owns framing; these types only define what goes inside
//! a frame and which endpoint it is addressed to.

use crate::{Money, Result, SignedPromise};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// Endpoint carrying signed promises from issuer to provider
pub const PROMISE_ENDPOINT: &str = "promise-create";

/// Endpoint carrying balance acknowledgments from provider to issuer
pub const BALANCE_ENDPOINT: &str = "promise-balance";

/// Name of a message type on the dialog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageEndpoint(pub String);

impl MessageEndpoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn promise() -> Self {
        Self::new(PROMISE_ENDPOINT)
    }

    pub fn balance() -> Self {
        Self::new(BALANCE_ENDPOINT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlation id chosen by the provider for an acknowledgment
///
/// Zero is reserved as "unset" and never correlates to a promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl RequestId {
    pub fn is_set(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound message wrapping a signed promise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromiseMessage {
    pub signed_promise: SignedPromise,
}

/// Provider's acknowledgment of a promise and the resulting balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceMessage {
    pub request_id: RequestId,
    pub accepted: bool,
    pub balance: Money,
}

impl BalanceMessage {
    pub fn accepted(request_id: u64, balance: Money) -> Self {
        Self {
            request_id: RequestId(request_id),
            accepted: true,
            balance,
        }
    }

    pub fn rejected(request_id: u64, balance: Money) -> Self {
        Self {
            request_id: RequestId(request_id),
            accepted: false,
            balance,
        }
    }
}

/// Serialize a message for the dialog
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(message)?)
}

/// Deserialize a message received from the dialog
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypesError;

    #[test]
    fn test_balance_message_decode() {
        let payload = br#"{"request_id":7,"accepted":false,"balance":{"amount":5,"currency":"TEST"}}"#;
        let message: BalanceMessage = decode(payload).unwrap();
        assert_eq!(message.request_id, RequestId(7));
        assert!(!message.accepted);
        assert_eq!(message.balance.to_string(), "5TEST");
    }

    #[test]
    fn test_garbage_payload() {
        let result = decode::<BalanceMessage>(b"not json");
        assert!(matches!(result, Err(TypesError::Serialization { .. })));
    }

    #[test]
    fn test_unset_request_id() {
        assert!(!RequestId(0).is_set());
        assert!(RequestId(1).is_set());
    }
}
