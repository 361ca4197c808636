//! Collaborator contract for the session's messaging channel
//!
//! A [`Dialog`] already connects the two parties. The issuer only needs to
//! push a payload to an endpoint and to register one [`MessageConsumer`] per
//! endpoint for inbound traffic. How payloads are framed and carried is the
//! dialog's business.

use std::sync::Arc;

use async_trait::async_trait;
use promise_types::MessageEndpoint;
use thiserror::Error;

/// Failures of the messaging channel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransmissionError {
    #[error("Failed to send to {endpoint}: {reason}")]
    SendFailed { endpoint: String, reason: String },

    #[error("Failed to subscribe to {endpoint}: {reason}")]
    SubscribeFailed { endpoint: String, reason: String },

    #[error("Failed to unsubscribe from {endpoint}: {reason}")]
    UnsubscribeFailed { endpoint: String, reason: String },

    #[error("Endpoint {endpoint} already has a consumer")]
    AlreadySubscribed { endpoint: String },

    #[error("Failed to encode message: {0}")]
    Encoding(String),

    #[error("Dialog is closed")]
    Closed,
}

/// Callback registered with a dialog for one endpoint
///
/// Invoked once per inbound payload, possibly from another task. It has no
/// way to report failure back into the dialog; whatever goes wrong while
/// consuming stays with the consumer.
pub trait MessageConsumer: Send + Sync {
    fn consume(&self, payload: &[u8]);
}

/// Bidirectional messaging channel between the issuer and the provider
#[async_trait]
pub trait Dialog: Send + Sync {
    /// Deliver a payload to the counterparty's `endpoint`
    async fn send(&self, endpoint: &MessageEndpoint, payload: Vec<u8>)
        -> Result<(), TransmissionError>;

    /// Route every future inbound payload for `endpoint` to `consumer`
    async fn subscribe(
        &self,
        endpoint: &MessageEndpoint,
        consumer: Arc<dyn MessageConsumer>,
    ) -> Result<(), TransmissionError>;

    /// Stop routing payloads for `endpoint`
    async fn unsubscribe(&self, endpoint: &MessageEndpoint) -> Result<(), TransmissionError>;
}
