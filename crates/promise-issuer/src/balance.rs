//! Balance acknowledgment handling
//!
//! Every inbound `promise-balance` payload is classified into exactly one
//! [`AcknowledgmentEvent`] (accepted or rejected) or one
//! [`MalformedAcknowledgment`], and handed to an [`AcknowledgmentSink`].
//! The host decides what a sink does with it: log it, count it, or forward
//! it over a channel.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use promise_types::{decode, BalanceMessage, Money, RequestId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::MessageConsumer;

/// Outcome of a promise as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcknowledgmentKind {
    Accepted,
    Rejected,
}

impl fmt::Display for AcknowledgmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => f.pad("accepted"),
            Self::Rejected => f.pad("rejected"),
        }
    }
}

/// A classified balance acknowledgment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcknowledgmentEvent {
    pub kind: AcknowledgmentKind,
    pub request_id: RequestId,
    /// Canonical rendering of `balance`, e.g. `10MYST`
    pub balance_text: String,
    pub balance: Money,
}

impl AcknowledgmentEvent {
    /// Classify a decoded acknowledgment
    pub fn classify(message: BalanceMessage) -> Result<Self, MalformedAcknowledgment> {
        if !message.request_id.is_set() {
            return Err(MalformedAcknowledgment::MissingRequestId {
                balance_text: message.balance.to_string(),
            });
        }

        let kind = if message.accepted {
            AcknowledgmentKind::Accepted
        } else {
            AcknowledgmentKind::Rejected
        };

        Ok(Self {
            kind,
            request_id: message.request_id,
            balance_text: message.balance.to_string(),
            balance: message.balance,
        })
    }

    pub fn is_accepted(&self) -> bool {
        self.kind == AcknowledgmentKind::Accepted
    }
}

/// An inbound acknowledgment that could not be classified
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedAcknowledgment {
    #[error("Undecodable balance acknowledgment: {reason}")]
    Undecodable { reason: String },

    #[error("Balance acknowledgment without request id (balance {balance_text})")]
    MissingRequestId { balance_text: String },
}

/// Receiver of acknowledgment observations
///
/// Called on the dialog's delivery path, so implementations must not block.
pub trait AcknowledgmentSink: Send + Sync {
    fn observe(&self, event: AcknowledgmentEvent);

    fn malformed(&self, error: MalformedAcknowledgment) {
        warn!(error = %error, "Dropped malformed balance acknowledgment");
    }
}

/// Renders observations as tracing records
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AcknowledgmentSink for TracingSink {
    fn observe(&self, event: AcknowledgmentEvent) {
        match event.kind {
            AcknowledgmentKind::Rejected => warn!(
                request_id = %event.request_id,
                balance = %event.balance_text,
                "Promise {} is rejected: {}",
                event.request_id,
                event.balance_text
            ),
            AcknowledgmentKind::Accepted => info!(
                request_id = %event.request_id,
                balance = %event.balance_text,
                "Promise {} balance is {}",
                event.request_id,
                event.balance_text
            ),
        }
    }
}

/// Forwards observations to an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    events: mpsc::UnboundedSender<AcknowledgmentEvent>,
}

impl ChannelSink {
    /// Create a sink and the stream its events arrive on
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AcknowledgmentEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (Self { events }, receiver)
    }
}

impl AcknowledgmentSink for ChannelSink {
    fn observe(&self, event: AcknowledgmentEvent) {
        if let Err(err) = self.events.send(event) {
            debug!(request_id = %err.0.request_id, "Acknowledgment stream closed, event dropped");
        }
    }
}

/// Keeps every observation in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AcknowledgmentEvent>>,
    malformed: Mutex<Vec<MalformedAcknowledgment>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observed events in delivery order
    pub fn events(&self) -> Vec<AcknowledgmentEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Malformed acknowledgments in delivery order
    pub fn malformed_records(&self) -> Vec<MalformedAcknowledgment> {
        self.malformed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AcknowledgmentSink for RecordingSink {
    fn observe(&self, event: AcknowledgmentEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn malformed(&self, error: MalformedAcknowledgment) {
        warn!(error = %error, "Dropped malformed balance acknowledgment");
        self.malformed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }
}

impl<T: AcknowledgmentSink + ?Sized> AcknowledgmentSink for Arc<T> {
    fn observe(&self, event: AcknowledgmentEvent) {
        (**self).observe(event)
    }

    fn malformed(&self, error: MalformedAcknowledgment) {
        (**self).malformed(error)
    }
}

/// State shared between one started session and its handler
///
/// A fresh link is created for every `start` attempt, so a handler can only
/// ever affect the attempt that registered it.
#[derive(Debug, Default)]
pub(crate) struct SessionLink {
    live: AtomicBool,
    awaiting: AtomicBool,
    acknowledged: AtomicU64,
}

impl SessionLink {
    pub(crate) fn open(&self) {
        self.live.store(true, Ordering::SeqCst);
    }

    pub(crate) fn close(&self) {
        self.live.store(false, Ordering::SeqCst);
        self.awaiting.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub(crate) fn promise_sent(&self) {
        self.awaiting.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_awaiting(&self) -> bool {
        self.awaiting.load(Ordering::SeqCst)
    }

    pub(crate) fn acknowledge(&self) {
        self.awaiting.store(false, Ordering::SeqCst);
        self.acknowledged.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn acknowledged(&self) -> u64 {
        self.acknowledged.load(Ordering::SeqCst)
    }
}

/// Consumer registered for the balance endpoint while a session listens
pub struct BalanceHandler {
    link: Arc<SessionLink>,
    sink: Arc<dyn AcknowledgmentSink>,
}

impl BalanceHandler {
    pub(crate) fn new(link: Arc<SessionLink>, sink: Arc<dyn AcknowledgmentSink>) -> Self {
        Self { link, sink }
    }

    fn handle(&self, payload: &[u8]) -> Result<AcknowledgmentEvent, MalformedAcknowledgment> {
        let message: BalanceMessage =
            decode(payload).map_err(|e| MalformedAcknowledgment::Undecodable {
                reason: e.to_string(),
            })?;
        AcknowledgmentEvent::classify(message)
    }
}

impl MessageConsumer for BalanceHandler {
    fn consume(&self, payload: &[u8]) {
        if !self.link.is_live() {
            debug!("Balance acknowledgment arrived after session stopped, ignoring");
            return;
        }

        match self.handle(payload) {
            Ok(event) => {
                self.link.acknowledge();
                self.sink.observe(event);
            }
            Err(error) => self.sink.malformed(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promise_types::encode;

    fn balance(amount: u64, code: &str) -> Money {
        Money::from_code(amount, code).unwrap()
    }

    fn live_handler() -> (BalanceHandler, Arc<SessionLink>, Arc<RecordingSink>) {
        let link = Arc::new(SessionLink::default());
        link.open();
        link.promise_sent();
        let sink = Arc::new(RecordingSink::new());
        let handler = BalanceHandler::new(link.clone(), sink.clone());
        (handler, link, sink)
    }

    #[test]
    fn test_classify_accepted() {
        let event =
            AcknowledgmentEvent::classify(BalanceMessage::accepted(3, balance(10, "MYST"))).unwrap();

        assert_eq!(event.kind, AcknowledgmentKind::Accepted);
        assert_eq!(event.request_id, RequestId(3));
        assert_eq!(event.balance_text, "10MYST");
        assert_eq!(event.balance, balance(10, "MYST"));
    }

    #[test]
    fn test_classify_rejected() {
        let event =
            AcknowledgmentEvent::classify(BalanceMessage::rejected(4, balance(0, "TEST"))).unwrap();

        assert_eq!(event.kind, AcknowledgmentKind::Rejected);
        assert!(!event.is_accepted());
        assert_eq!(event.balance_text, "0TEST");
    }

    #[test]
    fn test_classify_missing_request_id() {
        let result = AcknowledgmentEvent::classify(BalanceMessage::accepted(0, balance(1, "TEST")));
        assert_eq!(
            result,
            Err(MalformedAcknowledgment::MissingRequestId {
                balance_text: "1TEST".to_string()
            })
        );
    }

    #[test]
    fn test_handler_observes_once_per_delivery() {
        let (handler, link, sink) = live_handler();

        let payload = encode(&BalanceMessage::accepted(1, balance(5, "TEST"))).unwrap();
        handler.consume(&payload);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].balance_text, "5TEST");
        assert!(!link.is_awaiting());
        assert_eq!(link.acknowledged(), 1);
    }

    #[test]
    fn test_handler_swallows_garbage() {
        let (handler, link, sink) = live_handler();

        handler.consume(b"{not json");
        handler.consume(br#"{"request_id":1,"accepted":true,"balance":{"amount":1,"currency":""}}"#);

        assert!(sink.events().is_empty());
        assert_eq!(sink.malformed_records().len(), 2);
        assert!(link.is_awaiting());

        // Still classifying after bad input
        let payload = encode(&BalanceMessage::rejected(2, balance(5, "TEST"))).unwrap();
        handler.consume(&payload);
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_closed_link_ignores_delivery() {
        let (handler, link, sink) = live_handler();
        link.close();

        let payload = encode(&BalanceMessage::accepted(1, balance(5, "TEST"))).unwrap();
        handler.consume(&payload);

        assert!(sink.events().is_empty());
        assert!(sink.malformed_records().is_empty());
        assert_eq!(link.acknowledged(), 0);
    }

    #[tokio::test]
    async fn test_channel_sink_streams_events() {
        let (sink, mut events) = ChannelSink::channel();
        let event =
            AcknowledgmentEvent::classify(BalanceMessage::accepted(9, balance(2, "TEST"))).unwrap();

        sink.observe(event.clone());
        assert_eq!(events.recv().await, Some(event));
    }

    #[test]
    fn test_channel_sink_survives_closed_receiver() {
        let (sink, events) = ChannelSink::channel();
        drop(events);

        let event =
            AcknowledgmentEvent::classify(BalanceMessage::accepted(9, balance(2, "TEST"))).unwrap();
        sink.observe(event);
    }
}
