//! In-memory dialog
//!
//! Records outbound traffic, routes inbound payloads to subscribed consumers
//! and can be told to fail any of its operations. Two dialogs created by
//! [`InMemoryDialog::pair`] are connected end to end: a payload sent by one
//! is delivered to the other's consumer from a separate tokio task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use dashmap::DashMap;
use promise_types::MessageEndpoint;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::{Dialog, MessageConsumer, TransmissionError};

/// A payload addressed to an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub endpoint: MessageEndpoint,
    pub payload: Vec<u8>,
}

/// Dialog backed by process memory
#[derive(Default)]
pub struct InMemoryDialog {
    consumers: DashMap<MessageEndpoint, Arc<dyn MessageConsumer>>,
    sent: Mutex<Vec<Envelope>>,
    outbox: Option<mpsc::UnboundedSender<Envelope>>,
    fail_send: AtomicBool,
    fail_subscribe: AtomicBool,
    fail_unsubscribe: AtomicBool,
    closed: AtomicBool,
}

impl InMemoryDialog {
    /// A standalone dialog: sends are only recorded
    pub fn new() -> Self {
        Self::default()
    }

    fn with_outbox(outbox: mpsc::UnboundedSender<Envelope>) -> Self {
        Self {
            outbox: Some(outbox),
            ..Self::default()
        }
    }

    /// Two connected dialogs. Must be called inside a tokio runtime.
    pub fn pair() -> (Arc<Self>, Arc<Self>) {
        let (to_right, from_left) = mpsc::unbounded_channel();
        let (to_left, from_right) = mpsc::unbounded_channel();

        let left = Arc::new(Self::with_outbox(to_right));
        let right = Arc::new(Self::with_outbox(to_left));

        spawn_pump(from_left, Arc::downgrade(&right));
        spawn_pump(from_right, Arc::downgrade(&left));

        (left, right)
    }

    /// Hand an inbound payload to the endpoint's consumer
    ///
    /// Returns whether a consumer was subscribed.
    pub fn deliver(&self, endpoint: &MessageEndpoint, payload: &[u8]) -> bool {
        // Release the map guard before calling out
        let consumer = self
            .consumers
            .get(endpoint)
            .map(|entry| Arc::clone(entry.value()));

        match consumer {
            Some(consumer) => {
                consumer.consume(payload);
                true
            }
            None => {
                debug!(endpoint = %endpoint, "No consumer for inbound payload");
                false
            }
        }
    }

    pub fn is_subscribed(&self, endpoint: &MessageEndpoint) -> bool {
        self.consumers.contains_key(endpoint)
    }

    /// Everything sent so far, in order
    pub async fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().await.clone()
    }

    /// Payloads sent to one endpoint, in order
    pub async fn sent_to(&self, endpoint: &MessageEndpoint) -> Vec<Vec<u8>> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|envelope| &envelope.endpoint == endpoint)
            .map(|envelope| envelope.payload.clone())
            .collect()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    pub fn fail_subscribes(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    pub fn fail_unsubscribes(&self, fail: bool) {
        self.fail_unsubscribe.store(fail, Ordering::SeqCst);
    }

    /// Refuse all further sends
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

fn spawn_pump(mut inbound: mpsc::UnboundedReceiver<Envelope>, target: Weak<InMemoryDialog>) {
    tokio::spawn(async move {
        while let Some(envelope) = inbound.recv().await {
            let Some(target) = target.upgrade() else {
                break;
            };
            target.deliver(&envelope.endpoint, &envelope.payload);
        }
    });
}

#[async_trait]
impl Dialog for InMemoryDialog {
    async fn send(
        &self,
        endpoint: &MessageEndpoint,
        payload: Vec<u8>,
    ) -> Result<(), TransmissionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransmissionError::Closed);
        }
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(TransmissionError::SendFailed {
                endpoint: endpoint.to_string(),
                reason: "send failure injected".to_string(),
            });
        }

        let envelope = Envelope {
            endpoint: endpoint.clone(),
            payload,
        };
        debug!(endpoint = %endpoint, bytes = envelope.payload.len(), "Dialog send");

        if let Some(outbox) = &self.outbox {
            outbox
                .send(envelope.clone())
                .map_err(|_| TransmissionError::Closed)?;
        }
        self.sent.lock().await.push(envelope);
        Ok(())
    }

    async fn subscribe(
        &self,
        endpoint: &MessageEndpoint,
        consumer: Arc<dyn MessageConsumer>,
    ) -> Result<(), TransmissionError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(TransmissionError::SubscribeFailed {
                endpoint: endpoint.to_string(),
                reason: "subscribe failure injected".to_string(),
            });
        }

        match self.consumers.entry(endpoint.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(TransmissionError::AlreadySubscribed {
                endpoint: endpoint.to_string(),
            }),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(consumer);
                debug!(endpoint = %endpoint, "Dialog subscribe");
                Ok(())
            }
        }
    }

    async fn unsubscribe(&self, endpoint: &MessageEndpoint) -> Result<(), TransmissionError> {
        if self.fail_unsubscribe.load(Ordering::SeqCst) {
            return Err(TransmissionError::UnsubscribeFailed {
                endpoint: endpoint.to_string(),
                reason: "unsubscribe failure injected".to_string(),
            });
        }

        self.consumers.remove(endpoint);
        debug!(endpoint = %endpoint, "Dialog unsubscribe");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct Collect(StdMutex<Vec<Vec<u8>>>);

    impl MessageConsumer for Collect {
        fn consume(&self, payload: &[u8]) {
            self.0.lock().unwrap().push(payload.to_vec());
        }
    }

    fn endpoint() -> MessageEndpoint {
        MessageEndpoint::new("test")
    }

    #[tokio::test]
    async fn test_send_is_recorded() {
        let dialog = InMemoryDialog::new();
        dialog.send(&endpoint(), b"one".to_vec()).await.unwrap();
        dialog
            .send(&MessageEndpoint::new("other"), b"two".to_vec())
            .await
            .unwrap();

        assert_eq!(dialog.sent().await.len(), 2);
        assert_eq!(dialog.sent_to(&endpoint()).await, vec![b"one".to_vec()]);
    }

    #[tokio::test]
    async fn test_deliver_after_unsubscribe() {
        let dialog = InMemoryDialog::new();
        let consumer = Arc::new(Collect::default());
        dialog.subscribe(&endpoint(), consumer.clone()).await.unwrap();

        assert!(dialog.deliver(&endpoint(), b"first"));
        dialog.unsubscribe(&endpoint()).await.unwrap();
        assert!(!dialog.deliver(&endpoint(), b"second"));

        assert_eq!(consumer.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_second_subscribe_rejected() {
        let dialog = InMemoryDialog::new();
        dialog
            .subscribe(&endpoint(), Arc::new(Collect::default()))
            .await
            .unwrap();

        let result = dialog
            .subscribe(&endpoint(), Arc::new(Collect::default()))
            .await;
        assert!(matches!(
            result,
            Err(TransmissionError::AlreadySubscribed { .. })
        ));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let dialog = InMemoryDialog::new();
        dialog.fail_sends(true);
        dialog.fail_subscribes(true);
        dialog.fail_unsubscribes(true);

        assert!(dialog.send(&endpoint(), vec![]).await.is_err());
        assert!(dialog
            .subscribe(&endpoint(), Arc::new(Collect::default()))
            .await
            .is_err());
        assert!(dialog.unsubscribe(&endpoint()).await.is_err());
        assert!(dialog.sent().await.is_empty());

        dialog.fail_sends(false);
        dialog.close();
        assert_eq!(
            dialog.send(&endpoint(), vec![]).await,
            Err(TransmissionError::Closed)
        );
    }

    #[tokio::test]
    async fn test_pair_delivers_to_peer() {
        let (left, right) = InMemoryDialog::pair();
        let (tx, mut rx) = mpsc::unbounded_channel();

        struct Forward(mpsc::UnboundedSender<Vec<u8>>);
        impl MessageConsumer for Forward {
            fn consume(&self, payload: &[u8]) {
                let _ = self.0.send(payload.to_vec());
            }
        }

        right.subscribe(&endpoint(), Arc::new(Forward(tx))).await.unwrap();
        left.send(&endpoint(), b"hello".to_vec()).await.unwrap();

        assert_eq!(rx.recv().await, Some(b"hello".to_vec()));
        assert_eq!(left.sent().await.len(), 1);
    }
}
