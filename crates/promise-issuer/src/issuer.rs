//! The promise issuer
//!
//! Drives one session's promise protocol:
//!
//! ```text
//! Idle ──start──▶ PromiseSent ──▶ Listening ──stop──▶ Stopped
//!   ▲                │
//!   └──(failure)─────┘
//! ```
//!
//! `start` builds a promise for the proposal's provider, has it signed as the
//! configured issuer, registers the balance handler and sends the signed
//! promise. The handler is registered before the promise leaves so that no
//! acknowledgment can race past it. If sending fails the registration is
//! rolled back, so a failed `start` leaves nothing behind: no message on the
//! wire, phase still `Idle`. A rollback the dialog refuses is remembered and
//! retried before the next `start` subscribes, or by `stop`.

use std::fmt;
use std::sync::Arc;

use promise_crypto::{sign_promise, Signer};
use promise_types::{encode, Identity, Promise, PromiseMessage, ServiceProposal, SignedPromise};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::balance::SessionLink;
use crate::{
    AcknowledgmentSink, BalanceHandler, Dialog, IssuerConfig, IssuerError, Result, TracingSink,
    TransmissionError,
};

/// Lifecycle phase of an issuing session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No promise sent
    Idle,
    /// Signed promise handed to the dialog
    PromiseSent,
    /// Balance handler active
    Listening,
    /// Terminal: handler torn down
    Stopped,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::PromiseSent => "promise-sent",
            Self::Listening => "listening",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,
    provider: Option<Identity>,
    issued: Option<SignedPromise>,
    link: Option<Arc<SessionLink>>,
    /// A closed handler the dialog refused to unsubscribe
    stale_subscription: bool,
}

impl SessionState {
    fn idle() -> Self {
        Self {
            phase: SessionPhase::Idle,
            provider: None,
            issued: None,
            link: None,
            stale_subscription: false,
        }
    }

    fn transition(&mut self, to: SessionPhase) {
        debug!(from = %self.phase, to = %to, "Session phase transition");
        self.phase = to;
    }
}

/// Issues promises for a single service session
///
/// `start` and `stop` are serialised internally; acknowledgments are handled
/// on whatever task the dialog delivers them from.
pub struct PromiseIssuer {
    config: IssuerConfig,
    dialog: Arc<dyn Dialog>,
    signer: Arc<dyn Signer>,
    sink: Arc<dyn AcknowledgmentSink>,
    state: Mutex<SessionState>,
}

impl PromiseIssuer {
    /// Create an issuer that reports acknowledgments through `tracing`
    pub fn new(config: IssuerConfig, dialog: Arc<dyn Dialog>, signer: Arc<dyn Signer>) -> Self {
        Self {
            config,
            dialog,
            signer,
            sink: Arc::new(TracingSink),
            state: Mutex::new(SessionState::idle()),
        }
    }

    /// Route acknowledgment observations to `sink` instead
    pub fn with_sink(mut self, sink: impl AcknowledgmentSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Identity promises are issued as
    pub fn issuer(&self) -> &Identity {
        &self.config.issuer
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase
    }

    /// Provider of the started session
    pub async fn provider(&self) -> Option<Identity> {
        self.state.lock().await.provider.clone()
    }

    /// The promise sent by the successful `start`
    pub async fn issued_promise(&self) -> Option<SignedPromise> {
        self.state.lock().await.issued.clone()
    }

    /// Whether the sent promise still awaits its first acknowledgment
    pub async fn awaiting_acknowledgment(&self) -> bool {
        let state = self.state.lock().await;
        state.link.as_ref().is_some_and(|link| link.is_awaiting())
    }

    /// Acknowledgments classified for this session so far
    pub async fn acknowledgments(&self) -> u64 {
        let state = self.state.lock().await;
        state.link.as_ref().map_or(0, |link| link.acknowledged())
    }

    /// Start issuing promises for `proposal`
    ///
    /// Fails with [`IssuerError::InvalidState`] unless the session is Idle.
    /// Signing and dialog failures are returned as-is, without retry, and
    /// leave the session Idle.
    pub async fn start(&self, proposal: &ServiceProposal) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.phase != SessionPhase::Idle {
            return Err(IssuerError::InvalidState {
                operation: "start",
                phase: state.phase,
            });
        }

        if state.stale_subscription {
            self.dialog.unsubscribe(&self.config.balance_endpoint).await?;
            state.stale_subscription = false;
            debug!(endpoint = %self.config.balance_endpoint, "Released stale balance handler");
        }

        let provider = proposal.provider()?;
        let amount = proposal
            .price()
            .cloned()
            .unwrap_or_else(|| self.config.default_amount.clone());

        let promise = Promise::new(self.config.issuer.clone(), provider.clone(), amount);
        let signed = sign_promise(self.signer.as_ref(), promise)?;
        let payload = encode(&PromiseMessage {
            signed_promise: signed.clone(),
        })
        .map_err(|e| TransmissionError::Encoding(e.to_string()))?;

        let link = Arc::new(SessionLink::default());
        let handler = Arc::new(BalanceHandler::new(link.clone(), self.sink.clone()));
        self.dialog
            .subscribe(&self.config.balance_endpoint, handler)
            .await?;
        link.open();
        link.promise_sent();

        if let Err(err) = self
            .dialog
            .send(&self.config.promise_endpoint, payload)
            .await
        {
            link.close();
            state.stale_subscription = !self.release_subscription().await;
            return Err(err.into());
        }

        state.transition(SessionPhase::PromiseSent);
        state.provider = Some(provider);
        state.issued = Some(signed);
        state.link = Some(link);
        state.transition(SessionPhase::Listening);

        info!(
            issuer = %self.config.issuer,
            provider = %proposal.provider_id,
            proposal_id = proposal.id,
            "Promise issuing started"
        );
        Ok(())
    }

    /// Stop the session
    ///
    /// Idempotent. Once this returns, the balance handler no longer
    /// classifies anything, even if the dialog keeps delivering.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        match state.phase {
            SessionPhase::Idle => {
                if state.stale_subscription {
                    state.stale_subscription = !self.release_subscription().await;
                }
                return;
            }
            SessionPhase::Stopped => return,
            SessionPhase::PromiseSent | SessionPhase::Listening => {}
        }

        if let Some(link) = &state.link {
            link.close();
        }
        self.release_subscription().await;
        state.transition(SessionPhase::Stopped);

        info!(issuer = %self.config.issuer, "Promise issuing stopped");
    }

    /// Returns whether the dialog released the handler
    async fn release_subscription(&self) -> bool {
        match self.dialog.unsubscribe(&self.config.balance_endpoint).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    endpoint = %self.config.balance_endpoint,
                    error = %err,
                    "Failed to unsubscribe balance handler"
                );
                false
            }
        }
    }
}

impl fmt::Debug for PromiseIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseIssuer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
