//! Promise Issuer - issuing side of the promise protocol
//!
//! A consumer pays a provider by sending signed promises over an existing
//! dialog and listening for the provider's balance acknowledgments. This
//! crate drives that protocol for one session:
//!
//! - [`PromiseIssuer`]: the session state machine (`start` / `stop`)
//! - [`BalanceHandler`]: classifies each inbound acknowledgment
//! - [`AcknowledgmentSink`]: where classified acknowledgments go
//! - [`Dialog`]: the messaging channel the issuer depends on
//! - [`InMemoryDialog`]: an in-process dialog for loopback runs and tests
//!
//! # Usage
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use promise_crypto::Ed25519Signer;
//! # use promise_issuer::{ChannelSink, InMemoryDialog, IssuerConfig, PromiseIssuer};
//! # use promise_types::ServiceProposal;
//! # async fn run() -> promise_issuer::Result<()> {
//! let signer = Arc::new(Ed25519Signer::new());
//! let identity = signer.create_identity()?;
//! let (dialog, _provider_end) = InMemoryDialog::pair();
//! let (sink, mut events) = ChannelSink::channel();
//!
//! let issuer = PromiseIssuer::new(IssuerConfig::new(identity), dialog, signer).with_sink(sink);
//! issuer.start(&ServiceProposal::new(1, "0xprovider", "wireguard")).await?;
//! while let Some(event) = events.recv().await {
//!     println!("{} {} {}", event.kind, event.request_id, event.balance_text);
//! }
//! issuer.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod balance;
pub mod config;
pub mod dialog;
pub mod error;
pub mod issuer;
pub mod memory;

pub use balance::{
    AcknowledgmentEvent, AcknowledgmentKind, AcknowledgmentSink, BalanceHandler, ChannelSink,
    MalformedAcknowledgment, RecordingSink, TracingSink,
};
pub use config::IssuerConfig;
pub use dialog::{Dialog, MessageConsumer, TransmissionError};
pub use error::{IssuerError, Result};
pub use issuer::{PromiseIssuer, SessionPhase};
pub use memory::{Envelope, InMemoryDialog};
