//! Promise Loopback
//!
//! Starts an issuing session against a simulated provider connected through
//! an in-memory dialog pair. The provider answers the signed promise with a
//! series of balance acknowledgments; each classified acknowledgment is
//! printed as it arrives, then the session is stopped.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run -p promise-loopback -- --amount 5 --currency TEST --acks 4 --reject-every 3
//! ```

use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use promise_crypto::{Ed25519Signer, KeyPair};
use promise_issuer::{
    ChannelSink, Dialog, InMemoryDialog, IssuerConfig, MessageConsumer, PromiseIssuer,
};
use promise_types::{
    decode, encode, BalanceMessage, MessageEndpoint, Money, PromiseMessage, ServiceProposal,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Run one promise issuing session against a simulated provider
#[derive(Parser, Debug)]
#[command(name = "promise-loopback")]
#[command(version)]
#[command(about = "Issue a signed promise over a loopback dialog and print the provider's acknowledgments", long_about = None)]
struct Args {
    /// Price the provider asks for (whole units)
    #[arg(long, default_value_t = 10)]
    amount: u64,

    /// Currency code of the price
    #[arg(long, default_value = "MYST")]
    currency: String,

    /// Number of acknowledgments the provider sends
    #[arg(long, default_value_t = 3)]
    acks: u64,

    /// Reject every n-th acknowledgment (0 = never)
    #[arg(long, default_value_t = 0)]
    reject_every: u64,

    /// Hex-encoded 32-byte seed for the issuer key (random when omitted)
    #[arg(long)]
    seed: Option<String>,

    /// Seconds to wait for each acknowledgment
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
}

/// Answers every promise with `acks` acknowledgments of a growing balance
struct SimulatedProvider {
    dialog: Weak<InMemoryDialog>,
    acks: u64,
    reject_every: u64,
}

impl MessageConsumer for SimulatedProvider {
    fn consume(&self, payload: &[u8]) {
        let message: PromiseMessage = match decode(payload) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(error = %err, "Provider received undecodable promise");
                return;
            }
        };
        let Some(dialog) = self.dialog.upgrade() else {
            return;
        };

        let promised = message.signed_promise.promise().amount().clone();
        tracing::info!(
            issuer = %message.signed_promise.promise().issuer(),
            amount = %promised,
            "Provider received promise"
        );

        let (acks, reject_every) = (self.acks, self.reject_every);
        tokio::spawn(async move {
            for request_id in 1..=acks {
                let Some(balance) = running_balance(&promised, request_id) else {
                    tracing::warn!(request_id, amount = %promised, "Balance overflows, provider stops acknowledging");
                    return;
                };
                let reply = if reject_every != 0 && request_id % reject_every == 0 {
                    BalanceMessage::rejected(request_id, balance)
                } else {
                    BalanceMessage::accepted(request_id, balance)
                };

                let sent = match encode(&reply) {
                    Ok(payload) => dialog
                        .send(&MessageEndpoint::balance(), payload)
                        .await
                        .map_err(|e| e.to_string()),
                    Err(err) => Err(err.to_string()),
                };
                if let Err(err) = sent {
                    tracing::warn!(error = %err, "Provider failed to acknowledge");
                    return;
                }
            }
        });
    }
}

/// Balance after `request_id` promises of `promised`
fn running_balance(promised: &Money, request_id: u64) -> Option<Money> {
    promised
        .amount
        .checked_mul(request_id)
        .map(|amount| Money::new(amount, promised.currency.clone()))
}

fn issuer_key(seed: Option<&str>) -> anyhow::Result<KeyPair> {
    let Some(seed) = seed else {
        return Ok(KeyPair::generate());
    };
    let bytes: [u8; 32] = hex::decode(seed)
        .context("seed is not valid hex")?
        .try_into()
        .map_err(|_| anyhow::anyhow!("seed must be 32 bytes"))?;
    Ok(KeyPair::from_bytes(&bytes))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let price = Money::from_code(args.amount, &args.currency)?;
    if running_balance(&price, args.acks).is_none() {
        bail!("{} acknowledgments of {} overflow the balance", args.acks, price);
    }

    let signer = Arc::new(Ed25519Signer::new());
    let issuer_id = signer.add_key(issuer_key(args.seed.as_deref())?)?;
    let provider_id = KeyPair::generate().identity()?;

    let (issuer_end, provider_end) = InMemoryDialog::pair();
    provider_end
        .subscribe(
            &MessageEndpoint::promise(),
            Arc::new(SimulatedProvider {
                dialog: Arc::downgrade(&provider_end),
                acks: args.acks,
                reject_every: args.reject_every,
            }),
        )
        .await?;

    let (sink, mut events) = ChannelSink::channel();
    let issuer = PromiseIssuer::new(IssuerConfig::new(issuer_id.clone()), issuer_end, signer)
        .with_sink(sink);

    tracing::info!(issuer = %issuer_id, provider = %provider_id, "Starting loopback session");
    let proposal = ServiceProposal::new(1, provider_id.address(), "loopback").with_price(price);
    issuer.start(&proposal).await?;

    let wait = Duration::from_secs(args.timeout_secs);
    for _ in 0..args.acks {
        let event = match tokio::time::timeout(wait, events.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) => bail!("acknowledgment stream closed"),
            Err(_) => bail!("no acknowledgment within {}s", args.timeout_secs),
        };
        println!("{:<8} request={} balance={}", event.kind, event.request_id, event.balance_text);
    }

    issuer.stop().await;
    println!("session {}", issuer.phase().await);
    Ok(())
}
