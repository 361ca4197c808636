//! Promise Types - Canonical domain types for the promise issuance protocol
//!
//! This crate contains the foundational types shared by the issuing side and
//! the messaging layer, with zero dependencies on other workspace crates:
//!
//! - Identity addresses of issuers and providers
//! - Currency codes and money amounts with a canonical text rendering
//! - Promises and signed promises
//! - Balance acknowledgments sent back by the provider
//! - Service proposals that a session is started for
//!
//! # Protocol Flow
//!
//! ```text
//! Proposal → Promise → SignedPromise ─(promise-create)→ Provider
//!                                     ←(promise-balance)─ BalanceMessage
//! ```

pub mod identity;
pub mod money;
pub mod promise;
pub mod message;
pub mod proposal;
pub mod error;

pub use identity::*;
pub use money::*;
pub use promise::*;
pub use message::*;
pub use proposal::*;
pub use error::*;
