//! Service proposals
//!
//! A proposal names the provider a session pays and, optionally, the price it
//! asks for. Discovery of proposals happens elsewhere.

use crate::{Identity, Money, Result};
use serde::{Deserialize, Serialize};

/// Price terms attached to a proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTerms {
    pub price: Money,
}

/// A provider's offer of a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProposal {
    pub id: u64,
    pub provider_id: String,
    pub service_type: String,
    #[serde(default)]
    pub payment: Option<PaymentTerms>,
}

impl ServiceProposal {
    pub fn new(id: u64, provider_id: impl Into<String>, service_type: impl Into<String>) -> Self {
        Self {
            id,
            provider_id: provider_id.into(),
            service_type: service_type.into(),
            payment: None,
        }
    }

    /// Attach a price to the proposal
    pub fn with_price(mut self, price: Money) -> Self {
        self.payment = Some(PaymentTerms { price });
        self
    }

    /// Provider identity parsed from the proposal
    pub fn provider(&self) -> Result<Identity> {
        Identity::from_address(&self.provider_id)
    }

    /// Price asked by the provider, if any
    pub fn price(&self) -> Option<&Money> {
        self.payment.as_ref().map(|terms| &terms.price)
    }
}
