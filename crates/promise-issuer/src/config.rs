//! Issuer configuration
//!
//! The issuer identity is the only required field. Everything else has a
//! default matching the network's conventions.

use promise_types::{Identity, MessageEndpoint, Money};
use serde::{Deserialize, Serialize};

use crate::{IssuerError, Result};

/// Configuration for one promise issuer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerConfig {
    /// Identity promises are issued (and signed) as
    pub issuer: Identity,

    /// Amount promised when the proposal carries no price
    #[serde(default)]
    pub default_amount: Money,

    /// Endpoint signed promises are sent to
    #[serde(default = "MessageEndpoint::promise")]
    pub promise_endpoint: MessageEndpoint,

    /// Endpoint balance acknowledgments arrive on
    #[serde(default = "MessageEndpoint::balance")]
    pub balance_endpoint: MessageEndpoint,
}

impl IssuerConfig {
    /// Configuration with defaults for everything but the issuer
    pub fn new(issuer: Identity) -> Self {
        Self {
            issuer,
            default_amount: Money::default(),
            promise_endpoint: MessageEndpoint::promise(),
            balance_endpoint: MessageEndpoint::balance(),
        }
    }

    /// Override the default promised amount
    pub fn with_default_amount(mut self, amount: Money) -> Self {
        self.default_amount = amount;
        self
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| IssuerError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.promise_endpoint == self.balance_endpoint {
            return Err(IssuerError::Config {
                message: format!(
                    "promise and balance endpoints must differ (both {})",
                    self.promise_endpoint
                ),
            });
        }
        Ok(())
    }
}
