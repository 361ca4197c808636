//! Currency and money types
//!
//! Promises carry whole units of a single currency. The canonical text form
//! of a money value is the amount immediately followed by the currency code
//! (`10MYST`), which is what acknowledgment observations carry.

use crate::{Result, TypesError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency code (e.g. `MYST`)
///
/// Codes are non-empty and ASCII alphanumeric. Deserialization goes through
/// the same validation, so a decoded `Currency` is always renderable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Create a validated currency code
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TypesError::InvalidCurrency { code });
        }
        Ok(Self(code))
    }

    /// The network's native token
    pub fn myst() -> Self {
        Self("MYST".to_string())
    }

    /// Get the currency code
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::myst()
    }
}

impl TryFrom<String> for Currency {
    type Error = TypesError;

    fn try_from(code: String) -> Result<Self> {
        Self::new(code)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An amount of a currency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Whole units
    pub amount: u64,
    /// The currency
    pub currency: Currency,
}

impl Money {
    /// Create a new money value
    pub fn new(amount: u64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Create a money value from a raw currency code
    pub fn from_code(amount: u64, code: &str) -> Result<Self> {
        Ok(Self::new(amount, Currency::new(code)?))
    }

    /// Zero of the given currency
    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Check if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Add two values of the same currency
    pub fn checked_add(&self, other: &Money) -> Result<Money> {
        if self.currency != other.currency {
            return Err(TypesError::CurrencyMismatch {
                expected: self.currency.to_string(),
                actual: other.currency.to_string(),
            });
        }
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(TypesError::AmountOverflow)?;
        Ok(Self::new(amount, self.currency.clone()))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::new(10, Currency::myst())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_rendering() {
        assert_eq!(Money::from_code(10, "MYST").unwrap().to_string(), "10MYST");
        assert_eq!(Money::from_code(5, "TEST").unwrap().to_string(), "5TEST");
        assert_eq!(Money::zero(Currency::myst()).to_string(), "0MYST");
    }

    #[test]
    fn test_invalid_currency() {
        assert!(Currency::new("").is_err());
        assert!(Currency::new("MY ST").is_err());
        assert!(Currency::new("€").is_err());
    }

    #[test]
    fn test_currency_validated_on_decode() {
        let ok: Money = serde_json::from_str(r#"{"amount":3,"currency":"TEST"}"#).unwrap();
        assert_eq!(ok.currency.code(), "TEST");

        let bad = serde_json::from_str::<Money>(r#"{"amount":3,"currency":""}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_checked_add() {
        let a = Money::from_code(4, "TEST").unwrap();
        let b = Money::from_code(6, "TEST").unwrap();
        assert_eq!(a.checked_add(&b).unwrap().to_string(), "10TEST");

        let other = Money::from_code(1, "MYST").unwrap();
        assert!(matches!(
            a.checked_add(&other),
            Err(TypesError::CurrencyMismatch { .. })
        ));

        let max = Money::from_code(u64::MAX, "TEST").unwrap();
        assert!(matches!(max.checked_add(&a), Err(TypesError::AmountOverflow)));
    }
}
