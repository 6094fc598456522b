//! Positive currency amounts.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use finansiki_core::{DomainError, DomainResult, ValueObject};

/// A strictly positive amount of whole currency units.
///
/// Zero and negative values can't be represented, so anything holding an
/// `Amount` has already passed the "positive integer" check.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Amount(u64);

impl ValueObject for Amount {}

impl Amount {
    pub fn new(value: u64) -> DomainResult<Self> {
        if value == 0 {
            return Err(DomainError::validation("amount must be positive"));
        }
        Ok(Self(value))
    }

    /// Constructor for literal amounts in reference data. Use inside a
    /// `const { .. }` block so a zero literal fails to compile.
    pub const fn from_literal(value: u64) -> Self {
        assert!(value > 0, "amount must be positive");
        Self(value)
    }

    /// Parse a user-typed amount (e.g. the transfer form's text field).
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DomainError::validation("amount is required"));
        }
        if let Some(rest) = raw.strip_prefix('-') {
            if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
                return Err(DomainError::validation("amount must be positive"));
            }
        }
        let value = raw
            .strip_prefix('+')
            .unwrap_or(raw)
            .parse::<u64>()
            .map_err(|_| DomainError::validation("amount must be a whole number"))?;
        Self::new(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for Amount {
    type Error = DomainError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for u64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl FromStr for Amount {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
