//! Immutable transaction records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use finansiki_core::Entity;

use crate::Amount;

/// Sequence number of a transaction within one ledger (1-based, creation order).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// What kind of balance change a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money sent to a friend.
    Sent,
    /// Money received (the opening balance).
    Received,
    /// Quiz reward.
    Reward,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Sent => "sent",
            TransactionKind::Received => "received",
            TransactionKind::Reward => "reward",
        }
    }

    /// Whether this kind adds to the balance.
    pub fn is_credit(&self) -> bool {
        match self {
            TransactionKind::Sent => false,
            TransactionKind::Received | TransactionKind::Reward => true,
        }
    }
}

/// One balance-affecting fact. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

impl Transaction {
    /// Effect on the balance: positive for credits, negative for debits.
    pub fn signed_amount(&self) -> i128 {
        let amount = i128::from(self.amount.get());
        if self.kind.is_credit() { amount } else { -amount }
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
