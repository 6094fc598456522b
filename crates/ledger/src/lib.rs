//! Ledger module (balance + transaction history, event-sourced).
//!
//! Pure domain logic only: no IO, no rendering, no persistence concerns.

pub mod amount;
pub mod friend;
pub mod ledger;
pub mod money;
pub mod transaction;

pub use amount::Amount;
pub use friend::{Friend, FriendDirectory, FriendId};
pub use ledger::{
    CreditReward, FundsSent, Ledger, LedgerCommand, LedgerError, LedgerEvent, LedgerOpened,
    LedgerTotals, OpenLedger, RewardCredited, TransferFunds,
};
pub use money::format_balance;
pub use transaction::{Transaction, TransactionId, TransactionKind};
