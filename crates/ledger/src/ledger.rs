//! The ledger aggregate: balance plus newest-first transaction history.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use finansiki_core::{Aggregate, AggregateRoot, DomainError, SessionId};
use finansiki_events::Event;

use crate::{Amount, Friend, FriendId, Transaction, TransactionId, TransactionKind};

/// Description of the seeded opening transaction.
pub const OPENING_DESCRIPTION: &str = "Начальный баланс";

/// Description of every quiz reward.
pub const REWARD_DESCRIPTION: &str = "Награда за правильный ответ";

/// Ledger error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Transfer amount exceeds the current balance. Nothing was changed.
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },

    #[error("{0}")]
    Domain(#[from] DomainError),
}

impl LedgerError {
    /// Message shown to the child when the operation is refused.
    pub fn user_message(&self) -> &'static str {
        match self {
            LedgerError::InsufficientFunds { .. } => "Недостаточно средств!",
            LedgerError::Domain(_) => "Операция не выполнена",
        }
    }
}

/// Aggregate root: Ledger (balance + history of one session).
///
/// # Invariants
/// - `balance` equals the signed sum of `history`.
/// - `history` is most-recent-first; entries are only ever pushed to the front.
/// - Transaction ids count up from 1 in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    id: SessionId,
    balance: u64,
    history: VecDeque<Transaction>,
    version: u64,
    opened: bool,
}

impl Ledger {
    /// Empty aggregate, not yet opened.
    pub fn empty(id: SessionId) -> Self {
        Self {
            id,
            balance: 0,
            history: VecDeque::new(),
            version: 0,
            opened: false,
        }
    }

    /// Build a ledger already seeded with its opening transaction.
    pub fn open(id: SessionId, seed: Amount, occurred_at: DateTime<Utc>) -> Result<Self, LedgerError> {
        let mut ledger = Self::empty(id);
        finansiki_events::execute(
            &mut ledger,
            &LedgerCommand::Open(OpenLedger {
                session_id: id,
                seed,
                occurred_at,
            }),
        )?;
        Ok(ledger)
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /// Transactions, most recent first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &Transaction> {
        self.history.iter()
    }

    /// The most recent transaction.
    pub fn latest(&self) -> Option<&Transaction> {
        self.history.front()
    }

    pub fn totals(&self) -> LedgerTotals {
        let mut totals = LedgerTotals::default();
        for tx in &self.history {
            let amount = u128::from(tx.amount.get());
            match tx.kind {
                TransactionKind::Sent => totals.sent += amount,
                TransactionKind::Received => totals.received += amount,
                TransactionKind::Reward => totals.rewarded += amount,
            }
        }
        totals
    }

    /// Recompute the balance from history and compare with the stored one.
    pub fn verify_consistency(&self) -> Result<(), LedgerError> {
        let net: i128 = self.history.iter().map(Transaction::signed_amount).sum();
        if net != i128::from(self.balance) {
            return Err(DomainError::invariant(format!(
                "balance {} does not match history net {net}",
                self.balance
            ))
            .into());
        }
        Ok(())
    }

    fn next_transaction_id(&self) -> TransactionId {
        TransactionId(self.history.len() as u64 + 1)
    }
}

/// Per-kind sums over the whole history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub received: u128,
    pub sent: u128,
    pub rewarded: u128,
}

impl AggregateRoot for Ledger {
    type Id = SessionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: OpenLedger (seed the starting balance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenLedger {
    pub session_id: SessionId,
    pub seed: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Command: TransferFunds to an already-resolved friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFunds {
    pub recipient: Friend,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CreditReward for a correct quiz answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditReward {
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    Open(OpenLedger),
    Transfer(TransferFunds),
    Reward(CreditReward),
}

/// Event: LedgerOpened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOpened {
    pub session_id: SessionId,
    pub transaction: Transaction,
}

/// Event: FundsSent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsSent {
    pub recipient_id: FriendId,
    pub transaction: Transaction,
}

/// Event: RewardCredited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardCredited {
    pub transaction: Transaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Opened(LedgerOpened),
    FundsSent(FundsSent),
    RewardCredited(RewardCredited),
}

impl LedgerEvent {
    pub fn transaction(&self) -> &Transaction {
        match self {
            LedgerEvent::Opened(e) => &e.transaction,
            LedgerEvent::FundsSent(e) => &e.transaction,
            LedgerEvent::RewardCredited(e) => &e.transaction,
        }
    }
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::Opened(_) => "ledger.opened",
            LedgerEvent::FundsSent(_) => "ledger.funds_sent",
            LedgerEvent::RewardCredited(_) => "ledger.reward_credited",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.transaction().occurred_at
    }
}

impl Aggregate for Ledger {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = LedgerError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::Opened(e) => {
                self.id = e.session_id;
                self.opened = true;
            }
            LedgerEvent::FundsSent(_) | LedgerEvent::RewardCredited(_) => {}
        }

        let tx = event.transaction();
        let amount = tx.amount.get();
        self.balance = if tx.kind.is_credit() {
            self.balance.saturating_add(amount)
        } else {
            self.balance.saturating_sub(amount)
        };
        self.history.push_front(tx.clone());

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LedgerCommand::Open(cmd) => self.handle_open(cmd),
            LedgerCommand::Transfer(cmd) => self.handle_transfer(cmd),
            LedgerCommand::Reward(cmd) => self.handle_reward(cmd),
        }
    }
}

impl Ledger {
    fn ensure_opened(&self) -> Result<(), DomainError> {
        if !self.opened {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn handle_open(&self, cmd: &OpenLedger) -> Result<Vec<LedgerEvent>, LedgerError> {
        if self.opened {
            return Err(DomainError::conflict("ledger already opened").into());
        }

        Ok(vec![LedgerEvent::Opened(LedgerOpened {
            session_id: cmd.session_id,
            transaction: Transaction {
                id: self.next_transaction_id(),
                kind: TransactionKind::Received,
                amount: cmd.seed,
                description: OPENING_DESCRIPTION.to_string(),
                occurred_at: cmd.occurred_at,
            },
        })])
    }

    fn handle_transfer(&self, cmd: &TransferFunds) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.ensure_opened()?;

        let requested = cmd.amount.get();
        if requested > self.balance {
            return Err(LedgerError::InsufficientFunds {
                requested,
                available: self.balance,
            });
        }

        Ok(vec![LedgerEvent::FundsSent(FundsSent {
            recipient_id: cmd.recipient.id.clone(),
            transaction: Transaction {
                id: self.next_transaction_id(),
                kind: TransactionKind::Sent,
                amount: cmd.amount,
                description: format!("Перевод для {}", cmd.recipient.name),
                occurred_at: cmd.occurred_at,
            },
        })])
    }

    fn handle_reward(&self, cmd: &CreditReward) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.ensure_opened()?;

        if self.balance.checked_add(cmd.amount.get()).is_none() {
            return Err(DomainError::invariant("balance overflow").into());
        }

        Ok(vec![LedgerEvent::RewardCredited(RewardCredited {
            transaction: Transaction {
                id: self.next_transaction_id(),
                kind: TransactionKind::Reward,
                amount: cmd.amount,
                description: REWARD_DESCRIPTION.to_string(),
                occurred_at: cmd.occurred_at,
            },
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finansiki_events::execute;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn amount(value: u64) -> Amount {
        Amount::new(value).unwrap()
    }

    fn seeded(seed: u64) -> Ledger {
        Ledger::open(SessionId::new(), amount(seed), now()).unwrap()
    }

    fn anya() -> Friend {
        Friend::new("1", "Аня", "1234567890123456")
    }

    fn transfer(ledger: &mut Ledger, value: u64) -> Result<Vec<LedgerEvent>, LedgerError> {
        execute(
            ledger,
            &LedgerCommand::Transfer(TransferFunds {
                recipient: anya(),
                amount: amount(value),
                occurred_at: now(),
            }),
        )
    }

    fn reward(ledger: &mut Ledger, value: u64) -> Result<Vec<LedgerEvent>, LedgerError> {
        execute(
            ledger,
            &LedgerCommand::Reward(CreditReward {
                amount: amount(value),
                occurred_at: now(),
            }),
        )
    }

    #[test]
    fn open_seeds_one_received_transaction() {
        let ledger = seeded(1000);

        assert_eq!(ledger.balance(), 1000);
        assert_eq!(ledger.version(), 1);
        let head = ledger.latest().unwrap();
        assert_eq!(head.id, TransactionId(1));
        assert_eq!(head.kind, TransactionKind::Received);
        assert_eq!(head.amount.get(), 1000);
        assert_eq!(head.description, OPENING_DESCRIPTION);
    }

    #[test]
    fn opening_twice_is_a_conflict() {
        let ledger = seeded(1000);
        let err = ledger
            .handle(&LedgerCommand::Open(OpenLedger {
                session_id: *ledger.id(),
                seed: amount(5),
                occurred_at: now(),
            }))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Domain(DomainError::Conflict(_))));
    }

    #[test]
    fn transfer_before_open_is_not_found() {
        let mut ledger = Ledger::empty(SessionId::new());
        let err = transfer(&mut ledger, 10).unwrap_err();
        assert_eq!(err, LedgerError::Domain(DomainError::NotFound));
    }

    #[test]
    fn transfer_then_reward_scenario() {
        let mut ledger = seeded(1000);

        transfer(&mut ledger, 200).unwrap();
        assert_eq!(ledger.balance(), 800);
        let head = ledger.latest().unwrap();
        assert_eq!(head.kind, TransactionKind::Sent);
        assert_eq!(head.amount.get(), 200);
        assert_eq!(head.description, "Перевод для Аня");

        reward(&mut ledger, 50).unwrap();
        assert_eq!(ledger.balance(), 850);
        let head = ledger.latest().unwrap();
        assert_eq!(head.kind, TransactionKind::Reward);
        assert_eq!(head.amount.get(), 50);
        assert_eq!(head.description, REWARD_DESCRIPTION);

        let before = ledger.clone();
        let err = transfer(&mut ledger, 2000).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                requested: 2000,
                available: 850
            }
        );
        assert_eq!(err.user_message(), "Недостаточно средств!");
        assert_eq!(ledger, before);
    }

    #[test]
    fn transfer_of_entire_balance_is_allowed() {
        let mut ledger = seeded(300);
        transfer(&mut ledger, 300).unwrap();
        assert_eq!(ledger.balance(), 0);
        assert!(transfer(&mut ledger, 1).is_err());
    }

    #[test]
    fn history_is_most_recent_first_with_sequential_ids() {
        let mut ledger = seeded(1000);
        transfer(&mut ledger, 10).unwrap();
        reward(&mut ledger, 20).unwrap();
        transfer(&mut ledger, 30).unwrap();

        let ids: Vec<u64> = ledger.history().map(|tx| tx.id.0).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
        let kinds: Vec<TransactionKind> = ledger.history().map(|tx| tx.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TransactionKind::Sent,
                TransactionKind::Reward,
                TransactionKind::Sent,
                TransactionKind::Received
            ]
        );
    }

    #[test]
    fn totals_split_by_kind() {
        let mut ledger = seeded(1000);
        transfer(&mut ledger, 200).unwrap();
        reward(&mut ledger, 50).unwrap();
        reward(&mut ledger, 75).unwrap();

        assert_eq!(
            ledger.totals(),
            LedgerTotals {
                received: 1000,
                sent: 200,
                rewarded: 125
            }
        );
        ledger.verify_consistency().unwrap();
    }

    #[test]
    fn reward_overflow_is_rejected() {
        let mut ledger = seeded(u64::MAX);
        let err = reward(&mut ledger, 1).unwrap_err();
        assert!(matches!(err, LedgerError::Domain(DomainError::InvariantViolation(_))));
        assert_eq!(ledger.balance(), u64::MAX);
    }

    #[test]
    fn totals_outgrow_the_balance_type() {
        let mut ledger = seeded(u64::MAX);
        transfer(&mut ledger, u64::MAX).unwrap();
        reward(&mut ledger, u64::MAX).unwrap();
        transfer(&mut ledger, u64::MAX).unwrap();

        let totals = ledger.totals();
        assert_eq!(totals.sent, 2 * u128::from(u64::MAX));
        assert_eq!(totals.received, u128::from(u64::MAX));
        assert_eq!(totals.rewarded, u128::from(u64::MAX));
        assert_eq!(ledger.balance(), 0);
        ledger.verify_consistency().unwrap();
    }

    #[derive(Debug, Clone)]
    enum Op {
        Transfer(u64),
        Reward(u64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u64..2_000).prop_map(Op::Transfer),
            (1u64..500).prop_map(Op::Reward),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: final balance = seed + rewards - successful transfers, and
        /// history grows by exactly one entry per successful operation.
        #[test]
        fn balance_matches_applied_operations(
            seed in 1u64..5_000,
            ops in prop::collection::vec(op_strategy(), 0..40)
        ) {
            let mut ledger = seeded(seed);
            let mut expected: u64 = seed;
            let mut applied = 0usize;

            for op in ops {
                match op {
                    Op::Transfer(value) => {
                        let before_len = ledger.history().len();
                        match transfer(&mut ledger, value) {
                            Ok(_) => {
                                expected -= value;
                                applied += 1;
                            }
                            Err(LedgerError::InsufficientFunds { requested, available }) => {
                                prop_assert!(requested > available);
                                prop_assert_eq!(ledger.history().len(), before_len);
                            }
                            Err(other) => prop_assert!(false, "unexpected error: {other}"),
                        }
                    }
                    Op::Reward(value) => {
                        reward(&mut ledger, value).unwrap();
                        expected += value;
                        applied += 1;
                    }
                }
                prop_assert_eq!(ledger.balance(), expected);
            }

            prop_assert_eq!(ledger.history().len(), 1 + applied);
            prop_assert!(ledger.verify_consistency().is_ok());
            prop_assert_eq!(ledger.version(), 1 + applied as u64);
        }
    }
}
