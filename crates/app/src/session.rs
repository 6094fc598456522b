//! One UI session: the single owner of all mutable state.
//!
//! The presentation layer calls into [`Session`] and nothing else. Each call
//! runs synchronously to completion; ledger and quiz events it produces are
//! published on the session bus afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use finansiki_core::{Aggregate, DomainError, SessionId};
use finansiki_events::{Event, EventBus, EventEnvelope, InMemoryEventBus, Subscription, execute};
use finansiki_ledger::{
    Amount, CreditReward, FriendDirectory, FriendId, Ledger, LedgerCommand, LedgerError,
    LedgerEvent, Transaction, TransferFunds,
};
use finansiki_quiz::{Advance, Quiz, QuizCommand, QuizEvent, Reset, SelectAnswer};

use crate::config::{CardInfo, ReferenceData};

/// Stream names used in envelopes.
pub const LEDGER_STREAM: &str = "ledger";
pub const QUIZ_STREAM: &str = "quiz";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Rejected at the boundary; never reached the ledger.
    #[error("invalid input: {0}")]
    Input(DomainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("quiz: {0}")]
    Quiz(DomainError),
}

impl SessionError {
    /// Notice to show the child, if the error should be surfaced at all.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            SessionError::Ledger(e @ LedgerError::InsufficientFunds { .. }) => Some(e.user_message()),
            SessionError::Ledger(LedgerError::Domain(_)) => Some("Операция не выполнена"),
            // Inputs are disabled in the UI and repeat clicks are ignored.
            SessionError::Input(_) | SessionError::Quiz(_) => None,
        }
    }
}

/// Everything published on the session bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    Ledger(LedgerEvent),
    Quiz(QuizEvent),
}

impl Event for SessionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::Ledger(e) => e.event_type(),
            SessionEvent::Quiz(e) => e.event_type(),
        }
    }

    fn version(&self) -> u32 {
        match self {
            SessionEvent::Ledger(e) => e.version(),
            SessionEvent::Quiz(e) => e.version(),
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SessionEvent::Ledger(e) => e.occurred_at(),
            SessionEvent::Quiz(e) => e.occurred_at(),
        }
    }
}

pub type SessionEnvelope = EventEnvelope<SessionEvent>;

/// Result of a transfer that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Sent(Transaction),
    /// The friend id did not resolve; nothing changed.
    UnknownRecipient,
}

/// Result of picking a quiz option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub reward: Option<Amount>,
    pub explanation: String,
}

/// Result of moving past a revealed question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStep {
    /// Now showing the question at this 0-based index.
    NextQuestion(usize),
    Completed { score: u64 },
}

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    card: CardInfo,
    friends: FriendDirectory,
    ledger: Ledger,
    quiz: Quiz,
    bus: InMemoryEventBus<SessionEnvelope>,
    sequence: u64,
}

impl Session {
    /// Open a session with a seeded ledger and a fresh quiz run.
    pub fn start(id: SessionId, seed: Amount, reference: ReferenceData) -> Result<Self, SessionError> {
        let ledger = Ledger::open(id, seed, Utc::now())?;
        tracing::info!(session_id = %id, seed = seed.get(), "session started");

        Ok(Self {
            id,
            card: reference.card,
            friends: reference.friends,
            ledger,
            quiz: Quiz::new(id, reference.questions),
            bus: InMemoryEventBus::new(),
            sequence: 0,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn card(&self) -> &CardInfo {
        &self.card
    }

    pub fn friends(&self) -> &FriendDirectory {
        &self.friends
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn balance(&self) -> u64 {
        self.ledger.balance()
    }

    /// Follow every event published from now on.
    pub fn subscribe(&self) -> Subscription<SessionEnvelope> {
        self.bus.subscribe()
    }

    /// Send `amount` to a friend.
    ///
    /// Funds are checked first: an oversized transfer is refused even when
    /// the recipient is unknown. An unknown recipient with sufficient funds
    /// is a no-op.
    pub fn transfer(&mut self, friend_id: &FriendId, amount: Amount) -> Result<TransferOutcome, SessionError> {
        let available = self.ledger.balance();
        if amount.get() > available {
            tracing::warn!(
                session_id = %self.id,
                requested = amount.get(),
                available,
                "transfer refused: insufficient funds"
            );
            return Err(LedgerError::InsufficientFunds {
                requested: amount.get(),
                available,
            }
            .into());
        }

        let Some(recipient) = self.friends.find(friend_id).cloned() else {
            tracing::debug!(session_id = %self.id, friend_id = %friend_id, "transfer ignored: unknown recipient");
            return Ok(TransferOutcome::UnknownRecipient);
        };

        let events = execute(
            &mut self.ledger,
            &LedgerCommand::Transfer(TransferFunds {
                recipient,
                amount,
                occurred_at: Utc::now(),
            }),
        )?;
        let tx = self
            .publish_ledger(events)
            .ok_or_else(|| LedgerError::from(DomainError::invariant("transfer produced no transaction")))?;

        tracing::info!(
            session_id = %self.id,
            friend_id = %friend_id,
            amount = amount.get(),
            balance = self.ledger.balance(),
            "transfer sent"
        );
        Ok(TransferOutcome::Sent(tx))
    }

    /// Transfer straight from form input: the selected friend (if any) and
    /// the raw text of the amount field.
    pub fn transfer_input(
        &mut self,
        friend_id: Option<&FriendId>,
        raw_amount: &str,
    ) -> Result<TransferOutcome, SessionError> {
        let friend_id =
            friend_id.ok_or_else(|| SessionError::Input(DomainError::validation("choose a friend")))?;
        let amount = Amount::parse(raw_amount).map_err(SessionError::Input)?;
        self.transfer(friend_id, amount)
    }

    /// Credit a reward. Always succeeds for a sane balance.
    pub fn reward(&mut self, amount: Amount) -> Result<Transaction, SessionError> {
        let events = self.ledger.handle(&reward_command(amount))?;
        self.apply_reward(amount, events)
    }

    /// Pick an option for the current question; a correct pick is credited
    /// to the ledger before this returns.
    ///
    /// Both the quiz and the ledger decide before either is touched, so a
    /// reward the ledger refuses leaves the question unanswered.
    pub fn select_answer(&mut self, index: usize) -> Result<AnswerOutcome, SessionError> {
        let explanation = self
            .quiz
            .current_question()
            .map(|q| q.explanation.clone())
            .unwrap_or_default();

        let quiz_events = self
            .quiz
            .handle(&QuizCommand::SelectAnswer(SelectAnswer {
                index,
                occurred_at: Utc::now(),
            }))
            .map_err(SessionError::Quiz)?;
        let reward = quiz_events.iter().find_map(QuizEvent::reward);
        let ledger_events = match reward {
            Some(amount) => Some((amount, self.ledger.handle(&reward_command(amount))?)),
            None => None,
        };

        self.apply_quiz(quiz_events);
        if let Some((amount, events)) = ledger_events {
            self.apply_reward(amount, events)?;
        }

        Ok(AnswerOutcome {
            correct: reward.is_some(),
            reward,
            explanation,
        })
    }

    pub fn advance_quiz(&mut self) -> Result<QuizStep, SessionError> {
        self.run_quiz(QuizCommand::Advance(Advance {
            occurred_at: Utc::now(),
        }))?;

        if self.quiz.is_completed() {
            tracing::info!(session_id = %self.id, score = self.quiz.score(), "quiz completed");
            Ok(QuizStep::Completed {
                score: self.quiz.score(),
            })
        } else {
            Ok(QuizStep::NextQuestion(self.quiz.current_index()))
        }
    }

    /// Start the quiz over. Rewards already credited stay in the ledger.
    pub fn reset_quiz(&mut self) -> Result<(), SessionError> {
        self.run_quiz(QuizCommand::Reset(Reset {
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    fn run_quiz(&mut self, command: QuizCommand) -> Result<(), SessionError> {
        let events = self.quiz.handle(&command).map_err(SessionError::Quiz)?;
        self.apply_quiz(events);
        Ok(())
    }

    fn apply_quiz(&mut self, events: Vec<QuizEvent>) {
        for event in events {
            self.quiz.apply(&event);
            tracing::debug!(session_id = %self.id, event = event.event_type(), "quiz event");
            self.publish(QUIZ_STREAM, SessionEvent::Quiz(event));
        }
    }

    fn apply_reward(&mut self, amount: Amount, events: Vec<LedgerEvent>) -> Result<Transaction, SessionError> {
        for event in &events {
            self.ledger.apply(event);
        }
        let tx = self
            .publish_ledger(events)
            .ok_or_else(|| LedgerError::from(DomainError::invariant("reward produced no transaction")))?;

        tracing::info!(
            session_id = %self.id,
            amount = amount.get(),
            balance = self.ledger.balance(),
            "reward credited"
        );
        Ok(tx)
    }

    /// Publish ledger events, returning the last transaction they carried.
    fn publish_ledger(&mut self, events: Vec<LedgerEvent>) -> Option<Transaction> {
        let mut last = None;
        for event in events {
            last = Some(event.transaction().clone());
            self.publish(LEDGER_STREAM, SessionEvent::Ledger(event));
        }
        last
    }

    fn publish(&mut self, stream: &'static str, event: SessionEvent) {
        self.sequence += 1;
        let envelope = EventEnvelope::new(self.id, stream, self.sequence, event);
        // State is already updated; a broken bus only costs observers.
        if let Err(e) = self.bus.publish(envelope) {
            tracing::warn!(session_id = %self.id, error = ?e, "failed to publish session event");
        }
    }
}

fn reward_command(amount: Amount) -> LedgerCommand {
    LedgerCommand::Reward(CreditReward {
        amount,
        occurred_at: Utc::now(),
    })
}
