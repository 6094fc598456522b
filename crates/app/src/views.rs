//! Display-ready view models built from session state.
//!
//! Everything here is a pure function of the session; rendering widgets is
//! someone else's job.

use chrono::{DateTime, Utc};
use serde::Serialize;

use finansiki_ledger::{Friend, Ledger, Transaction, TransactionKind, format_balance};
use finansiki_quiz::{Quiz, option_letter};

use crate::session::Session;

/// Preset buttons in the transfer dialog.
pub const QUICK_AMOUNTS: [u64; 4] = [50, 100, 200, 500];

/// `1234567890123456` -> `1234 5678 9012 3456`.
pub fn group_card_number(number: &str) -> String {
    number
        .chars()
        .collect::<Vec<_>>()
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Date as ru-RU short date (`dd.mm.yyyy`).
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%d.%m.%Y").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub number: String,
    pub holder: String,
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendTile {
    pub id: String,
    pub name: String,
    pub initial: String,
    pub masked_card: String,
}

impl From<&Friend> for FriendTile {
    fn from(friend: &Friend) -> Self {
        Self {
            id: friend.id.to_string(),
            name: friend.name.clone(),
            initial: friend.initial().map(String::from).unwrap_or_default(),
            masked_card: format!("···· {}", friend.card_last_four()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub id: u64,
    pub kind: TransactionKind,
    pub description: String,
    pub date: String,
    /// Signed, formatted amount: `-200 ₽` or `+50 ₽`.
    pub amount: String,
}

impl From<&Transaction> for HistoryRow {
    fn from(tx: &Transaction) -> Self {
        let sign = match tx.kind {
            TransactionKind::Sent => '-',
            TransactionKind::Received | TransactionKind::Reward => '+',
        };
        Self {
            id: tx.id.0,
            kind: tx.kind,
            description: tx.description.clone(),
            date: format_date(tx.occurred_at),
            amount: format!("{sign}{}", format_balance(tx.amount.get())),
        }
    }
}

/// History tab rows, most recent first.
pub fn history_rows(ledger: &Ledger) -> Vec<HistoryRow> {
    ledger.history().map(HistoryRow::from).collect()
}

pub fn card_view(session: &Session) -> CardView {
    CardView {
        number: group_card_number(&session.card().number),
        holder: session.card().holder.clone(),
        balance: format_balance(session.balance()),
    }
}

pub fn friend_tiles(session: &Session) -> Vec<FriendTile> {
    session.friends().iter().map(FriendTile::from).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub letter: char,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum QuizView {
    Question {
        position: usize,
        total: usize,
        prompt: String,
        options: Vec<OptionView>,
        /// Present once an option was picked.
        feedback: Option<String>,
        explanation: Option<String>,
        reward_note: Option<String>,
        next_label: Option<&'static str>,
    },
    Completed {
        message: String,
    },
}

pub fn quiz_view(quiz: &Quiz) -> QuizView {
    let Some(question) = quiz.current_question() else {
        return QuizView::Completed {
            message: format!("Ты завершил игру и заработал {}₽!", quiz.score()),
        };
    };

    let (position, total) = quiz.progress();
    let revealed = quiz.is_revealed();
    let next_label = if quiz.is_last_question() {
        "Завершить игру"
    } else {
        "Следующий вопрос"
    };

    QuizView::Question {
        position,
        total,
        prompt: question.prompt.clone(),
        options: question
            .options
            .iter()
            .enumerate()
            .map(|(i, text)| OptionView {
                letter: option_letter(i),
                text: text.clone(),
            })
            .collect(),
        feedback: quiz.feedback().map(String::from),
        explanation: revealed.then(|| question.explanation.clone()),
        reward_note: (quiz.answered_correctly() == Some(true))
            .then(|| format!("+{}₽ к балансу!", question.reward)),
        next_label: revealed.then_some(next_label),
    }
}
