//! The quiz aggregate: one pass through a question bank.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use finansiki_core::{Aggregate, AggregateRoot, DomainError, SessionId};
use finansiki_events::Event;
use finansiki_ledger::Amount;

use crate::{Question, QuestionBank};

/// Letter shown in front of an option (`0 -> 'A'`, `1 -> 'B'`, ...).
pub fn option_letter(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .and_then(|i| b'A'.checked_add(i))
        .filter(u8::is_ascii_uppercase)
        .map(char::from)
        .unwrap_or('?')
}

/// Aggregate root: Quiz (one run through the question bank).
///
/// # Invariants
/// - At most one answer per question; a reward is emitted only for a correct one.
/// - `score` is the sum of rewards emitted since the last reset.
/// - Completion is terminal until an explicit reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: SessionId,
    bank: QuestionBank,
    current: usize,
    selected: Option<usize>,
    revealed: bool,
    score: u64,
    completed: bool,
    version: u64,
}

impl Quiz {
    pub fn new(id: SessionId, bank: QuestionBank) -> Self {
        Self {
            id,
            bank,
            current: 0,
            selected: None,
            revealed: false,
            score: 0,
            completed: false,
            version: 0,
        }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Question on screen, or `None` once the run is completed.
    pub fn current_question(&self) -> Option<&Question> {
        if self.completed {
            return None;
        }
        self.bank.get(self.current)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// `(position, total)` for the progress read-out, 1-based.
    pub fn progress(&self) -> (usize, usize) {
        (self.current + 1, self.bank.len())
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_last_question(&self) -> bool {
        self.current + 1 >= self.bank.len()
    }

    /// Whether the revealed answer was right (`None` before reveal).
    pub fn answered_correctly(&self) -> Option<bool> {
        let question = self.current_question()?;
        if !self.revealed {
            return None;
        }
        self.selected.map(|idx| question.is_correct(idx))
    }

    /// Headline shown under the options after reveal.
    pub fn feedback(&self) -> Option<&'static str> {
        self.answered_correctly()
            .map(|correct| if correct { "Правильно!" } else { "Не совсем..." })
    }
}

impl AggregateRoot for Quiz {
    type Id = SessionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: SelectAnswer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectAnswer {
    pub index: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Advance to the next question (or finish).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advance {
    pub occurred_at: DateTime<Utc>,
}

/// Command: Reset the run. Does not touch the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reset {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizCommand {
    SelectAnswer(SelectAnswer),
    Advance(Advance),
    Reset(Reset),
}

/// Event: AnswerSelected. `reward` is set only for a correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSelected {
    pub question_id: String,
    pub index: usize,
    pub correct: bool,
    pub reward: Option<Amount>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuizAdvanced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAdvanced {
    pub to_index: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuizCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizCompleted {
    pub score: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuizReset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizReset {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizEvent {
    AnswerSelected(AnswerSelected),
    Advanced(QuizAdvanced),
    Completed(QuizCompleted),
    Reset(QuizReset),
}

impl QuizEvent {
    /// Reward to credit to the ledger, if this event earned one.
    pub fn reward(&self) -> Option<Amount> {
        match self {
            QuizEvent::AnswerSelected(e) => e.reward,
            QuizEvent::Advanced(_) | QuizEvent::Completed(_) | QuizEvent::Reset(_) => None,
        }
    }
}

impl Event for QuizEvent {
    fn event_type(&self) -> &'static str {
        match self {
            QuizEvent::AnswerSelected(_) => "quiz.answer_selected",
            QuizEvent::Advanced(_) => "quiz.advanced",
            QuizEvent::Completed(_) => "quiz.completed",
            QuizEvent::Reset(_) => "quiz.reset",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            QuizEvent::AnswerSelected(e) => e.occurred_at,
            QuizEvent::Advanced(e) => e.occurred_at,
            QuizEvent::Completed(e) => e.occurred_at,
            QuizEvent::Reset(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Quiz {
    type Command = QuizCommand;
    type Event = QuizEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            QuizEvent::AnswerSelected(e) => {
                self.selected = Some(e.index);
                self.revealed = true;
                if let Some(reward) = e.reward {
                    self.score = self.score.saturating_add(reward.get());
                }
            }
            QuizEvent::Advanced(e) => {
                self.current = e.to_index;
                self.selected = None;
                self.revealed = false;
            }
            QuizEvent::Completed(_) => {
                self.completed = true;
            }
            QuizEvent::Reset(_) => {
                self.current = 0;
                self.selected = None;
                self.revealed = false;
                self.score = 0;
                self.completed = false;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            QuizCommand::SelectAnswer(cmd) => self.handle_select(cmd),
            QuizCommand::Advance(cmd) => self.handle_advance(cmd),
            QuizCommand::Reset(cmd) => Ok(vec![QuizEvent::Reset(QuizReset {
                occurred_at: cmd.occurred_at,
            })]),
        }
    }
}

impl Quiz {
    fn ensure_in_progress(&self) -> Result<&Question, DomainError> {
        if self.completed {
            return Err(DomainError::conflict("quiz already completed"));
        }
        self.bank
            .get(self.current)
            .ok_or_else(|| DomainError::invariant("current question out of range"))
    }

    fn handle_select(&self, cmd: &SelectAnswer) -> Result<Vec<QuizEvent>, DomainError> {
        let question = self.ensure_in_progress()?;

        if self.revealed {
            return Err(DomainError::conflict("question already answered"));
        }
        if cmd.index >= question.options.len() {
            return Err(DomainError::validation(format!(
                "option {} does not exist",
                cmd.index
            )));
        }

        let correct = question.is_correct(cmd.index);
        if correct && self.score.checked_add(question.reward.get()).is_none() {
            return Err(DomainError::invariant("quiz score overflow"));
        }
        Ok(vec![QuizEvent::AnswerSelected(AnswerSelected {
            question_id: question.id.clone(),
            index: cmd.index,
            correct,
            reward: correct.then_some(question.reward),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_advance(&self, cmd: &Advance) -> Result<Vec<QuizEvent>, DomainError> {
        self.ensure_in_progress()?;

        if !self.revealed {
            return Err(DomainError::conflict("answer the question first"));
        }

        if self.is_last_question() {
            Ok(vec![QuizEvent::Completed(QuizCompleted {
                score: self.score,
                occurred_at: cmd.occurred_at,
            })])
        } else {
            Ok(vec![QuizEvent::Advanced(QuizAdvanced {
                to_index: self.current + 1,
                occurred_at: cmd.occurred_at,
            })])
        }
    }
}
