//! Quiz mini-game (event-sourced).
//!
//! A fixed, ordered question bank walked one question at a time. Correct
//! answers produce a reward that the session credits to the ledger; the quiz
//! itself never touches balances.

pub mod bank;
pub mod quiz;

pub use bank::{Question, QuestionBank};
pub use quiz::{
    Advance, AnswerSelected, Quiz, QuizAdvanced, QuizCommand, QuizCompleted, QuizEvent, QuizReset,
    Reset, SelectAnswer, option_letter,
};
