//! `finansiki-app`: the session layer a presentation front end talks to.
//!
//! - [`config`]: environment knobs and reference data
//! - [`session`]: the single owner of ledger + quiz state
//! - [`views`]: display-ready models (formatted balance, history rows, ...)

pub mod config;
pub mod session;
pub mod views;

pub use config::{AppConfig, CardInfo, ConfigError, ReferenceData};
pub use session::{
    AnswerOutcome, QuizStep, Session, SessionEnvelope, SessionError, SessionEvent, TransferOutcome,
};
