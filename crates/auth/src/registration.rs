//! Registration aggregate (mock, event-sourced).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use finansiki_core::{Aggregate, AggregateRoot, DomainError, SessionId};
use finansiki_events::Event;

use crate::ContactChannel;

/// Required length of the verification code.
pub const CODE_LENGTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationPhase {
    /// Filling in name + contact.
    #[default]
    Registering,
    /// Waiting for the code.
    Verifying,
    /// Done; terminal.
    Verified,
}

/// Registration aggregate.
///
/// # Invariants
/// - Phases only move forward: registering -> verifying -> verified.
/// - The code is never compared with anything; only its length is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    id: SessionId,
    phase: RegistrationPhase,
    name: String,
    channel: ContactChannel,
    contact: String,
    version: u64,
}

impl Registration {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            phase: RegistrationPhase::Registering,
            name: String::new(),
            channel: ContactChannel::default(),
            contact: String::new(),
            version: 0,
        }
    }

    pub fn phase(&self) -> RegistrationPhase {
        self.phase
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel(&self) -> ContactChannel {
        self.channel
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }
}

impl AggregateRoot for Registration {
    type Id = SessionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RequestCode ("send me a code").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCode {
    pub name: String,
    pub channel: ContactChannel,
    pub contact: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmCode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmCode {
    pub code: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationCommand {
    RequestCode(RequestCode),
    ConfirmCode(ConfirmCode),
}

/// Event: CodeRequested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRequested {
    pub name: String,
    pub channel: ContactChannel,
    pub contact: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RegistrationVerified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationVerified {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationEvent {
    CodeRequested(CodeRequested),
    Verified(RegistrationVerified),
}

impl Event for RegistrationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RegistrationEvent::CodeRequested(_) => "auth.registration.code_requested",
            RegistrationEvent::Verified(_) => "auth.registration.verified",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RegistrationEvent::CodeRequested(e) => e.occurred_at,
            RegistrationEvent::Verified(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Registration {
    type Command = RegistrationCommand;
    type Event = RegistrationEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            RegistrationEvent::CodeRequested(e) => {
                self.name = e.name.clone();
                self.channel = e.channel;
                self.contact = e.contact.clone();
                self.phase = RegistrationPhase::Verifying;
            }
            RegistrationEvent::Verified(_) => {
                self.phase = RegistrationPhase::Verified;
            }
        }
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            RegistrationCommand::RequestCode(cmd) => self.handle_request_code(cmd),
            RegistrationCommand::ConfirmCode(cmd) => self.handle_confirm_code(cmd),
        }
    }
}

impl Registration {
    fn handle_request_code(&self, cmd: &RequestCode) -> Result<Vec<RegistrationEvent>, DomainError> {
        if self.phase != RegistrationPhase::Registering {
            return Err(DomainError::conflict("code already requested"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if cmd.contact.trim().is_empty() {
            return Err(DomainError::validation(format!("{} cannot be empty", cmd.channel)));
        }

        Ok(vec![RegistrationEvent::CodeRequested(CodeRequested {
            name: cmd.name.trim().to_string(),
            channel: cmd.channel,
            contact: cmd.contact.trim().to_string(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_confirm_code(&self, cmd: &ConfirmCode) -> Result<Vec<RegistrationEvent>, DomainError> {
        match self.phase {
            RegistrationPhase::Registering => {
                return Err(DomainError::conflict("no code has been requested"));
            }
            RegistrationPhase::Verified => {
                return Err(DomainError::conflict("registration already verified"));
            }
            RegistrationPhase::Verifying => {}
        }

        if cmd.code.chars().count() != CODE_LENGTH {
            return Err(DomainError::validation(format!(
                "code must be {CODE_LENGTH} characters"
            )));
        }

        Ok(vec![RegistrationEvent::Verified(RegistrationVerified {
            occurred_at: cmd.occurred_at,
        })])
    }
}
