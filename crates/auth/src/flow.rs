//! Async driver for the mock registration: decide, wait, then apply.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use finansiki_core::{Aggregate, DomainError, SessionId};

use crate::{
    ConfirmCode, ContactChannel, Registration, RegistrationCommand, RegistrationPhase, RequestCode,
    fake_latency,
};

/// How long each pretend round trip takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyConfig {
    pub send_code: Duration,
    pub verify_code: Duration,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            send_code: Duration::from_millis(2000),
            verify_code: Duration::from_millis(1500),
        }
    }
}

/// Outcome of a completed (mock) registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub name: String,
    pub contact: String,
    pub channel: ContactChannel,
}

/// Registration flow with simulated latency.
///
/// Each step validates first, so invalid input fails immediately; valid input
/// completes only after the configured delay. The registration is not
/// touched until the delay has elapsed.
#[derive(Debug)]
pub struct RegistrationFlow {
    registration: Registration,
    latency: LatencyConfig,
}

impl RegistrationFlow {
    pub fn new(session_id: SessionId, latency: LatencyConfig) -> Self {
        Self {
            registration: Registration::new(session_id),
            latency,
        }
    }

    pub fn phase(&self) -> RegistrationPhase {
        self.registration.phase()
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    /// Submit the registration form; resolves once the pretend code is "sent".
    pub async fn request_code(
        &mut self,
        name: &str,
        channel: ContactChannel,
        contact: &str,
    ) -> Result<(), DomainError> {
        let command = RegistrationCommand::RequestCode(RequestCode {
            name: name.to_string(),
            channel,
            contact: contact.to_string(),
            occurred_at: Utc::now(),
        });
        self.run(command, self.latency.send_code).await?;

        tracing::info!(
            session_id = %self.registration_id(),
            channel = %channel,
            "verification code requested"
        );
        Ok(())
    }

    /// Submit the code; any `CODE_LENGTH`-character input is accepted.
    pub async fn confirm_code(&mut self, code: &str) -> Result<RegisteredUser, DomainError> {
        let command = RegistrationCommand::ConfirmCode(ConfirmCode {
            code: code.to_string(),
            occurred_at: Utc::now(),
        });
        self.run(command, self.latency.verify_code).await?;

        tracing::info!(session_id = %self.registration_id(), "registration verified");
        Ok(RegisteredUser {
            name: self.registration.name().to_string(),
            contact: self.registration.contact().to_string(),
            channel: self.registration.channel(),
        })
    }

    async fn run(&mut self, command: RegistrationCommand, delay: Duration) -> Result<(), DomainError> {
        let events = self.registration.handle(&command)?;
        fake_latency(delay).await;
        for event in &events {
            self.registration.apply(event);
        }
        Ok(())
    }

    fn registration_id(&self) -> SessionId {
        *finansiki_core::AggregateRoot::id(&self.registration)
    }
}
