use serde::{Deserialize, Serialize};
use uuid::Uuid;

use finansiki_core::SessionId;

/// Envelope for an event, carrying session + stream metadata.
///
/// - `stream` names the aggregate that produced the payload (e.g. "ledger").
/// - `sequence_number` increases by one per published event within a session,
///   across all streams, so observers can detect gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    session_id: SessionId,
    stream: String,
    sequence_number: u64,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        session_id: SessionId,
        stream: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            session_id,
            stream: stream.into(),
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
