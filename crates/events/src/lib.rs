//! Domain events and their in-process distribution.
//!
//! Aggregates emit events; `execute` applies them; the session publishes
//! them (wrapped in an [`EventEnvelope`]) on an [`EventBus`] so views can
//! follow state changes without polling.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::execute;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
