//! `finansiki-core`: domain building blocks shared by every Finansiki crate.
//!
//! Pure domain primitives only: no IO, no async, no rendering.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::SessionId;
pub use value_object::ValueObject;
