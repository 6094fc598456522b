//! `finansiki-auth`: mock registration and verification.
//!
//! Nothing here authenticates anyone. The "verification code" is accepted on
//! length alone and both steps complete after [`fake_latency`], standing in
//! for server round trips that do not exist.

pub mod contact;
pub mod flow;
pub mod latency;
pub mod registration;

pub use contact::{ContactChannel, format_phone_display};
pub use flow::{LatencyConfig, RegisteredUser, RegistrationFlow};
pub use latency::fake_latency;
pub use registration::{
    CODE_LENGTH, CodeRequested, ConfirmCode, Registration, RegistrationCommand, RegistrationEvent,
    RegistrationPhase, RegistrationVerified, RequestCode,
};
