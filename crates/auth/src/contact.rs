//! Contact channels and their display formatting.

use serde::{Deserialize, Serialize};

/// Where the (pretend) code is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactChannel {
    #[default]
    Email,
    Phone,
}

impl ContactChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactChannel::Email => "email",
            ContactChannel::Phone => "phone",
        }
    }
}

impl core::fmt::Display for ContactChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

const PHONE_DIGITS: usize = 11;

/// Render the first run of 11 digits as `+7 (999) 123-45-67`.
///
/// Text around that run is kept as typed; input without such a run is
/// returned unchanged.
pub fn format_phone_display(phone: &str) -> String {
    let bytes = phone.as_bytes();
    let Some(start) = bytes
        .windows(PHONE_DIGITS)
        .position(|w| w.iter().all(u8::is_ascii_digit))
    else {
        return phone.to_string();
    };
    let end = start + PHONE_DIGITS;
    let digits = &phone[start..end];

    format!(
        "{}+{} ({}) {}-{}-{}{}",
        &phone[..start],
        &digits[0..1],
        &digits[1..4],
        &digits[4..7],
        &digits[7..9],
        &digits[9..11],
        &phone[end..]
    )
}
