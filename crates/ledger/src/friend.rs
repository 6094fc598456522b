//! Friends: the fixed set of transfer recipients.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use finansiki_core::{DomainError, DomainResult, Entity};

/// Identifier of a friend in the reference data (e.g. `"1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FriendId(String);

impl FriendId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for FriendId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A transfer recipient. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub id: FriendId,
    pub name: String,
    pub card_number: String,
}

impl Friend {
    pub fn new(id: impl Into<String>, name: impl Into<String>, card_number: impl Into<String>) -> Self {
        Self {
            id: FriendId::new(id),
            name: name.into(),
            card_number: card_number.into(),
        }
    }

    /// First letter of the name, used as an avatar placeholder.
    pub fn initial(&self) -> Option<char> {
        self.name.chars().next()
    }

    /// Last four digits of the card number.
    pub fn card_last_four(&self) -> &str {
        let start = self
            .card_number
            .char_indices()
            .rev()
            .nth(3)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        &self.card_number[start..]
    }
}

impl Entity for Friend {
    type Id = FriendId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Lookup table over the friend list, preserving configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendDirectory {
    friends: Vec<Friend>,
}

impl FriendDirectory {
    /// Build a directory, rejecting duplicate ids, blank names and
    /// non-numeric card numbers.
    pub fn new(friends: Vec<Friend>) -> DomainResult<Self> {
        let mut seen = HashSet::new();
        for friend in &friends {
            if !seen.insert(friend.id.clone()) {
                return Err(DomainError::validation(format!(
                    "duplicate friend id: {}",
                    friend.id
                )));
            }
            if friend.name.trim().is_empty() {
                return Err(DomainError::validation(format!(
                    "friend {} has an empty name",
                    friend.id
                )));
            }
            if friend.card_number.is_empty()
                || !friend.card_number.chars().all(|c| c.is_ascii_digit())
            {
                return Err(DomainError::validation(format!(
                    "friend {} has an invalid card number",
                    friend.id
                )));
            }
        }
        Ok(Self { friends })
    }

    pub fn find(&self, id: &FriendId) -> Option<&Friend> {
        self.friends.iter().find(|f| f.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Friend> {
        self.friends.iter()
    }

    pub fn len(&self) -> usize {
        self.friends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.friends.is_empty()
    }
}

impl Default for FriendDirectory {
    /// The four classmates every new session starts with.
    fn default() -> Self {
        Self {
            friends: vec![
                Friend::new("1", "Аня", "1234567890123456"),
                Friend::new("2", "Петя", "2345678901234567"),
                Friend::new("3", "Маша", "3456789012345678"),
                Friend::new("4", "Дима", "4567890123456789"),
            ],
        }
    }
}
