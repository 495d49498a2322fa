//! Chat message records and the transcript entries sent to the model.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Author label used for every model-generated reply.
pub const SYNTHETIC_AUTHOR: &str = "Claude";

/// Reply posted when the completion service cannot be reached.
pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble connecting right now. Please check your API key.";

/// One chat entry, human or synthetic. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub username: String,
    pub message: String,
    /// RFC 3339 UTC timestamp, millisecond precision.
    pub timestamp: String,
}

impl Message {
    pub fn new(id: u64, username: impl Into<String>, message: impl Into<String>) -> Self {
        Message {
            id,
            username: username.into(),
            message: message.into(),
            timestamp: iso_timestamp(),
        }
    }

    /// A reply authored by [`SYNTHETIC_AUTHOR`].
    pub fn synthetic(id: u64, message: impl Into<String>) -> Self {
        Message::new(id, SYNTHETIC_AUTHOR, message)
    }

    pub fn is_synthetic(&self) -> bool {
        is_synthetic_author(&self.username)
    }
}

/// Case-insensitive match against the reserved synthetic author name.
pub fn is_synthetic_author(name: &str) -> bool {
    name.to_lowercase() == SYNTHETIC_AUTHOR.to_lowercase()
}

/// Current Unix epoch in milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Current UTC time as an RFC 3339 string, e.g. `2024-05-01T12:00:00.123Z`.
pub fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Hands out time-derived message ids.
///
/// Ids are the wall clock in milliseconds, bumped past the previous id when
/// the clock has not advanced (or went backwards), so they strictly increase
/// in the order they are handed out.
#[derive(Debug, Default)]
pub struct IdClock {
    last: Mutex<u64>,
}

impl IdClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next id and run `f` with it while no other id can be
    /// issued, so whatever `f` records lands in id order.
    pub fn issue<T>(&self, f: impl FnOnce(u64) -> T) -> T {
        let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
        let id = now_ms().max(last.saturating_add(1));
        *last = id;
        f(id)
    }
}

// -- Conversation transcript -------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One role-tagged entry of the transcript sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Turn {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Turn {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
