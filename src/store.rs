//! Message storage.
//!
//! The store lives for the whole process and only ever grows. Implement
//! [`MessageStore`] to back it with something persistent.

use std::sync::{Mutex, MutexGuard};

use crate::message::Message;

/// Append-only, ordered message log.
pub trait MessageStore: Send + Sync {
    /// Add a message to the end of the log.
    fn append(&self, message: Message);

    /// Every message in insertion order.
    fn list_all(&self) -> Vec<Message>;

    fn len(&self) -> usize {
        self.list_all().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-lifetime store backed by a `Vec`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    messages: Mutex<Vec<Message>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Appends are single pushes, so a panic elsewhere never leaves the
    // vector half-written; recover the guard instead of failing.
    fn guard(&self) -> MutexGuard<'_, Vec<Message>> {
        self.messages.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl MessageStore for InMemoryStore {
    fn append(&self, message: Message) {
        self.guard().push(message);
    }

    fn list_all(&self) -> Vec<Message> {
        self.guard().clone()
    }

    fn len(&self) -> usize {
        self.guard().len()
    }
}
