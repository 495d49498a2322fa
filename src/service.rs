//! The chat endpoint: validate, record, ask the model, record its answer.

use std::sync::Mutex;
use tracing::{info, warn};

use crate::completion::Completer;
use crate::error::{ChatError, ChatResult};
use crate::message::{IdClock, Message, Turn, FALLBACK_REPLY};
use crate::store::MessageStore;

/// Owns the message store and the completion collaborator for the lifetime
/// of the server.
pub struct ChatService<S, C> {
    store: S,
    completer: C,
    ids: IdClock,
    /// Shared transcript, only kept when `remember_conversation` is on.
    conversation: Option<Mutex<Vec<Turn>>>,
}

impl<S: MessageStore, C: Completer> ChatService<S, C> {
    pub fn new(store: S, completer: C) -> Self {
        ChatService {
            store,
            completer,
            ids: IdClock::new(),
            conversation: None,
        }
    }

    /// Send the accumulated conversation to the model rather than just the
    /// latest message.
    pub fn remember_conversation(mut self, enabled: bool) -> Self {
        self.conversation = enabled.then(|| Mutex::new(Vec::new()));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Post a message and record the model's reply.
    ///
    /// Returns the stored human message. The reply (or the fallback apology
    /// when the model call fails) is appended to the store before this
    /// returns but is only visible through [`ChatService::list`].
    pub async fn submit(&self, author: &str, body: &str) -> ChatResult<Message> {
        if author.trim().is_empty() || body.trim().is_empty() {
            return Err(ChatError::MissingField);
        }

        let human = self.post(|id| Message::new(id, author, body));
        info!(id = human.id, username = %human.username, "new message");

        let question = Turn::user(body);
        let turns = self.prompt_for(&question);
        let reply = match self.completer.complete(&turns).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "completion failed, posting fallback reply");
                FALLBACK_REPLY.to_string()
            }
        };
        self.remember(question, Turn::assistant(reply.as_str()));

        let synthetic = self.post(|id| Message::synthetic(id, reply));
        info!(id = synthetic.id, reply_to = human.id, "reply posted");

        Ok(human)
    }

    /// Build a message under a fresh id and append it before any later id
    /// is handed out.
    fn post(&self, build: impl FnOnce(u64) -> Message) -> Message {
        self.ids.issue(|id| {
            let message = build(id);
            self.store.append(message.clone());
            message
        })
    }

    /// The whole history in insertion order.
    pub fn list(&self) -> Vec<Message> {
        self.store.list_all()
    }

    /// What to send the model for `question`: the transcript so far plus
    /// the question, or just the question when memory is off.
    fn prompt_for(&self, question: &Turn) -> Vec<Turn> {
        let mut turns = self.conversation();
        turns.push(question.clone());
        turns
    }

    /// Append a finished exchange. Both turns go in under one lock, so
    /// exchanges that overlap in time never interleave.
    fn remember(&self, question: Turn, answer: Turn) {
        if let Some(conversation) = &self.conversation {
            let mut guard = conversation.lock().unwrap_or_else(|p| p.into_inner());
            guard.push(question);
            guard.push(answer);
        }
    }

    /// Snapshot of the transcript; empty when conversation memory is off.
    pub fn conversation(&self) -> Vec<Turn> {
        self.conversation
            .as_ref()
            .map(|c| c.lock().unwrap_or_else(|p| p.into_inner()).clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Role, SYNTHETIC_AUTHOR};
    use crate::store::InMemoryStore;

    struct Echo;

    impl Completer for Echo {
        async fn complete(&self, turns: &[Turn]) -> ChatResult<String> {
            Ok(format!("echo: {}", turns.last().map(|t| t.content.as_str()).unwrap_or("")))
        }
    }

    struct Down;

    impl Completer for Down {
        async fn complete(&self, _turns: &[Turn]) -> ChatResult<String> {
            Err(ChatError::Completion("authentication_error".into()))
        }
    }

    /// Reports how many turns it was given.
    struct CountTurns;

    impl Completer for CountTurns {
        async fn complete(&self, turns: &[Turn]) -> ChatResult<String> {
            Ok(turns.len().to_string())
        }
    }

    #[tokio::test]
    async fn test_submit_appends_human_then_reply() {
        let svc = ChatService::new(InMemoryStore::new(), Echo);
        let human = svc.submit("alice", "hi").await.expect("submit");
        let all = svc.list();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], human);
        assert_eq!(all[1].username, SYNTHETIC_AUTHOR);
        assert_eq!(all[1].message, "echo: hi");
        assert!(all[1].id > all[0].id);
    }

    #[tokio::test]
    async fn test_failure_posts_fallback_and_still_returns_human() {
        let svc = ChatService::new(InMemoryStore::new(), Down);
        let human = svc.submit("alice", "hi").await.expect("submit");
        assert_eq!(human.username, "alice");
        assert_eq!(human.message, "hi");
        let all = svc.list();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].message, FALLBACK_REPLY);
        assert!(all[1].is_synthetic());
    }

    #[tokio::test]
    async fn test_blank_fields_rejected_without_mutation() {
        let svc = ChatService::new(InMemoryStore::new(), Echo).remember_conversation(true);
        for (author, body) in [("", "hi"), ("alice", ""), ("   ", "hi"), ("alice", "\t\n")] {
            let err = svc.submit(author, body).await.unwrap_err();
            assert!(matches!(err, ChatError::MissingField));
        }
        assert!(svc.list().is_empty());
        assert!(svc.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_single_prompt_by_default() {
        let svc = ChatService::new(InMemoryStore::new(), CountTurns);
        svc.submit("a", "one").await.expect("submit");
        svc.submit("a", "two").await.expect("submit");
        assert_eq!(svc.list()[3].message, "1");
        assert!(svc.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_conversation_memory_accumulates() {
        let svc = ChatService::new(InMemoryStore::new(), CountTurns).remember_conversation(true);
        svc.submit("a", "one").await.expect("submit");
        svc.submit("b", "two").await.expect("submit");
        // second call sees user, assistant, user
        assert_eq!(svc.list()[3].message, "3");
        let roles: Vec<Role> = svc.conversation().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn test_fallback_recorded_in_conversation() {
        let svc = ChatService::new(InMemoryStore::new(), Down).remember_conversation(true);
        svc.submit("a", "hi").await.expect("submit");
        assert_eq!(svc.conversation()[1], Turn::assistant(FALLBACK_REPLY));
    }

    #[tokio::test]
    async fn test_body_stored_as_submitted() {
        let svc = ChatService::new(InMemoryStore::new(), Echo);
        let human = svc.submit(" bob ", "<b>hi</b>").await.expect("submit");
        assert_eq!(human.username, " bob ");
        assert_eq!(svc.list()[0].message, "<b>hi</b>");
    }
}
