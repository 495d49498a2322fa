//! A shared web chat backed by an LLM.
//!
//! Browsers poll `GET /messages` for the full history and post with
//! `POST /messages`. Every human message is relayed to the Anthropic
//! Messages API and the answer is appended as a message from `Claude`; when
//! the call fails a fixed apology is appended instead.

pub mod assets;
pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod message;
pub mod providers;
pub mod service;
pub mod store;
pub mod tools;
pub mod web;

pub use completion::{AnthropicClient, Completer};
pub use config::ServerConfig;
pub use error::{ChatError, ChatResult};
pub use message::{Message, Turn, FALLBACK_REPLY, SYNTHETIC_AUTHOR};
pub use service::ChatService;
pub use store::{InMemoryStore, MessageStore};
