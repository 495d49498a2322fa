//! Crate-level error type.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type ChatResult<T> = Result<T, ChatError>;

/// Every failure the relay can produce.
///
/// Only the client-input variants ever reach an HTTP caller. A
/// [`ChatError::Completion`] is swallowed by the chat service and replaced
/// with a fallback reply.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Author or body was empty after trimming.
    #[error("Username and message required")]
    MissingField,

    /// The request body could not be decoded.
    #[error("Invalid JSON body")]
    InvalidBody(String),

    /// The HTTP request itself was malformed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The client did not finish sending its request in time.
    #[error("Request not received within {secs:.1}s")]
    RequestTimeout { secs: f64 },

    /// The completion service failed or returned something unusable.
    #[error("completion failed: {0}")]
    Completion(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// HTTP status code for errors that are reported to the browser.
    pub fn status_code(&self) -> u16 {
        match self {
            ChatError::MissingField | ChatError::InvalidBody(_) | ChatError::BadRequest(_) => 400,
            ChatError::RequestTimeout { .. } => 408,
            ChatError::PayloadTooLarge { .. } => 413,
            ChatError::Completion(_) => 502,
            ChatError::Config(_)
            | ChatError::Http(_)
            | ChatError::Json(_)
            | ChatError::Io(_) => 500,
        }
    }

    /// Whether the error was caused by the client's request.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}
