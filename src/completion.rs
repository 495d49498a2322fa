//! Completion collaborator: turns a transcript into a reply.

use reqwest::Client;
use std::future::Future;
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::{ChatError, ChatResult};
use crate::message::{Role, Turn};
use crate::providers::{
    AnthropicErrorBody, AnthropicMessage, AnthropicRequest, AnthropicResponse, ContentBlock,
};
use crate::tools::ToolRegistry;

/// Upper bound on tool-use round trips within a single completion.
pub const MAX_TOOL_ROUNDS: usize = 4;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Something that can produce a reply for a conversation.
///
/// `turns` always ends with the user turn being answered.
pub trait Completer: Send + Sync {
    fn complete(&self, turns: &[Turn]) -> impl Future<Output = ChatResult<String>> + Send;
}

/// Client for the Anthropic Messages API.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    pub model: String,
    pub max_tokens: u32,
    tools: Option<ToolRegistry>,
}

impl AnthropicClient {
    pub fn new(config: &ServerConfig) -> ChatResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(AnthropicClient {
            client: builder.build()?,
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            tools: config.enable_tools.then(ToolRegistry::builtin),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    async fn send(&self, messages: &[AnthropicMessage]) -> ChatResult<AnthropicResponse> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages,
            tools: self.tools.as_ref().map(|t| t.definitions()).unwrap_or_default(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let detail = serde_json::from_str::<AnthropicErrorBody>(&body)
                .map(|e| format!("{}: {}", e.error.error_type, e.error.message))
                .unwrap_or(body);
            return Err(ChatError::Completion(format!(
                "Anthropic API returned HTTP {}: {}",
                status.as_u16(),
                detail
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| ChatError::Completion(format!("malformed response: {}", e)))
    }
}

impl Completer for AnthropicClient {
    async fn complete(&self, turns: &[Turn]) -> ChatResult<String> {
        let mut messages: Vec<AnthropicMessage> =
            turns.iter().map(AnthropicMessage::from).collect();

        for _ in 0..=MAX_TOOL_ROUNDS {
            let response = self.send(&messages).await?;

            let registry = match &self.tools {
                Some(r) if response.wants_tools() && !response.tool_uses().is_empty() => r,
                _ => {
                    return response
                        .text()
                        .ok_or_else(|| ChatError::Completion("response contained no text".into()));
                }
            };

            let results: Vec<ContentBlock> = response
                .tool_uses()
                .into_iter()
                .map(|(id, name, input)| {
                    debug!(tool = name, "running tool");
                    ContentBlock::ToolResult {
                        tool_use_id: id.to_string(),
                        content: registry.call(name, input).to_string(),
                    }
                })
                .collect();

            messages.push(AnthropicMessage::blocks(Role::Assistant, response.content));
            messages.push(AnthropicMessage::blocks(Role::User, results));
        }

        Err(ChatError::Completion(format!(
            "tool use did not settle after {} rounds",
            MAX_TOOL_ROUNDS
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let cfg = ServerConfig {
            api_base_url: "http://localhost:9999/".into(),
            ..ServerConfig::default()
        };
        let client = AnthropicClient::new(&cfg).expect("client");
        assert_eq!(client.endpoint(), "http://localhost:9999/v1/messages");
    }

    #[test]
    fn test_tools_follow_config() {
        let off = AnthropicClient::new(&ServerConfig::default()).expect("client");
        assert!(off.tools.is_none());
        let cfg = ServerConfig { enable_tools: true, ..ServerConfig::default() };
        let on = AnthropicClient::new(&cfg).expect("client");
        assert!(on.tools.is_some());
    }

    #[test]
    fn test_model_and_max_tokens_from_config() {
        let cfg = ServerConfig {
            model: "m".into(),
            max_tokens: 12,
            ..ServerConfig::default()
        };
        let client = AnthropicClient::new(&cfg).expect("client");
        assert_eq!(client.model, "m");
        assert_eq!(client.max_tokens, 12);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_completion_or_http_error() {
        // Port 9 on loopback is the discard port; nothing listens there in CI.
        let cfg = ServerConfig {
            api_base_url: "http://127.0.0.1:9".into(),
            ..ServerConfig::default()
        };
        let client = AnthropicClient::new(&cfg).expect("client");
        let err = client.complete(&[Turn::user("hi")]).await.unwrap_err();
        assert!(matches!(err, ChatError::Http(_) | ChatError::Completion(_)));
    }
}
