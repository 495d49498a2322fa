//! Server configuration: defaults, optional TOML file, then CLI/env overrides.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::cli::Args;
use crate::error::{ChatError, ChatResult};

/// Key used when none is configured. Every completion call fails with it,
/// so replies fall back to the apology message.
pub const PLACEHOLDER_API_KEY: &str = "your-api-key-here";

pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
pub const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub api_base_url: String,
    pub remember_conversation: bool,
    pub enable_tools: bool,
    pub max_body_bytes: usize,
    /// How long a client gets to send a complete request.
    pub read_timeout_secs: u64,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_key: PLACEHOLDER_API_KEY.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1000,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            remember_conversation: false,
            enable_tools: false,
            max_body_bytes: 64 * 1024,
            read_timeout_secs: 30,
            request_timeout_secs: None,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml(text: &str) -> ChatResult<Self> {
        toml::from_str(text).map_err(|e| ChatError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> ChatResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ChatError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Resolve the effective configuration for a set of parsed flags.
    pub fn load(args: &Args) -> ChatResult<Self> {
        let base = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(args))
    }

    /// Apply every flag that was actually given.
    pub fn with_overrides(mut self, args: &Args) -> Self {
        if let Some(host) = &args.host {
            self.host = host.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(key) = &args.api_key {
            self.api_key = key.clone();
        }
        if let Some(model) = &args.model {
            self.model = model.clone();
        }
        if let Some(max_tokens) = args.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(url) = &args.api_base_url {
            self.api_base_url = url.clone();
        }
        if args.remember_conversation {
            self.remember_conversation = true;
        }
        if args.enable_tools {
            self.enable_tools = true;
        }
        if let Some(secs) = args.request_timeout_secs {
            self.request_timeout_secs = Some(secs);
        }
        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn has_placeholder_key(&self) -> bool {
        self.api_key.trim().is_empty() || self.api_key == PLACEHOLDER_API_KEY
    }
}
