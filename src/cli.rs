use clap::Parser;
use std::path::PathBuf;

/// Command-line flags. Every setting is optional here; unset flags fall back
/// to the config file and then to [`ServerConfig`](crate::config::ServerConfig) defaults.
#[derive(Parser, Debug, Default)]
#[command(name = "chat-relay")]
#[command(version)]
#[command(about = "A shared web chat where every message gets a reply from Claude")]
pub struct Args {
    /// TOML config file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "CHAT_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, short, env = "PORT")]
    pub port: Option<u16>,

    /// Anthropic API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used for replies
    #[arg(long, env = "CHAT_MODEL")]
    pub model: Option<String>,

    /// Maximum tokens per reply
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Base URL of the Messages API
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// Send the whole conversation to the model instead of only the latest message
    #[arg(long)]
    pub remember_conversation: bool,

    /// Let the model call local tools (get_today_date)
    #[arg(long)]
    pub enable_tools: bool,

    /// Abort completion requests after this many seconds
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_minimal() {
        let args = Args::try_parse_from(["chat-relay"]).expect("parse");
        assert!(args.config.is_none());
        assert!(!args.remember_conversation);
        assert!(!args.enable_tools);
        assert!(args.max_tokens.is_none());
    }

    #[test]
    fn test_args_parse_flags() {
        let args = Args::try_parse_from([
            "chat-relay",
            "--port",
            "8080",
            "--model",
            "claude-3-5-haiku-latest",
            "--max-tokens",
            "256",
            "--remember-conversation",
            "--enable-tools",
            "--api-base-url",
            "http://127.0.0.1:9",
        ])
        .expect("parse");
        assert_eq!(args.port, Some(8080));
        assert_eq!(args.model.as_deref(), Some("claude-3-5-haiku-latest"));
        assert_eq!(args.max_tokens, Some(256));
        assert!(args.remember_conversation);
        assert!(args.enable_tools);
        assert_eq!(args.api_base_url.as_deref(), Some("http://127.0.0.1:9"));
    }

    #[test]
    fn test_args_rejects_bad_port() {
        assert!(Args::try_parse_from(["chat-relay", "--port", "notaport"]).is_err());
    }
}
