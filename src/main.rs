use chat_relay::cli::Args;
use chat_relay::config::ServerConfig;
use chat_relay::web;
use clap::Parser;
use colored::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,chat_relay=debug")),
        )
        .init();

    let args = Args::parse();
    let config = match ServerConfig::load(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", "error:".bright_red().bold(), e);
            std::process::exit(2);
        }
    };

    web::serve(config).await?;
    Ok(())
}
