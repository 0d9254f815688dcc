//! ollama-chat - interactive terminal chat with an Ollama server
//!
#![doc = "Main entry point for the ollama-chat application."]

use std::process::ExitCode;

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ollama_chat::cli::Cli;
use ollama_chat::commands::chat::{self, ChatExit};
use ollama_chat::config::{Config, DEFAULT_CONFIG_PATH};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(ChatExit::Finished) => ExitCode::SUCCESS,
        Ok(ChatExit::Unreachable) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("Fatal: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ChatExit> {
    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    tracing::debug!("Using profile {}", config.profile.name);
    chat::run_chat(config).await
}

/// Initialize the tracing subscriber
///
/// Logs go to stderr so they never interleave with streamed replies on
/// stdout. `RUST_LOG` wins over the `--verbose` default.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "ollama_chat=debug"
    } else {
        "ollama_chat=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
