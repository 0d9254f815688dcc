//! Command-line interface definition for ollama-chat
//!
//! This module defines the CLI structure using clap's derive API.
//! Every flag is an optional override on top of the configuration file
//! and environment variables.

use clap::Parser;

/// ollama-chat - interactive terminal chat with an Ollama server
///
/// Connects to the server, checks that the requested model is available
/// and starts a line-oriented chat session. Type `/help` inside the
/// session for the list of commands.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "ollama-chat")]
#[command(version, about, long_about = None)]
#[command(after_help = "Examples:
  ollama-chat                          # Use localhost
  ollama-chat -H 15.222.244.108        # Use a specific IP
  ollama-chat -m gemma2:2b             # Use a different model
  ollama-chat --profile phi --stream   # Phi profile with streaming replies")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Server hostname or IP address
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Model name to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Built-in model profile (gemma, phi)
    #[arg(long)]
    pub profile: Option<String>,

    /// Start with streaming replies enabled
    #[arg(long)]
    pub stream: bool,

    /// Upper bound for complete-mode requests, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Upper bound for streaming requests, in seconds
    #[arg(long, value_name = "SECS")]
    pub stream_timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
