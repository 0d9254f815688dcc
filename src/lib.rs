//! ollama-chat - interactive terminal chat client library
//!
//! This library provides the pieces behind the `ollama-chat` binary: a
//! service client for Ollama-style text-generation servers, an
//! incremental decoder for streamed replies, a conversation log with a
//! JSON transcript format, and the session controller that ties them to
//! a line-oriented chat loop.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `providers`: Service client abstraction, the Ollama HTTP client and a test fake
//! - `stream`: Newline-delimited JSON decoder for streaming replies
//! - `conversation`: In-memory message log
//! - `transcript`: On-disk transcript format
//! - `session`: Session controller and turn handling
//! - `commands`: Interactive loop and `/` command parsing
//! - `render`: Styled terminal output
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use ollama_chat::providers::create_provider;
//! use ollama_chat::session::{Session, SessionConfig};
//! use ollama_chat::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let provider = create_provider(&config)?;
//!     let mut session = Session::new(provider, SessionConfig::from_config(&config));
//!     session.connect().await?;
//!
//!     let outcome = session.handle_line("Why is the sky blue?", &mut std::io::stdout()).await?;
//!     outcome.output.write_to(&mut std::io::stdout())?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod providers;
pub mod render;
pub mod session;
pub mod stream;
pub mod transcript;

// Re-export commonly used types
pub use config::Config;
pub use conversation::{ConversationMessage, ConversationStore, Role};
pub use error::{ChatError, Result};
pub use session::{Session, SessionConfig};
