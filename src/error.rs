//! Error types for ollama-chat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.
//!
//! Errors fall into four families that the session controller treats
//! differently: transport failures (unreachable, timeout, HTTP status,
//! dropped connection), decode failures of individual stream records,
//! persistence failures of transcript files, and validation failures of
//! user commands. None of them ends the turn loop.

use thiserror::Error;

/// Main error type for ollama-chat operations
#[derive(Error, Debug)]
pub enum ChatError {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The service could not be reached or the connection dropped
    #[error("Transport error: {0}")]
    Transport(String),

    /// A request exceeded its configured time bound
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The service answered with a non-success HTTP status
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Numeric HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// A single stream record could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// A transcript file could not be read, parsed, or written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A command was rejected (unknown command, missing argument, unknown model)
    #[error("{0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChatError {
    /// Returns true for errors raised while talking to the service
    ///
    /// # Examples
    ///
    /// ```
    /// use ollama_chat::error::ChatError;
    ///
    /// assert!(ChatError::Timeout("generate".to_string()).is_transport());
    /// assert!(!ChatError::Validation("nope".to_string()).is_transport());
    /// ```
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::HttpStatus { .. }
        )
    }

    /// Map a reqwest failure onto the transport family
    ///
    /// Timeouts keep their own variant so the turn loop can show a
    /// loading hint; everything else becomes a plain transport error.
    pub fn from_request(context: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(format!("{} - model might be loading", context))
        } else {
            Self::Transport(format!("{}: {}", context, err))
        }
    }
}

/// Result type alias for ollama-chat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation. Typed
/// failures are recovered with `downcast_ref::<ChatError>()`.
pub type Result<T> = anyhow::Result<T>;
