//! Provider module for ollama-chat
//!
//! This module contains the service client abstraction, the HTTP client
//! for Ollama servers, and an in-process fake for tests.

pub mod base;
#[cfg(test)]
pub mod fake;
pub mod ollama;

pub use base::{ByteStream, Provider};
#[cfg(test)]
pub use fake::{FakeFailure, FakeProvider};
pub use ollama::OllamaProvider;

use crate::config::Config;
use crate::error::Result;

/// Create the provider described by the configuration
///
/// # Errors
///
/// Returns error if the HTTP client cannot be initialized
pub fn create_provider(config: &Config) -> Result<Box<dyn Provider>> {
    Ok(Box::new(OllamaProvider::new(
        &config.server,
        config.timeouts.clone(),
    )?))
}
