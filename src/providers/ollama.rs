//! Ollama provider implementation for ollama-chat
//!
//! This module implements the Provider trait for Ollama, connecting to a
//! local or remote Ollama server. Model listing and the reachability probe
//! use `/api/tags`; replies come from `/api/generate`, either as one JSON
//! document or as a newline-delimited JSON body when streaming.

use crate::config::{ServerConfig, TimeoutConfig};
use crate::error::{ChatError, Result};
use crate::providers::{ByteStream, Provider};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

/// Ollama API provider
///
/// # Examples
///
/// ```
/// use ollama_chat::config::{ServerConfig, TimeoutConfig};
/// use ollama_chat::providers::{OllamaProvider, Provider};
///
/// let provider = OllamaProvider::new(&ServerConfig::default(), TimeoutConfig::default()).unwrap();
/// assert_eq!(provider.endpoint(), "http://localhost:11434");
/// ```
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    timeouts: TimeoutConfig,
}

/// Response from Ollama's /api/tags endpoint
#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModelTag>,
}

/// Model metadata from /api/tags
#[derive(Debug, Deserialize)]
struct OllamaModelTag {
    name: String,
}

/// Request body for /api/generate
#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Complete-mode response from /api/generate
#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider for the configured server
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(server: &ServerConfig, timeouts: TimeoutConfig) -> Result<Self> {
        Self::with_base_url(server.base_url(), timeouts)
    }

    /// Create a provider for an explicit base URL such as `http://127.0.0.1:8080`
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn with_base_url(base_url: impl Into<String>, timeouts: TimeoutConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ollama-chat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!("Initialized Ollama provider: {}", base_url);

        Ok(Self {
            client,
            base_url,
            timeouts,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success status into an error, keeping the body for context
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::error!("Ollama returned error {}: {}", status, body);
        Err(ChatError::HttpStatus {
            status: status.as_u16(),
            body,
        }
        .into())
    }

    async fn post_generate(&self, model: &str, prompt: &str, stream: bool) -> Result<Response> {
        let timeout = if stream {
            self.timeouts.stream()
        } else {
            self.timeouts.complete()
        };
        let request = OllamaGenerateRequest {
            model,
            prompt,
            stream,
        };

        tracing::debug!(
            "Sending Ollama generate request: model={}, stream={}, prompt_chars={}",
            model,
            stream,
            prompt.chars().count()
        );

        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&request)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Ollama generate request failed: {}", e);
                ChatError::from_request("Generate request failed", e)
            })?;

        Self::check_status(response).await
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn probe(&self) -> bool {
        let url = self.url("/api/tags");
        tracing::debug!("Probing Ollama at {}", url);

        match self
            .client
            .get(&url)
            .timeout(self.timeouts.probe())
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Ollama probe failed: {}", e);
                false
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = self.url("/api/tags");
        tracing::debug!("Fetching models from Ollama: {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeouts.list_models())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to fetch Ollama models: {}", e);
                ChatError::from_request("Failed to fetch models", e)
            })?;

        let tags: OllamaTagsResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| {
                tracing::error!("Failed to parse Ollama tags response: {}", e);
                ChatError::Transport(format!("Failed to parse Ollama response: {}", e))
            })?;

        Ok(tags.models.into_iter().map(|tag| tag.name).collect())
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let response = self.post_generate(model, prompt, false).await?;

        let body: OllamaGenerateResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to read Ollama response: {}", e);
            ChatError::from_request("Failed to read response", e)
        })?;

        tracing::debug!("Ollama response: {} chars", body.response.chars().count());
        Ok(body.response)
    }

    async fn generate_stream(&self, model: &str, prompt: &str) -> Result<ByteStream> {
        let response = self.post_generate(model, prompt, true).await?;

        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| {
                tracing::warn!("Ollama stream interrupted: {}", e);
                anyhow::Error::from(ChatError::from_request("Stream interrupted", e))
            })
        });

        Ok(Box::pin(stream))
    }

    fn endpoint(&self) -> String {
        self.base_url.clone()
    }
}
