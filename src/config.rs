//! Configuration management for ollama-chat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Precedence, lowest to highest: built-in defaults, YAML file,
//! `OLLAMA_CHAT_*` environment variables, command-line flags.

use crate::cli::Cli;
use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Main configuration structure for ollama-chat
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where the Ollama server lives
    #[serde(default)]
    pub server: ServerConfig,
    /// Model profile: default model, display name, transcript naming
    #[serde(default)]
    pub profile: ProfileConfig,
    /// Interactive session behavior
    #[serde(default)]
    pub chat: ChatConfig,
    /// Request time bounds
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// Ollama server address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server hostname or IP
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    11434
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Base URL of the server, e.g. `http://localhost:11434`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// A model profile
///
/// One session controller serves every model family; the profile carries
/// what differs between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Profile identifier
    #[serde(default = "default_profile_name")]
    pub name: String,

    /// Name shown in the banner and in reply labels
    #[serde(default = "default_display_name")]
    pub display_name: String,

    /// Model requested from the server
    #[serde(default = "default_model")]
    pub model: String,

    /// File name prefix for transcripts saved without an explicit path
    #[serde(default = "default_transcript_prefix")]
    pub transcript_prefix: String,
}

fn default_profile_name() -> String {
    "gemma".to_string()
}

fn default_display_name() -> String {
    "Gemma".to_string()
}

fn default_model() -> String {
    "gemma2:9b".to_string()
}

fn default_transcript_prefix() -> String {
    "gemma_conversation".to_string()
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            name: default_profile_name(),
            display_name: default_display_name(),
            model: default_model(),
            transcript_prefix: default_transcript_prefix(),
        }
    }
}

impl ProfileConfig {
    /// Names of the built-in profiles
    pub const BUILTIN: [&'static str; 2] = ["gemma", "phi"];

    /// Look up a built-in profile by name (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use ollama_chat::config::ProfileConfig;
    ///
    /// let phi = ProfileConfig::builtin("PHI").unwrap();
    /// assert_eq!(phi.model, "phi4-mini:3.8b");
    /// assert!(ProfileConfig::builtin("mistral").is_none());
    /// ```
    pub fn builtin(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "gemma" => Some(Self::default()),
            "phi" => Some(Self {
                name: "phi".to_string(),
                display_name: "Phi".to_string(),
                model: "phi4-mini:3.8b".to_string(),
                transcript_prefix: "phi_conversation".to_string(),
            }),
            _ => None,
        }
    }
}

/// Interactive session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Start with streaming replies enabled
    #[serde(default)]
    pub streaming: bool,

    /// Character that marks a line as a command
    #[serde(default = "default_command_prefix")]
    pub command_prefix: char,

    /// Maximum characters shown per entry by the history command
    #[serde(default = "default_history_preview_chars")]
    pub history_preview_chars: usize,
}

fn default_command_prefix() -> char {
    '/'
}

fn default_history_preview_chars() -> usize {
    100
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            streaming: false,
            command_prefix: default_command_prefix(),
            history_preview_chars: default_history_preview_chars(),
        }
    }
}

/// Time bounds for service calls, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Reachability probe
    #[serde(default = "default_probe_seconds")]
    pub probe_seconds: u64,

    /// Model listing
    #[serde(default = "default_list_models_seconds")]
    pub list_models_seconds: u64,

    /// Complete-mode generate call
    #[serde(default = "default_complete_seconds")]
    pub complete_seconds: u64,

    /// Streaming generate call, including reading the whole body
    #[serde(default = "default_stream_seconds")]
    pub stream_seconds: u64,
}

fn default_probe_seconds() -> u64 {
    5
}

fn default_list_models_seconds() -> u64 {
    10
}

fn default_complete_seconds() -> u64 {
    60
}

fn default_stream_seconds() -> u64 {
    120
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe_seconds: default_probe_seconds(),
            list_models_seconds: default_list_models_seconds(),
            complete_seconds: default_complete_seconds(),
            stream_seconds: default_stream_seconds(),
        }
    }
}

impl TimeoutConfig {
    pub fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_seconds)
    }

    pub fn list_models(&self) -> Duration {
        Duration::from_secs(self.list_models_seconds)
    }

    pub fn complete(&self) -> Duration {
        Duration::from_secs(self.complete_seconds)
    }

    pub fn stream(&self) -> Duration {
        Duration::from_secs(self.stream_seconds)
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed, or if
    /// a profile override names an unknown profile
    pub fn load(path: &str, cli: &Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars()?;
        config.apply_cli_overrides(cli)?;

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn select_profile(&mut self, name: &str) -> Result<()> {
        let profile = ProfileConfig::builtin(name).ok_or_else(|| {
            ChatError::Config(format!(
                "Unknown profile: {}. Must be one of: {}",
                name,
                ProfileConfig::BUILTIN.join(", ")
            ))
        })?;
        self.profile = profile;
        Ok(())
    }

    fn apply_env_vars(&mut self) -> Result<()> {
        // Profile first so a model override lands on top of it
        if let Ok(profile) = std::env::var("OLLAMA_CHAT_PROFILE") {
            self.select_profile(&profile)?;
        }

        if let Ok(host) = std::env::var("OLLAMA_CHAT_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("OLLAMA_CHAT_PORT") {
            if let Ok(value) = port.parse() {
                self.server.port = value;
            } else {
                tracing::warn!("Invalid OLLAMA_CHAT_PORT: {}", port);
            }
        }

        if let Ok(model) = std::env::var("OLLAMA_CHAT_MODEL") {
            self.profile.model = model;
        }

        if let Ok(stream) = std::env::var("OLLAMA_CHAT_STREAM") {
            match stream.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.chat.streaming = true,
                "0" | "false" | "no" | "off" => self.chat.streaming = false,
                _ => tracing::warn!("Invalid OLLAMA_CHAT_STREAM: {}", stream),
            }
        }

        if let Ok(timeout) = std::env::var("OLLAMA_CHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.timeouts.complete_seconds = value;
            } else {
                tracing::warn!("Invalid OLLAMA_CHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(timeout) = std::env::var("OLLAMA_CHAT_STREAM_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.timeouts.stream_seconds = value;
            } else {
                tracing::warn!("Invalid OLLAMA_CHAT_STREAM_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        Ok(())
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) -> Result<()> {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
        if let Some(profile) = &cli.profile {
            self.select_profile(profile)?;
        }
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(model) = &cli.model {
            self.profile.model = model.clone();
        }
        if cli.stream {
            self.chat.streaming = true;
        }
        if let Some(timeout) = cli.timeout {
            self.timeouts.complete_seconds = timeout;
        }
        if let Some(timeout) = cli.stream_timeout {
            self.timeouts.stream_seconds = timeout;
        }
        Ok(())
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(ChatError::Config("server.host cannot be empty".to_string()).into());
        }

        if self.server.port == 0 {
            return Err(ChatError::Config("server.port must be greater than 0".to_string()).into());
        }

        url::Url::parse(&self.server.base_url()).map_err(|e| {
            ChatError::Config(format!(
                "Invalid server address {}: {}",
                self.server.base_url(),
                e
            ))
        })?;

        if self.profile.model.trim().is_empty() {
            return Err(ChatError::Config("profile.model cannot be empty".to_string()).into());
        }

        if self.profile.display_name.trim().is_empty() {
            return Err(
                ChatError::Config("profile.display_name cannot be empty".to_string()).into(),
            );
        }

        if self.profile.transcript_prefix.trim().is_empty() {
            return Err(
                ChatError::Config("profile.transcript_prefix cannot be empty".to_string()).into(),
            );
        }

        let prefix = self.chat.command_prefix;
        if prefix.is_alphanumeric() || prefix.is_whitespace() {
            return Err(ChatError::Config(format!(
                "chat.command_prefix must be a symbol, got '{}'",
                prefix
            ))
            .into());
        }

        if !(4..=100).contains(&self.chat.history_preview_chars) {
            return Err(ChatError::Config(
                "chat.history_preview_chars must be between 4 and 100".to_string(),
            )
            .into());
        }

        let timeouts = [
            ("timeouts.probe_seconds", self.timeouts.probe_seconds),
            (
                "timeouts.list_models_seconds",
                self.timeouts.list_models_seconds,
            ),
            ("timeouts.complete_seconds", self.timeouts.complete_seconds),
            ("timeouts.stream_seconds", self.timeouts.stream_seconds),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(
                    ChatError::Config(format!("{} must be greater than 0", name)).into(),
                );
            }
        }

        Ok(())
    }
}
