//! Session controller
//!
//! A [`Session`] owns everything one chat needs: the provider, the live
//! settings, and the conversation log. The REPL driver feeds it one input
//! line at a time and prints what comes back; nothing in here reads from
//! the terminal.
//!
//! Lifecycle:
//!
//! ```text
//! Disconnected -> Connecting -> Ready -> AwaitingInput
//!     AwaitingInput <-> ExecutingCommand
//!     AwaitingInput <-> QueryingModel
//! AwaitingInput -> Terminating
//! ```
//!
//! Failed turns are rendered and the session returns to `AwaitingInput`.
//! Only a failed reachability probe in [`Session::connect`] is fatal.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use chrono::{Local, Utc};
use futures::StreamExt;

use crate::commands::special_commands::{help_text, parse_special_command, SpecialCommand};
use crate::config::Config;
use crate::conversation::{truncate_string, ConversationStore, Role};
use crate::error::{ChatError, Result};
use crate::providers::Provider;
use crate::render::{render, Output, Style};
use crate::stream::ResponseStream;

const RULE_WIDTH: usize = 60;

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Ready,
    AwaitingInput,
    ExecutingCommand,
    QueryingModel,
    Terminating,
}

/// Live session settings
///
/// `model` and `streaming` change through commands; the rest is fixed at
/// startup.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub model: String,
    pub streaming: bool,
    pub display_name: String,
    pub transcript_prefix: String,
    pub command_prefix: char,
    pub history_preview_chars: usize,
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            model: config.profile.model.clone(),
            streaming: config.chat.streaming,
            display_name: config.profile.display_name.clone(),
            transcript_prefix: config.profile.transcript_prefix.clone(),
            command_prefix: config.chat.command_prefix,
            history_preview_chars: config.chat.history_preview_chars,
        }
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Whether the turn loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

/// Result of one input line
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub output: Output,
    pub control: Control,
}

impl TurnOutcome {
    fn proceed(output: Output) -> Self {
        Self {
            output,
            control: Control::Continue,
        }
    }
}

/// One interactive chat with a single model endpoint
pub struct Session {
    provider: Box<dyn Provider>,
    config: SessionConfig,
    store: ConversationStore,
    state: SessionState,
}

impl Session {
    pub fn new(provider: Box<dyn Provider>, config: SessionConfig) -> Self {
        Self {
            provider,
            config,
            store: ConversationStore::new(),
            state: SessionState::Disconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn streaming(&self) -> bool {
        self.config.streaming
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Check reachability and model availability
    ///
    /// If the configured model is missing but the service lists others,
    /// the first listed model is used instead. An empty list is only a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Transport` if the service does not answer the
    /// probe. The session stays `Disconnected`; render
    /// [`Session::connection_help`] and stop.
    pub async fn connect(&mut self) -> Result<Output> {
        self.state = SessionState::Connecting;
        let mut output = Output::new();

        if !self.provider.probe().await {
            self.state = SessionState::Disconnected;
            return Err(ChatError::Transport(format!(
                "Cannot connect to Ollama at {}",
                self.provider.endpoint()
            ))
            .into());
        }

        let models = match self.provider.list_models().await {
            Ok(models) => models,
            Err(e) => {
                tracing::debug!("Model listing failed during connect: {:#}", e);
                Vec::new()
            }
        };

        if models.is_empty() {
            output.error("Warning: No models found. Ollama might still be initializing.");
        } else if !models.contains(&self.config.model) {
            output.error(format!("Warning: Model '{}' not found.", self.config.model));
            output.info(format!("Available models: {}", models.join(", ")));
            tracing::warn!(
                "Configured model {} unavailable, using {}",
                self.config.model,
                models[0]
            );
            self.config.model = models[0].clone();
            output.info(format!("Switched to: {}", self.config.model));
        }

        self.state = SessionState::Ready;
        Ok(output)
    }

    /// Diagnostic shown when [`Session::connect`] fails
    pub fn connection_help(&self) -> Output {
        let mut output = Output::new();
        output.error(format!(
            "Error: Cannot connect to Ollama at {}",
            self.provider.endpoint()
        ));
        output.error("Please check:");
        output.error("1. EC2 instance is running");
        output.error("2. Ollama service is started");
        output.error(format!("3. Security group allows port {}", self.config.port));
        output.error("4. Host/IP address is correct");
        output
    }

    /// Welcome banner; moves the session to `AwaitingInput`
    pub fn banner(&mut self) -> Output {
        let rule = "=".repeat(RULE_WIDTH);
        let mut output = Output::new();
        output.system(rule.clone());
        output.system(format!(
            "🤖 {} Interactive Chat Interface",
            self.config.display_name
        ));
        output.system(rule.clone());
        output.info(format!("Connected to: {}", self.config.address()));
        output.info(format!("Model: {}", self.config.model));
        output.info(format!(
            "Type '{}help' for commands or start chatting!",
            self.config.command_prefix
        ));
        output.system(rule);
        self.state = SessionState::AwaitingInput;
        output
    }

    /// Process one line of user input
    ///
    /// Command lines run their command. Any other non-empty line is sent
    /// to the model; progress lines and streamed reply text are written
    /// to `out` as they happen, everything else comes back in the
    /// outcome. Empty lines do nothing.
    ///
    /// # Errors
    ///
    /// Only fails if writing to `out` fails.
    pub async fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<TurnOutcome> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(TurnOutcome::proceed(Output::new()));
        }

        match parse_special_command(line, self.config.command_prefix) {
            Ok(SpecialCommand::None) => self.query_model(line, out).await.map(TurnOutcome::proceed),
            Ok(command) => Ok(self.execute_command(command).await),
            Err(e) => {
                tracing::debug!("Rejected command line {:?}: {}", line, e);
                let mut output = Output::new();
                output.error(e.to_string());
                output.info(format!(
                    "Type '{}help' for available commands",
                    self.config.command_prefix
                ));
                Ok(TurnOutcome::proceed(output))
            }
        }
    }

    /// Run a command to completion
    pub async fn execute_command(&mut self, command: SpecialCommand) -> TurnOutcome {
        self.state = SessionState::ExecutingCommand;
        let mut output = Output::new();
        let mut control = Control::Continue;

        let result = match command {
            SpecialCommand::Help => {
                output.info(help_text(
                    self.config.command_prefix,
                    &self.config.display_name,
                ));
                Ok(())
            }
            SpecialCommand::ListModels => self.list_models(&mut output).await,
            SpecialCommand::SwitchModel(name) => self.switch_model(&name).await.map(|()| {
                output.info(format!("Switched to model: {}", self.config.model));
            }),
            SpecialCommand::Save(path) => self.save(path.as_deref(), &mut output),
            SpecialCommand::Load(path) => self.load(&path, &mut output),
            SpecialCommand::Clear => {
                self.store.clear();
                output.info("Conversation history cleared");
                Ok(())
            }
            SpecialCommand::Stats => {
                output.extend(self.stats());
                Ok(())
            }
            SpecialCommand::ToggleStream => {
                self.config.streaming = !self.config.streaming;
                let status = if self.config.streaming {
                    "enabled"
                } else {
                    "disabled"
                };
                output.info(format!("Streaming mode {}", status));
                Ok(())
            }
            SpecialCommand::History => {
                output.extend(self.history());
                Ok(())
            }
            SpecialCommand::Exit => {
                output.system("Goodbye! 👋");
                control = Control::Exit;
                Ok(())
            }
            SpecialCommand::None => Ok(()),
        };

        if let Err(e) = result {
            output.error(error_line(&e));
        }

        self.state = match control {
            Control::Continue => SessionState::AwaitingInput,
            Control::Exit => SessionState::Terminating,
        };
        TurnOutcome { output, control }
    }

    async fn list_models(&self, output: &mut Output) -> Result<()> {
        let models = self.provider.list_models().await?;
        if models.is_empty() {
            output.error("No models available");
        } else {
            output.info(format!("Available models: {}", models.join(", ")));
        }
        Ok(())
    }

    /// Rebind the active model if the service lists `name`
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Validation` if the model is not listed, or the
    /// transport error if listing fails. The model is unchanged either way.
    pub async fn switch_model(&mut self, name: &str) -> Result<()> {
        let models = self.provider.list_models().await?;
        if !models.iter().any(|m| m == name) {
            return Err(ChatError::Validation(format!("Model '{}' not found", name)).into());
        }
        tracing::info!("Switching model from {} to {}", self.config.model, name);
        self.config.model = name.to_string();
        Ok(())
    }

    fn save(&self, path: Option<&str>, output: &mut Output) -> Result<()> {
        let written = self.store.save(
            path.map(Path::new),
            &self.config.model,
            &self.config.host,
            &self.config.transcript_prefix,
        )?;
        output.info(format!("Conversation saved to: {}", written.display()));
        Ok(())
    }

    fn load(&mut self, path: &str, output: &mut Output) -> Result<()> {
        let summary = self.store.load(Path::new(path))?;
        output.info(format!("Loaded {} messages from {}", summary.count, path));
        if !summary.model.is_empty() && summary.model != self.config.model {
            output.info(format!(
                "Transcript was recorded with model '{}' on host '{}'; continuing with '{}'",
                summary.model, summary.host, self.config.model
            ));
        }
        Ok(())
    }

    /// Session statistics
    pub fn stats(&self) -> Output {
        let start = self.store.session_start();
        let (user, assistant) = self.store.counts();
        let mut output = Output::new();
        output.info("Session Statistics:");
        output.info(format!(
            "  Duration: {}",
            format_duration(Utc::now().signed_duration_since(start))
        ));
        output.info(format!(
            "  Messages exchanged: {} ({} user, {} assistant)",
            self.store.len(),
            user,
            assistant
        ));
        output.info(format!("  Model: {}", self.config.model));
        output.info(format!("  Host: {}", self.config.address()));
        output.info(format!(
            "  Streaming: {}",
            if self.config.streaming { "on" } else { "off" }
        ));
        output.info(format!(
            "  Session started: {}",
            start.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        ));
        output
    }

    /// Numbered preview of every message, oldest first
    pub fn history(&self) -> Output {
        let mut output = Output::new();
        if self.store.is_empty() {
            output.info("No conversation history yet.");
            return output;
        }

        output.system("--- Conversation History ---");
        for (i, message) in self.store.messages().iter().enumerate() {
            let style = match message.role {
                Role::User => Style::User,
                Role::Assistant => Style::Model,
            };
            output.push(
                style,
                format!(
                    "{}. {}: {}",
                    i + 1,
                    message.role,
                    truncate_string(&message.content, self.config.history_preview_chars)
                ),
            );
        }
        output.system("--- End History ---");
        output
    }

    /// Send `prompt` to the model and record the exchange
    ///
    /// The prompt is logged first. The reply is logged only if the
    /// service produced a complete, non-empty answer; otherwise the user
    /// message stays in the log without a reply.
    ///
    /// # Errors
    ///
    /// Only fails if writing to `out` fails; service failures are rendered.
    pub async fn query_model<W: Write>(&mut self, prompt: &str, out: &mut W) -> Result<Output> {
        self.state = SessionState::QueryingModel;
        self.store.add_user_message(prompt);

        writeln!(
            out,
            "{}",
            render(
                &format!("{} is thinking...", self.config.display_name),
                Style::System
            )
        )?;
        out.flush()?;

        let started = Instant::now();
        let mut output = Output::new();
        let reply = if self.config.streaming {
            self.stream_reply(prompt, out, &mut output).await?
        } else {
            self.complete_reply(prompt, &mut output).await
        };

        if let Some(text) = reply {
            self.store.add_assistant_message(text);
            output.system(format!(
                "[Response time: {:.2}s]",
                started.elapsed().as_secs_f64()
            ));
        }

        self.state = SessionState::AwaitingInput;
        Ok(output)
    }

    async fn complete_reply(&self, prompt: &str, output: &mut Output) -> Option<String> {
        match self.provider.generate(&self.config.model, prompt).await {
            Ok(text) if !text.is_empty() => {
                output.model(format!("{}: {}", self.config.display_name, text));
                Some(text)
            }
            Ok(_) => {
                output.error(self.no_response_line());
                None
            }
            Err(e) => {
                tracing::warn!("Generate failed: {:#}", e);
                output.error(error_line(&e));
                output.error(self.no_response_line());
                None
            }
        }
    }

    async fn stream_reply<W: Write>(
        &self,
        prompt: &str,
        out: &mut W,
        output: &mut Output,
    ) -> Result<Option<String>> {
        let bytes = match self
            .provider
            .generate_stream(&self.config.model, prompt)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Streaming generate failed: {:#}", e);
                output.error(error_line(&e));
                return Ok(None);
            }
        };

        let mut stream = ResponseStream::new(bytes);
        let mut text = String::new();
        write!(
            out,
            "{}",
            render(&format!("{}: ", self.config.display_name), Style::Model)
        )?;
        out.flush()?;

        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => {
                    write!(out, "{}", render(&fragment, Style::Model))?;
                    out.flush()?;
                    text.push_str(&fragment);
                }
                Err(e) => {
                    writeln!(out)?;
                    tracing::warn!("Stream failed after {} bytes of text: {:#}", text.len(), e);
                    output.error(error_line(&e));
                    return Ok(None);
                }
            }
        }
        writeln!(out)?;

        if !stream.saw_done() {
            output.error("Warning: Stream ended before the reply was complete; reply not saved");
            return Ok(None);
        }
        Ok(Some(text))
    }

    fn no_response_line(&self) -> String {
        format!(
            "Sorry, I couldn't get a response from {}.",
            self.config.display_name
        )
    }

    /// True if leaving now would lose unsaved messages
    pub fn has_history(&self) -> bool {
        !self.store.is_empty()
    }

    /// End the session, saving to the default path if `save` is set
    pub fn finish(&mut self, save: bool) -> Output {
        self.state = SessionState::Terminating;
        let mut output = Output::new();
        if save && self.has_history() {
            if let Err(e) = self.save(None, &mut output) {
                output.error(error_line(&e));
            }
        }
        output
    }
}

fn error_line(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ChatError>() {
        Some(ChatError::Validation(msg)) => msg.clone(),
        _ => format!("Error: {}", err),
    }
}

/// `H:MM:SS`
fn format_duration(duration: chrono::Duration) -> String {
    let secs = duration.num_seconds().max(0);
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
