//! Special commands parser for interactive chat mode
//!
//! Lines that start with the command prefix (`/` by default) are special
//! commands and are never sent to the model, even when they match no
//! known command. The command word is case-insensitive; arguments keep
//! their case. Available commands:
//! - `/help`, `/h` - show help
//! - `/models` - list models available on the service
//! - `/model <name>` - switch to another available model
//! - `/save [filename]`, `/load <filename>` - write or read a transcript
//! - `/clear`, `/history`, `/stats` - inspect or reset the conversation
//! - `/stream` - toggle streaming replies
//! - `/quit`, `/exit`, `/q` - leave the session

use thiserror::Error;

use crate::error::ChatError;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument. Usage: {usage}")]
    MissingArgument { command: String, usage: String },
}

impl From<CommandError> for ChatError {
    fn from(err: CommandError) -> Self {
        ChatError::Validation(err.to_string())
    }
}

/// Special commands that can be executed during interactive chat
///
/// These commands modify the session state or provide information,
/// rather than being sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Display help information
    Help,

    /// List the models the service reports
    ListModels,

    /// Switch to a different model
    ///
    /// The name is checked against the service's model list before the
    /// switch happens.
    SwitchModel(String),

    /// Save the conversation, to the given file or a generated name
    Save(Option<String>),

    /// Replace the conversation with one loaded from a file
    Load(String),

    /// Clear the conversation history
    Clear,

    /// Display session statistics
    Stats,

    /// Toggle streaming replies on or off
    ToggleStream,

    /// Display a preview of every message so far
    History,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the model as a prompt.
    None,
}

/// Parse a user input string into a special command
///
/// # Arguments
///
/// * `input` - The user input line
/// * `prefix` - Character that marks a line as a command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if input starts with the prefix
/// but names no command, and `CommandError::MissingArgument` for `/model`
/// or `/load` without an argument.
///
/// # Examples
///
/// ```
/// use ollama_chat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/MODEL phi4-mini:3.8b", '/').unwrap();
/// assert_eq!(cmd, SpecialCommand::SwitchModel("phi4-mini:3.8b".to_string()));
///
/// let cmd = parse_special_command("hello model", '/').unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// // Unknown commands are errors, never prompts
/// assert!(parse_special_command("/foo", '/').is_err());
/// ```
pub fn parse_special_command(input: &str, prefix: char) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let Some(body) = trimmed.strip_prefix(prefix) else {
        return Ok(SpecialCommand::None);
    };

    let (word, rest) = match body.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (body, ""),
    };
    let arg = (!rest.is_empty()).then(|| rest.to_string());
    let name = word.to_lowercase();

    let missing = |usage: &str| CommandError::MissingArgument {
        command: format!("{}{}", prefix, name),
        usage: format!("{}{}", prefix, usage),
    };

    match name.as_str() {
        "help" | "h" => Ok(SpecialCommand::Help),
        "models" => Ok(SpecialCommand::ListModels),
        "model" => arg
            .map(SpecialCommand::SwitchModel)
            .ok_or_else(|| missing("model <name>")),
        "save" => Ok(SpecialCommand::Save(arg)),
        "load" => arg
            .map(SpecialCommand::Load)
            .ok_or_else(|| missing("load <filename>")),
        "clear" => Ok(SpecialCommand::Clear),
        "stats" => Ok(SpecialCommand::Stats),
        "stream" => Ok(SpecialCommand::ToggleStream),
        "history" => Ok(SpecialCommand::History),
        "quit" | "exit" | "q" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(format!("{}{}", prefix, name))),
    }
}

/// Help text listing every command
pub fn help_text(prefix: char, display_name: &str) -> String {
    format!(
        r#"
Available commands:
  {p}help, {p}h          - Show this help message
  {p}models            - List available models
  {p}model <name>      - Switch to a different model
  {p}save [filename]   - Save conversation to file
  {p}load <filename>   - Load conversation from file
  {p}clear             - Clear conversation history
  {p}stats             - Show session statistics
  {p}quit, {p}exit, {p}q   - Exit the chat
  {p}stream            - Toggle streaming mode
  {p}history           - Show conversation history

Regular messages will be sent to {name} for processing.
"#,
        p = prefix,
        name = display_name
    )
}
