/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `chat`: the interactive chat loop
- `special_commands`: parsing of `/` commands typed inside the loop

The loop itself is thin. All session semantics live in
[`crate::session::Session`]; the handler reads lines, hands them over and
prints what comes back.
*/

// Special commands parser for the interactive loop
pub mod special_commands;

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Creates the provider, connects the session, and runs a
    //! readline-based loop until the user exits or interrupts.

    use std::io::Write;

    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    use crate::config::Config;
    use crate::error::Result;
    use crate::providers::create_provider;
    use crate::render::{render, Output, Style};
    use crate::session::{Control, Session, SessionConfig};

    /// How the chat ended
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ChatExit {
        /// The user quit or interrupted the session
        Finished,
        /// The service did not answer the startup probe
        Unreachable,
    }

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client or line editor cannot be created,
    /// or if the terminal cannot be written to.
    ///
    /// # Examples
    ///
    /// ```
    /// use ollama_chat::commands::chat;
    /// use ollama_chat::config::Config;
    ///
    /// // In application code:
    /// // let exit = chat::run_chat(Config::default()).await?;
    /// ```
    pub async fn run_chat(config: Config) -> Result<ChatExit> {
        let provider = create_provider(&config)?;
        tracing::info!(
            "Starting chat with {} at {}",
            config.profile.model,
            config.server.base_url()
        );
        run_session(Session::new(provider, SessionConfig::from_config(&config))).await
    }

    /// Drive an already constructed session through its whole lifecycle
    pub async fn run_session(mut session: Session) -> Result<ChatExit> {
        let mut stdout = std::io::stdout();

        let mut connecting = Output::new();
        connecting.system("Connecting to Ollama service...");
        connecting.write_to(&mut stdout)?;

        match session.connect().await {
            Ok(output) => output.write_to(&mut stdout)?,
            Err(e) => {
                tracing::error!("Startup probe failed: {:#}", e);
                session.connection_help().write_to(&mut stdout)?;
                return Ok(ChatExit::Unreachable);
            }
        }
        session.banner().write_to(&mut stdout)?;

        let mut rl = DefaultEditor::new()?;
        let prompt = render("You: ", Style::User);

        loop {
            writeln!(stdout)?;
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    let outcome = session.handle_line(trimmed, &mut stdout).await?;
                    outcome.output.write_to(&mut stdout)?;
                    if outcome.control == Control::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    writeln!(stdout)?;
                    writeln!(stdout, "{}", render("Goodbye! 👋", Style::System))?;
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    readline_failure(&err).write_to(&mut stdout)?;
                    break;
                }
            }
        }

        let save = session.has_history() && confirm_save(&mut stdout)?;
        session.finish(save).write_to(&mut stdout)?;
        Ok(ChatExit::Finished)
    }

    /// What the user sees when the line editor fails for a reason other
    /// than Ctrl-C or end of input
    fn readline_failure(err: &ReadlineError) -> Output {
        let mut output = Output::new();
        output.error(format!("Error: Failed to read input: {}", err));
        output
    }

    /// Ask whether to save before leaving; anything but y/yes is a no
    ///
    /// Reads from plain stdin so the question is shown even when input is
    /// piped.
    fn confirm_save(out: &mut impl Write) -> Result<bool> {
        write!(out, "\nSave conversation? (y/N): ")?;
        out.flush()?;

        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer)? == 0 {
            return Ok(false);
        }
        Ok(matches!(
            answer.trim().to_lowercase().as_str(),
            "y" | "yes"
        ))
    }

}
