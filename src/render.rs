//! Terminal rendering
//!
//! Session operations never print. They return an [`Output`], a list of
//! styled [`Line`]s, and the REPL driver turns each line into a string
//! with [`render`]. Progress lines and streamed reply text are the only
//! output written while an operation is still running.

use colored::Colorize;
use std::fmt;

/// Visual role of a rendered line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Echo of the user's own text
    User,
    /// Text produced by the model
    Model,
    /// Session chrome: banners, progress, timings
    System,
    /// Failures reported to the user
    Error,
    /// Command results and notices
    Info,
}

/// Format `text` for the terminal in the given style
///
/// # Examples
///
/// ```
/// use ollama_chat::render::{render, Style};
///
/// colored::control::set_override(false);
/// assert_eq!(render("hello", Style::Info), "hello");
/// ```
pub fn render(text: &str, style: Style) -> String {
    match style {
        Style::User => text.green().to_string(),
        Style::Model => text.blue().to_string(),
        Style::System => text.yellow().to_string(),
        Style::Error => text.red().to_string(),
        Style::Info => text.cyan().to_string(),
    }
}

/// One styled line of output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub style: Style,
    pub text: String,
}

impl Line {
    pub fn new(style: Style, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render(&self.text, self.style))
    }
}

/// Ordered lines produced by one session operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    lines: Vec<Line>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, style: Style, text: impl Into<String>) {
        self.lines.push(Line::new(style, text));
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(Style::Info, text);
    }

    pub fn system(&mut self, text: impl Into<String>) {
        self.push(Style::System, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(Style::Error, text);
    }

    pub fn model(&mut self, text: impl Into<String>) {
        self.push(Style::Model, text);
    }

    /// Append all lines of `other`
    pub fn extend(&mut self, other: Output) {
        self.lines.extend(other.lines);
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True if any line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.text.contains(needle))
    }

    /// True if any line of the given style contains `needle`
    pub fn contains_styled(&self, style: Style, needle: &str) -> bool {
        self.lines
            .iter()
            .any(|line| line.style == style && line.text.contains(needle))
    }

    /// Write every line, rendered, to `writer`
    pub fn write_to(&self, writer: &mut impl std::io::Write) -> std::io::Result<()> {
        for line in &self.lines {
            writeln!(writer, "{}", line)?;
        }
        Ok(())
    }
}
