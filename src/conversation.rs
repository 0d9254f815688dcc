//! In-memory conversation log
//!
//! The store keeps the ordered list of user and assistant messages for
//! one session, stamps each message as it is appended, and converts to
//! and from the on-disk [`Transcript`].

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::transcript::{self, Transcript};

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    #[serde(with = "crate::transcript::timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }
}

/// What a successful load brought in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    /// Number of messages now in the log
    pub count: usize,
    /// Model recorded in the transcript
    pub model: String,
    /// Host recorded in the transcript
    pub host: String,
}

/// Ordered, append-only log of the current conversation
///
/// Timestamps never go backwards: a message appended while the wall clock
/// reads earlier than the previous entry gets the previous entry's time.
///
/// # Examples
///
/// ```
/// use ollama_chat::conversation::{ConversationStore, Role};
///
/// let mut store = ConversationStore::new();
/// store.add_user_message("Hello");
/// store.add_assistant_message("Hi there");
///
/// assert_eq!(store.len(), 2);
/// assert_eq!(store.messages()[1].role, Role::Assistant);
/// ```
#[derive(Debug, Clone)]
pub struct ConversationStore {
    session_start: DateTime<Utc>,
    messages: Vec<ConversationMessage>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    /// An empty log whose session starts now
    pub fn new() -> Self {
        Self::with_session_start(Utc::now())
    }

    pub fn with_session_start(session_start: DateTime<Utc>) -> Self {
        Self {
            session_start,
            messages: Vec::new(),
        }
    }

    /// Add a message stamped with the current time
    pub fn append(&mut self, role: Role, content: impl Into<String>) -> &ConversationMessage {
        self.append_at(role, content, Utc::now())
    }

    /// Add a message stamped with `at`, or the previous entry's time if later
    pub fn append_at(
        &mut self,
        role: Role,
        content: impl Into<String>,
        at: DateTime<Utc>,
    ) -> &ConversationMessage {
        let timestamp = match self.messages.last() {
            Some(last) if last.timestamp > at => last.timestamp,
            _ => at,
        };
        let index = self.messages.len();
        self.messages
            .push(ConversationMessage::new(role, content, timestamp));
        &self.messages[index]
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) -> &ConversationMessage {
        self.append(Role::User, content)
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) -> &ConversationMessage {
        self.append(Role::Assistant, content)
    }

    /// Remove every message; the session start is kept
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    /// Count messages by role as `(user, assistant)`
    pub fn counts(&self) -> (usize, usize) {
        self.messages
            .iter()
            .fold((0, 0), |(user, assistant), m| match m.role {
                Role::User => (user + 1, assistant),
                Role::Assistant => (user, assistant + 1),
            })
    }

    /// Project the log and session metadata into a transcript
    pub fn to_transcript(&self, model: &str, host: &str) -> Transcript {
        Transcript {
            session_start: self.session_start,
            model: model.to_string(),
            host: host.to_string(),
            conversation: self.messages.clone(),
        }
    }

    /// Write the log to `path`, or to the default path for `prefix`
    ///
    /// Returns the path actually written.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Persistence` if the file cannot be written
    pub fn save(
        &self,
        path: Option<&Path>,
        model: &str,
        host: &str,
        prefix: &str,
    ) -> Result<PathBuf> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => transcript::default_transcript_path(prefix, self.session_start),
        };
        transcript::save_transcript(&path, &self.to_transcript(model, host))?;
        tracing::info!("Saved {} messages to {}", self.len(), path.display());
        Ok(path)
    }

    /// Replace the log with the conversation stored at `path`
    ///
    /// The session start is not changed. On any error the current log is
    /// left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Persistence` if the file is unreadable or malformed
    pub fn load(&mut self, path: &Path) -> Result<LoadSummary> {
        let transcript = transcript::load_transcript(path)?;
        self.messages = transcript.conversation;
        tracing::info!("Loaded {} messages from {}", self.len(), path.display());
        Ok(LoadSummary {
            count: self.messages.len(),
            model: transcript.model,
            host: transcript.host,
        })
    }
}

/// Shorten `s` to at most `max_len` characters, ending in "..." if cut
///
/// # Examples
///
/// ```
/// use ollama_chat::conversation::truncate_string;
///
/// assert_eq!(truncate_string("short", 10), "short");
/// assert_eq!(truncate_string("a longer sentence", 10), "a longe...");
/// ```
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return s.chars().take(max_len).collect();
    }
    let mut out: String = s.chars().take(max_len - 3).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    #[test]
    fn test_append_preserves_order_and_count() {
        let mut store = ConversationStore::new();
        for i in 0..25 {
            let role = if i % 3 == 0 { Role::Assistant } else { Role::User };
            store.append(role, format!("message {}", i));
        }
        assert_eq!(store.len(), 25);
        for (i, message) in store.messages().iter().enumerate() {
            assert_eq!(message.content, format!("message {}", i));
        }
        assert!(store
            .messages()
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_append_never_goes_back_in_time() {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let mut store = ConversationStore::with_session_start(start);
        store.append_at(Role::User, "later", start + Duration::seconds(30));
        let stamped = store
            .append_at(Role::Assistant, "clock stepped back", start)
            .timestamp;
        assert_eq!(stamped, start + Duration::seconds(30));
    }

    #[test]
    fn test_clear_keeps_session_start() {
        let mut store = ConversationStore::new();
        let start = store.session_start();
        store.add_user_message("x");
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.session_start(), start);
    }

    #[test]
    fn test_counts() {
        let mut store = ConversationStore::new();
        store.add_user_message("a");
        store.add_assistant_message("b");
        store.add_user_message("c");
        assert_eq!(store.counts(), (2, 1));
    }

    #[test]
    fn test_save_then_load_into_fresh_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.json");

        let mut original = ConversationStore::new();
        original.add_user_message("Hello");
        original.add_assistant_message("Hi there");
        let written = original
            .save(Some(&path), "gemma2:9b", "localhost", "gemma_conversation")
            .unwrap();
        assert_eq!(written, path);

        let mut restored = ConversationStore::new();
        let summary = restored.load(&path).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.model, "gemma2:9b");
        assert_eq!(summary.host, "localhost");
        assert_eq!(restored.messages(), original.messages());
    }

    #[test]
    fn test_save_to_default_path() {
        let dir = TempDir::new().unwrap();
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let mut store = ConversationStore::with_session_start(start);
        store.add_user_message("Hello");

        let prefix = dir.path().join("gemma_conversation");
        let path = store
            .save(None, "gemma2:9b", "localhost", &prefix.to_string_lossy())
            .unwrap();

        assert!(path.exists());
        assert_eq!(
            path,
            transcript::default_transcript_path(&prefix.to_string_lossy(), start)
        );
    }

    #[test]
    fn test_failed_load_preserves_log() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();

        let mut store = ConversationStore::new();
        store.add_user_message("keep me");

        let err = store.load(&bad).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChatError>(),
            Some(ChatError::Persistence(_))
        ));
        assert!(store.load(&dir.path().join("missing.json")).is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(store.messages()[0].content, "keep me");
    }

    #[test]
    fn test_load_replaces_wholesale() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.json");
        let mut saved = ConversationStore::new();
        saved.add_user_message("only one");
        saved.save(Some(&path), "m", "h", "p").unwrap();

        let mut store = ConversationStore::new();
        store.add_user_message("a");
        store.add_assistant_message("b");
        store.add_user_message("c");
        assert_eq!(store.load(&path).unwrap().count, 1);
        assert_eq!(store.messages()[0].content, "only one");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("", 5), "");
        assert_eq!(truncate_string("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_string("exactly11!!", 10), "exactly...");
        assert_eq!(truncate_string("héllo wörld", 8), "héllo...");
        assert_eq!(truncate_string("abcdef", 2), "ab");
        assert_eq!(truncate_string(&"x".repeat(500), 100).chars().count(), 100);
    }

    #[test]
    fn test_role_display_and_serde() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }
}
