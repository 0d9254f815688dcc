//! On-disk transcript format
//!
//! A transcript is a pretty-printed JSON document:
//!
//! ```json
//! {
//!   "session_start": "2026-01-15T10:00:00Z",
//!   "model": "gemma2:9b",
//!   "host": "localhost",
//!   "conversation": [
//!     {"role": "user", "content": "Hello", "timestamp": "2026-01-15T10:00:05Z"}
//!   ]
//! }
//! ```
//!
//! `sessionStart` is accepted in place of `session_start`. Timestamps
//! without an offset are read as local time. Unknown fields are ignored.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::ConversationMessage;
use crate::error::{ChatError, Result};

/// Snapshot of a session written by `/save` and read by `/load`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(alias = "sessionStart", with = "timestamp")]
    pub session_start: DateTime<Utc>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub conversation: Vec<ConversationMessage>,
}

/// Write `transcript` to `path`, replacing any existing file
///
/// The document is written to a sibling temporary file first and then
/// renamed into place, so a failed write never leaves a truncated
/// transcript behind.
pub fn save_transcript(path: &Path, transcript: &Transcript) -> Result<()> {
    write_atomic(path, transcript).map_err(|e| {
        anyhow::Error::from(ChatError::Persistence(format!(
            "Failed to save {}: {}",
            path.display(),
            e
        )))
    })
}

fn write_atomic(path: &Path, transcript: &Transcript) -> std::result::Result<(), ChatError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(transcript)?;
    let tmp_path = tmp_sibling(path);
    std::fs::write(&tmp_path, content)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(ChatError::from(e));
    }
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Read and parse a transcript
///
/// # Errors
///
/// Returns `ChatError::Persistence` if the file cannot be read or is not a
/// valid transcript.
pub fn load_transcript(path: &Path) -> Result<Transcript> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ChatError::Persistence(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let transcript = serde_json::from_str(&content).map_err(|e| {
        ChatError::Persistence(format!("Malformed transcript {}: {}", path.display(), e))
    })?;
    Ok(transcript)
}

/// `<prefix>_<YYYYmmdd_HHMMSS>.json`, using local time
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use ollama_chat::transcript::default_transcript_path;
///
/// let path = default_transcript_path("gemma_conversation", Utc::now());
/// let name = path.to_string_lossy();
/// assert!(name.starts_with("gemma_conversation_"));
/// assert!(name.ends_with(".json"));
/// ```
pub fn default_transcript_path(prefix: &str, session_start: DateTime<Utc>) -> PathBuf {
    let stamp = session_start.with_timezone(&Local).format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("{}_{}.json", prefix, stamp))
}

/// Serde adapter for transcript timestamps
///
/// Writes RFC 3339 in UTC. Reads RFC 3339, or a naive ISO-8601 date-time
/// which is taken to be local time.
pub mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    /// Parse an RFC 3339 or naive local timestamp
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())?;
        let local = Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc());
        Some(local)
    }
}
