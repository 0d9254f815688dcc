//! In-process fake provider for unit tests
//!
//! [`FakeProvider`] replaces real network I/O with a script: a fixed
//! reachability answer, a fixed model list, and a queue of replies that
//! generate calls consume in order. Clones share the same state, so a
//! test can hand one clone to a session and inspect the other.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;

use crate::error::{ChatError, Result};
use crate::providers::{ByteStream, Provider};

/// A scripted failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeFailure {
    Transport(String),
    Timeout(String),
    Status(u16),
}

impl FakeFailure {
    fn to_error(&self) -> anyhow::Error {
        match self {
            Self::Transport(msg) => ChatError::Transport(msg.clone()).into(),
            Self::Timeout(msg) => ChatError::Timeout(msg.clone()).into(),
            Self::Status(status) => ChatError::HttpStatus {
                status: *status,
                body: String::new(),
            }
            .into(),
        }
    }
}

#[derive(Debug, Clone)]
enum FakeReply {
    Text(String),
    Chunks(Vec<Bytes>),
    ChunksThenFailure(Vec<Bytes>, FakeFailure),
    Failure(FakeFailure),
}

#[derive(Debug)]
struct FakeState {
    reachable: bool,
    models: std::result::Result<Vec<String>, FakeFailure>,
    replies: VecDeque<FakeReply>,
    prompts: Vec<(String, String)>,
    list_calls: usize,
}

/// Scripted [`Provider`] for tests
#[derive(Debug, Clone)]
pub struct FakeProvider {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeProvider {
    /// A reachable service with no models and no scripted replies
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                reachable: true,
                models: Ok(Vec::new()),
                replies: VecDeque::new(),
                prompts: Vec::new(),
                list_calls: 0,
            })),
        }
    }

    fn with_state(self, f: impl FnOnce(&mut FakeState)) -> Self {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
        self
    }

    /// Make the reachability probe fail
    pub fn unreachable(self) -> Self {
        self.with_state(|s| s.reachable = false)
    }

    /// Models reported by `list_models`
    pub fn with_models<I, S>(self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let models: Vec<String> = models.into_iter().map(Into::into).collect();
        self.with_state(|s| s.models = Ok(models))
    }

    /// Make `list_models` fail
    pub fn with_models_failure(self, failure: FakeFailure) -> Self {
        self.with_state(|s| s.models = Err(failure))
    }

    /// Queue a complete-mode reply
    pub fn push_text(self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.with_state(|s| s.replies.push_back(FakeReply::Text(text)))
    }

    /// Queue a streaming body delivered as the given chunks
    pub fn push_chunks<I, B>(self, chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let chunks: Vec<Bytes> = chunks.into_iter().map(Into::into).collect();
        self.with_state(|s| s.replies.push_back(FakeReply::Chunks(chunks)))
    }

    /// Queue a streaming body that fails after the given chunks
    pub fn push_stream_failure<I, B>(self, chunks: I, failure: FakeFailure) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let chunks: Vec<Bytes> = chunks.into_iter().map(Into::into).collect();
        self.with_state(|s| {
            s.replies
                .push_back(FakeReply::ChunksThenFailure(chunks, failure))
        })
    }

    /// Queue a generate call that fails before any reply
    pub fn push_failure(self, failure: FakeFailure) -> Self {
        self.with_state(|s| s.replies.push_back(FakeReply::Failure(failure)))
    }

    /// `(model, prompt)` pairs of every generate call so far
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .map(|s| s.prompts.clone())
            .unwrap_or_default()
    }

    /// Number of `list_models` calls so far
    pub fn list_calls(&self) -> usize {
        self.state.lock().map(|s| s.list_calls).unwrap_or_default()
    }

    fn next_reply(&self, model: &str, prompt: &str) -> Result<FakeReply> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ChatError::Transport("fake provider state poisoned".to_string()))?;
        state.prompts.push((model.to_string(), prompt.to_string()));
        state
            .replies
            .pop_front()
            .ok_or_else(|| ChatError::Transport("no scripted reply".to_string()).into())
    }
}

#[async_trait]
impl Provider for FakeProvider {
    async fn probe(&self) -> bool {
        self.state.lock().map(|s| s.reachable).unwrap_or(false)
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ChatError::Transport("fake provider state poisoned".to_string()))?;
        state.list_calls += 1;
        state.models.clone().map_err(|failure| failure.to_error())
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        match self.next_reply(model, prompt)? {
            FakeReply::Text(text) => Ok(text),
            FakeReply::Failure(failure) => Err(failure.to_error()),
            FakeReply::Chunks(_) | FakeReply::ChunksThenFailure(..) => Err(ChatError::Transport(
                "scripted a streaming reply for a complete call".to_string(),
            )
            .into()),
        }
    }

    async fn generate_stream(&self, model: &str, prompt: &str) -> Result<ByteStream> {
        let items: Vec<Result<Bytes>> = match self.next_reply(model, prompt)? {
            FakeReply::Chunks(chunks) => chunks.into_iter().map(Ok).collect(),
            FakeReply::ChunksThenFailure(chunks, failure) => chunks
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(failure.to_error())))
                .collect(),
            FakeReply::Failure(failure) => return Err(failure.to_error()),
            FakeReply::Text(_) => {
                return Err(ChatError::Transport(
                    "scripted a complete reply for a streaming call".to_string(),
                )
                .into())
            }
        };
        Ok(Box::pin(stream::iter(items)))
    }

    fn endpoint(&self) -> String {
        "fake://ollama".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_scripted_models_and_reply() {
        let fake = FakeProvider::new().with_models(["a", "b"]).push_text("Hi there");

        assert_eq!(fake.list_models().await.unwrap(), vec!["a", "b"]);
        assert_eq!(fake.generate("a", "Hello").await.unwrap(), "Hi there");
        assert_eq!(fake.prompts(), vec![("a".to_string(), "Hello".to_string())]);
    }

    #[tokio::test]
    async fn test_unreachable() {
        assert!(FakeProvider::new().probe().await);
        assert!(!FakeProvider::new().unreachable().probe().await);
    }

    #[tokio::test]
    async fn test_replies_are_consumed_in_order() {
        let fake = FakeProvider::new().push_text("one").push_text("two");
        assert_eq!(fake.generate("m", "a").await.unwrap(), "one");
        assert_eq!(fake.generate("m", "b").await.unwrap(), "two");
        assert!(fake.generate("m", "c").await.is_err());
        assert_eq!(fake.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_stream_failure_after_chunks() {
        let fake = FakeProvider::new().push_stream_failure(
            vec!["{\"response\":\"a\"}\n"],
            FakeFailure::Transport("reset".to_string()),
        );
        let mut stream = fake.generate_stream("m", "p").await.unwrap();
        assert!(stream.next().await.unwrap().is_ok());
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_models_failure() {
        let fake = FakeProvider::new().with_models_failure(FakeFailure::Status(500));
        let err = fake.list_models().await.unwrap_err();
        assert!(err.downcast_ref::<ChatError>().unwrap().is_transport());
        assert_eq!(fake.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let fake = FakeProvider::new().push_text("hi");
        let clone = fake.clone();
        clone.generate("m", "hello").await.unwrap();
        assert_eq!(fake.prompts(), vec![("m".to_string(), "hello".to_string())]);
    }
}
