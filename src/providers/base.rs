//! Base provider trait for ollama-chat
//!
//! This module defines the Provider trait that the session controller
//! talks to. It covers exactly four operations: a reachability probe,
//! model listing, and a generate call in complete or streaming form.
//! Nothing else about the transport is assumed.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// Raw response body of a streaming generate call
///
/// Chunks arrive in arbitrary sizes that need not line up with record
/// boundaries. An `Err` item means the connection failed mid-stream.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Text-generation service client
///
/// All calls are awaited one at a time by the session controller; an
/// implementation never sees concurrent calls from it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Lightweight reachability check
    ///
    /// Never fails; any transport problem is reported as `false`.
    async fn probe(&self) -> bool;

    /// Names of the models the service can run, in service order
    ///
    /// # Errors
    ///
    /// Returns a transport-family `ChatError` if the service cannot be
    /// queried or answers with an unexpected payload
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Generate a reply in one blocking call
    ///
    /// # Arguments
    ///
    /// * `model` - Model to run
    /// * `prompt` - User prompt
    ///
    /// # Errors
    ///
    /// Returns a transport-family `ChatError` on connection failure,
    /// timeout, or non-success status
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;

    /// Start a streaming generate call and hand back the raw body
    ///
    /// # Errors
    ///
    /// Returns a transport-family `ChatError` if the call cannot be
    /// started; failures after that surface as items of the stream
    async fn generate_stream(&self, model: &str, prompt: &str) -> Result<ByteStream>;

    /// Human-readable address of the service, used in diagnostics
    fn endpoint(&self) -> String;
}
