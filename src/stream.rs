//! Incremental decoder for streaming generate responses
//!
//! A streaming reply is a sequence of newline-delimited JSON records such
//! as `{"response":"He","done":false}`, delivered in byte chunks that do not
//! line up with record boundaries. [`LineDecoder`] is the synchronous core:
//! it buffers bytes until a line is complete, decodes each line, and emits
//! [`StreamEvent`]s. [`ResponseStream`] drives a decoder over a
//! [`ByteStream`] and exposes the reply as a stream of text fragments.
//!
//! Lines that are not valid records, or that carry neither a `response`
//! nor a `done` field, are skipped. A `done: true` record ends the reply
//! even if more bytes follow.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, BytesMut};
use futures::{Stream, StreamExt};
use serde::Deserialize;

use crate::error::{ChatError, Result};
use crate::providers::ByteStream;

/// One decoded record's worth of information
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A piece of reply text, in order
    Fragment(String),
    /// The service marked the reply complete
    Done,
}

/// Wire shape of a streaming record; every other field is ignored
#[derive(Debug, Deserialize)]
struct StreamRecord {
    response: Option<String>,
    done: Option<bool>,
}

fn trim_ascii_whitespace(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if !first.is_ascii_whitespace() {
            break;
        }
        bytes = rest;
    }
    while let [rest @ .., last] = bytes {
        if !last.is_ascii_whitespace() {
            break;
        }
        bytes = rest;
    }
    bytes
}

/// Decode one complete line
///
/// Returns an empty list for keep-alive and malformed lines.
fn decode_line(line: &[u8]) -> Vec<StreamEvent> {
    let trimmed = trim_ascii_whitespace(line);
    if trimmed.is_empty() {
        return Vec::new();
    }

    let record: StreamRecord = match serde_json::from_slice(trimmed) {
        Ok(record) => record,
        Err(e) => {
            let err = ChatError::Decode(format!("{} ({} bytes)", e, trimmed.len()));
            tracing::debug!("Skipping stream record: {}", err);
            return Vec::new();
        }
    };

    if record.response.is_none() && record.done.is_none() {
        tracing::debug!("Skipping stream record without response or done");
        return Vec::new();
    }

    let mut events = Vec::with_capacity(2);
    if let Some(text) = record.response.filter(|text| !text.is_empty()) {
        events.push(StreamEvent::Fragment(text));
    }
    if record.done == Some(true) {
        events.push(StreamEvent::Done);
    }
    events
}

/// Partial-line buffer over newline-delimited JSON records
///
/// # Examples
///
/// ```
/// use ollama_chat::stream::{LineDecoder, StreamEvent};
///
/// let mut decoder = LineDecoder::new();
/// assert!(decoder.feed(b"{\"respons").is_empty());
/// assert_eq!(
///     decoder.feed(b"e\":\"llo\"}\n{\"done\":true}\n"),
///     vec![StreamEvent::Fragment("llo".to_string()), StreamEvent::Done]
/// );
/// ```
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: BytesMut,
    /// Prefix of `buffer` already known to hold no newline
    scanned: usize,
    done: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and decode every line it completes
    ///
    /// Once a `Done` event has been produced, the rest of the input is
    /// ignored and later calls return nothing.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
            let line = self.buffer.split_to(self.scanned + offset + 1);
            self.scanned = 0;
            if self.push_line(&line, &mut events) {
                return events;
            }
        }
        self.scanned = self.buffer.len();
        events
    }

    /// Decode whatever remains in the buffer as a final, unterminated line
    ///
    /// Used when the byte source ends cleanly.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if !self.done && !self.buffer.is_empty() {
            let line = self.buffer.split();
            self.push_line(&line, &mut events);
        }
        self.buffer.clear();
        self.scanned = 0;
        events
    }

    /// Drop any buffered partial line and forget a previous `Done`
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
        self.done = false;
    }

    /// Whether a `Done` record has been decoded
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Bytes waiting for a line terminator
    pub fn pending_bytes(&self) -> usize {
        self.buffer.remaining()
    }

    /// Decode `line` into `events`; returns true if it ended the reply
    fn push_line(&mut self, line: &[u8], events: &mut Vec<StreamEvent>) -> bool {
        for event in decode_line(line) {
            let is_done = event == StreamEvent::Done;
            events.push(event);
            if is_done {
                self.done = true;
                self.buffer.clear();
                self.scanned = 0;
                return true;
            }
        }
        false
    }
}

/// How a [`ResponseStream`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// Still running
    Open,
    /// A `done` record arrived
    Done,
    /// The bytes ran out without a `done` record
    Truncated,
    /// The byte source failed
    Failed,
}

/// A streaming reply as a lazy sequence of text fragments
///
/// Yields `Ok(fragment)` for every piece of text as soon as the line that
/// carries it is complete, `Err` once if the byte source fails, and then
/// ends. [`ResponseStream::end`] reports why it ended.
pub struct ResponseStream {
    bytes: ByteStream,
    decoder: LineDecoder,
    pending: VecDeque<String>,
    end: StreamEnd,
}

impl ResponseStream {
    pub fn new(bytes: ByteStream) -> Self {
        Self {
            bytes,
            decoder: LineDecoder::new(),
            pending: VecDeque::new(),
            end: StreamEnd::Open,
        }
    }

    /// Why the stream ended, or `StreamEnd::Open` while it is running
    pub fn end(&self) -> StreamEnd {
        self.end
    }

    /// True only if the service sent a `done` record
    pub fn saw_done(&self) -> bool {
        self.end == StreamEnd::Done
    }

    /// Drain the whole stream into one string
    ///
    /// # Errors
    ///
    /// Returns the transport error if the byte source fails
    pub async fn collect_text(mut self) -> Result<(String, StreamEnd)> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            text.push_str(&fragment?);
        }
        Ok((text, self.end))
    }

    fn queue(&mut self, events: Vec<StreamEvent>) {
        for event in events {
            match event {
                StreamEvent::Fragment(text) => self.pending.push_back(text),
                StreamEvent::Done => self.end = StreamEnd::Done,
            }
        }
    }
}

impl Stream for ResponseStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            if let Some(fragment) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(fragment)));
            }
            if this.end != StreamEnd::Open {
                return Poll::Ready(None);
            }

            match this.bytes.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    let events = this.decoder.feed(&chunk);
                    this.queue(events);
                }
                Poll::Ready(Some(Err(e))) => {
                    this.decoder.reset();
                    this.end = StreamEnd::Failed;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    let events = this.decoder.finish();
                    this.queue(events);
                    if this.end == StreamEnd::Open {
                        tracing::warn!("Stream ended without a done record");
                        this.end = StreamEnd::Truncated;
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
