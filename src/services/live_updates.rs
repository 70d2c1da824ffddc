//! Live Update Channel for docviewer.
//!
//! Holds one long-lived subscription to the document server's event stream
//! (`text/event-stream`) and forwards decoded [`PushEvent`]s and connection
//! transitions to the consumer over a tokio channel. The consumer owns all
//! tab state; this module never touches it.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Url};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::types::errors::StreamError;
use crate::types::event::{ChannelMessage, ConnectionState, PushEvent};

const CHANNEL_CAPACITY: usize = 128;

/// Incremental decoder for server-sent event frames.
///
/// Feed it raw bytes as they arrive; it returns the `data` payload of every
/// frame completed by the chunk. Multiple `data:` lines in one frame are
/// joined with `\n` and comment lines and other fields are ignored. Lines
/// may end in `\n`, `\r\n` or a bare `\r`, even when the pair is split
/// across two chunks.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// The previous chunk ended in `\r`; a leading `\n` belongs to it.
    after_cr: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        for &byte in chunk {
            if std::mem::take(&mut self.after_cr) && byte == b'\n' {
                continue;
            }
            if byte == b'\r' {
                self.buffer.push(b'\n');
                self.after_cr = true;
            } else {
                self.buffer.push(byte);
            }
        }

        let mut payloads = Vec::new();
        while let Some(end) = find_frame_end(&self.buffer) {
            let frame: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(data) = frame_data(&String::from_utf8_lossy(&frame[..end])) {
                payloads.push(data);
            }
        }
        payloads
    }
}

fn find_frame_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn frame_data(frame: &str) -> Option<String> {
    let mut data: Option<String> = None;
    for line in frame.lines() {
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            match data.as_mut() {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(value);
                }
                None => data = Some(value.to_string()),
            }
        }
    }
    data
}

/// Decodes one event payload, dispatching explicitly on its `type` tag.
pub fn decode_event(payload: &str) -> Result<PushEvent, StreamError> {
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| StreamError::MalformedEvent(e.to_string()))?;
    let tag = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| StreamError::MalformedEvent("missing type tag".to_string()))?;
    if !PushEvent::KNOWN_TAGS.contains(&tag) {
        return Err(StreamError::UnknownEvent(tag.to_string()));
    }
    serde_json::from_value(value).map_err(|e| StreamError::MalformedEvent(e.to_string()))
}

/// Persistent subscription to `{base}/api/documents/stream`.
pub struct LiveUpdateChannel {
    client: Client,
    url: Url,
    retry_delay: Duration,
}

impl LiveUpdateChannel {
    pub fn new(base_url: &str, retry_delay: Duration) -> Result<Self, StreamError> {
        let mut url = Url::parse(base_url).map_err(|e| StreamError::ConnectionError(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StreamError::ConnectionError("base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["api", "documents", "stream"]);
        Ok(Self {
            client: Client::new(),
            url,
            retry_delay,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Runs the subscription on a background task.
    pub fn spawn(self) -> (JoinHandle<()>, mpsc::Receiver<ChannelMessage>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let handle = tokio::spawn(self.run(tx));
        (handle, rx)
    }

    /// Connects, forwards events, and reconnects after `retry_delay` whenever
    /// the stream ends or fails. Returns once the receiver is dropped.
    pub async fn run(self, tx: mpsc::Sender<ChannelMessage>) {
        loop {
            if tx
                .send(ChannelMessage::Connection(ConnectionState::Connecting))
                .await
                .is_err()
            {
                return;
            }

            match self.stream_once(&tx).await {
                Ok(()) => info!(url = %self.url, "event stream closed by server"),
                Err(e) => warn!(url = %self.url, error = %e, "event stream failed"),
            }

            if tx
                .send(ChannelMessage::Connection(ConnectionState::Disconnected))
                .await
                .is_err()
            {
                return;
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn stream_once(&self, tx: &mpsc::Sender<ChannelMessage>) -> Result<(), StreamError> {
        let resp = self
            .client
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| StreamError::ConnectionError(e.to_string()))?;

        info!(url = %self.url, "event stream connected");
        tx.send(ChannelMessage::Connection(ConnectionState::Connected))
            .await
            .map_err(|e| StreamError::ConnectionError(e.to_string()))?;

        let mut decoder = SseDecoder::new();
        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| StreamError::ConnectionError(e.to_string()))?;
            for payload in decoder.feed(&chunk) {
                match decode_event(&payload) {
                    Ok(event) => {
                        debug!(?event, "push event received");
                        tx.send(ChannelMessage::Event(event))
                            .await
                            .map_err(|e| StreamError::ConnectionError(e.to_string()))?;
                    }
                    Err(e) => warn!(error = %e, "ignoring stream event"),
                }
            }
        }
        Ok(())
    }
}
