use serde::{Deserialize, Serialize};

/// Events pushed by the document service's event stream.
///
/// The set is closed: frames carrying any other `type` tag are rejected by
/// the decoder instead of being guessed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    NewDocument { id: String, title: String },
}

impl PushEvent {
    /// Wire tags understood by this build.
    pub const KNOWN_TAGS: &'static [&'static str] = &["new_document"];
}

/// State of the live update subscription, shown by the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

/// Message delivered by the live update channel to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelMessage {
    Connection(ConnectionState),
    Event(PushEvent),
}
