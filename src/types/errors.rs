use std::fmt;

// === TabError ===

/// Errors related to tab registry operations.
#[derive(Debug, PartialEq)]
pub enum TabError {
    /// Tab with the given ID was not found.
    NotFound(String),
    /// The dashboard tab cannot be the target of this operation.
    DashboardImmutable,
    /// A tab title must contain visible text.
    EmptyTitle,
}

impl fmt::Display for TabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabError::NotFound(id) => write!(f, "Tab not found: {}", id),
            TabError::DashboardImmutable => write!(f, "The dashboard tab cannot be modified"),
            TabError::EmptyTitle => write!(f, "Tab title cannot be empty"),
        }
    }
}

impl std::error::Error for TabError {}

// === SessionError ===

/// Errors related to session persistence.
#[derive(Debug)]
pub enum SessionError {
    /// Failed to serialize or deserialize session data.
    SerializationError(String),
    /// Database operation failed.
    DatabaseError(String),
    /// The storage backend is unavailable.
    StorageUnavailable(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::SerializationError(msg) => {
                write!(f, "Session serialization error: {}", msg)
            }
            SessionError::DatabaseError(msg) => {
                write!(f, "Session database error: {}", msg)
            }
            SessionError::StorageUnavailable(msg) => {
                write!(f, "Session storage unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for SessionError {}

// === DocumentError ===

/// Errors returned by the document service.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// Document with the given ID was not found.
    NotFound(String),
    /// A network error occurred while talking to the service.
    NetworkError(String),
    /// The service answered with something we could not interpret.
    InvalidResponse(String),
    /// The request was rejected as invalid.
    InvalidRequest(String),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::NotFound(id) => write!(f, "Document not found: {}", id),
            DocumentError::NetworkError(msg) => write!(f, "Document service network error: {}", msg),
            DocumentError::InvalidResponse(msg) => {
                write!(f, "Invalid document service response: {}", msg)
            }
            DocumentError::InvalidRequest(msg) => write!(f, "Invalid document request: {}", msg),
        }
    }
}

impl std::error::Error for DocumentError {}

// === StreamError ===

/// Errors related to the live update stream.
#[derive(Debug, PartialEq)]
pub enum StreamError {
    /// Connecting to or reading from the stream failed.
    ConnectionError(String),
    /// The event carried a `type` tag this build does not understand.
    UnknownEvent(String),
    /// The event payload could not be parsed.
    MalformedEvent(String),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::ConnectionError(msg) => write!(f, "Stream connection error: {}", msg),
            StreamError::UnknownEvent(tag) => write!(f, "Unknown stream event type: {}", tag),
            StreamError::MalformedEvent(msg) => write!(f, "Malformed stream event: {}", msg),
        }
    }
}

impl std::error::Error for StreamError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
