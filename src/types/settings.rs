use serde::{Deserialize, Serialize};

/// Top-level viewer settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ViewerSettings {
    pub server: ServerSettings,
    pub session: SessionSettings,
    pub interaction: InteractionSettings,
    pub stream: StreamSettings,
    pub logging: LoggingSettings,
}

/// Where the document service lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

/// Session persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionSettings {
    /// Path of the SQLite session database. `None` uses the platform data dir.
    #[serde(default)]
    pub database_path: Option<String>,
}

/// User interaction tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionSettings {
    /// How long a destructive bulk action stays armed waiting for confirmation.
    pub confirm_timeout_ms: u64,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            confirm_timeout_ms: 3_000,
        }
    }
}

/// Live update stream settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamSettings {
    pub retry_delay_ms: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            retry_delay_ms: 3_000,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive string.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}
