use std::fmt;

use serde::{Deserialize, Serialize};

/// String form of the dashboard sentinel, as persisted and exchanged with the host.
pub const DASHBOARD_TAB_ID: &str = "dashboard";

/// Identity of a tab: the dashboard sentinel or a document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TabId {
    Dashboard,
    Document(String),
}

impl TabId {
    pub fn document(id: impl Into<String>) -> Self {
        TabId::Document(id.into())
    }

    pub fn is_dashboard(&self) -> bool {
        matches!(self, TabId::Dashboard)
    }

    /// The document identifier, or `None` for the dashboard.
    pub fn document_id(&self) -> Option<&str> {
        match self {
            TabId::Dashboard => None,
            TabId::Document(id) => Some(id),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TabId::Dashboard => DASHBOARD_TAB_ID,
            TabId::Document(id) => id,
        }
    }
}

impl From<String> for TabId {
    fn from(value: String) -> Self {
        if value == DASHBOARD_TAB_ID || value.is_empty() {
            TabId::Dashboard
        } else {
            TabId::Document(value)
        }
    }
}

impl From<&str> for TabId {
    fn from(value: &str) -> Self {
        TabId::from(value.to_string())
    }
}

impl From<TabId> for String {
    fn from(value: TabId) -> Self {
        match value {
            TabId::Dashboard => DASHBOARD_TAB_ID.to_string(),
            TabId::Document(id) => id,
        }
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content-load status of a document tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum LoadStatus {
    Unloaded,
    Loading,
    Loaded,
    Failed(String),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }
}

/// An open document tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub id: String,
    pub title: String,
    pub load_status: LoadStatus,
}

/// What a tab's content pane currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PaneBody {
    /// Nothing rendered yet.
    Placeholder,
    /// Sanitized HTML produced by the content loader.
    Rendered(String),
    /// Inline error message for a failed load.
    Error(String),
}

/// The content pane belonging to a document tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pane {
    pub tab_id: String,
    pub header: String,
    pub body: PaneBody,
}
