use serde::{Deserialize, Serialize};

use super::tab::TabId;

/// Minimal persisted record needed to restore open tabs after a reload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub tabs: Vec<SessionTab>,
    pub active_tab_id: TabId,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            tabs: Vec::new(),
            active_tab_id: TabId::Dashboard,
        }
    }
}

/// A tab's identity and title as stored in a session. Content is never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionTab {
    pub id: String,
    pub title: String,
}
