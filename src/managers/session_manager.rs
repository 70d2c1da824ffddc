//! Session Store for docviewer.
//!
//! Persists and restores the ordered list of open tabs and the active tab id.
//! The snapshot lives under two opaque keys written together on every save:
//! one holding the JSON tab list, one holding the active tab id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, OptionalExtension};
use tracing::{debug, warn};

use crate::database::connection::Database;
use crate::types::errors::SessionError;
use crate::types::session::{SessionSnapshot, SessionTab};
use crate::types::tab::TabId;

/// Key holding the ordered `[{id, title}]` list.
pub const OPEN_TABS_KEY: &str = "docviewer.open_tabs";
/// Key holding the active tab id.
pub const ACTIVE_TAB_KEY: &str = "docviewer.active_tab";

/// Opaque string key/value storage, shaped like browser local storage.
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Write several keys as one unit. Backends with transactions override this.
    fn set_items(&self, items: &[(&str, &str)]) -> Result<(), SessionError> {
        for (key, value) in items {
            self.set_item(key, value)?;
        }
        Ok(())
    }
}

/// Process-local storage. Clones share the same map, so a "reload" can be
/// simulated by building a second controller over a clone.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, SessionError> {
        self.items
            .lock()
            .map_err(|e| SessionError::StorageUnavailable(e.to_string()))
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage backed by the `session_state` table.
pub struct SqliteStorage {
    db: Arc<Database>,
}

impl SqliteStorage {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

impl SessionStorage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        self.db
            .connection()
            .query_row(
                "SELECT value FROM session_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| SessionError::DatabaseError(e.to_string()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.set_items(&[(key, value)])
    }

    fn set_items(&self, items: &[(&str, &str)]) -> Result<(), SessionError> {
        let tx = self
            .db
            .connection()
            .unchecked_transaction()
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?;
        let now = Self::now();
        for (key, value) in items {
            tx.execute(
                "INSERT INTO session_state (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?;
        }
        tx.commit()
            .map_err(|e| SessionError::DatabaseError(e.to_string()))
    }
}

/// Trait defining session snapshot operations.
pub trait SessionManagerTrait {
    fn save_session(&self, snapshot: &SessionSnapshot) -> Result<(), SessionError>;
    fn restore_session(&self) -> Result<Option<SessionSnapshot>, SessionError>;
}

/// Reads and writes [`SessionSnapshot`]s through a [`SessionStorage`] backend.
pub struct SessionManager<S: SessionStorage> {
    storage: S,
}

impl<S: SessionStorage> SessionManager<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

impl<S: SessionStorage> SessionManagerTrait for SessionManager<S> {
    /// Serializes the tab list and writes both keys as one unit.
    fn save_session(&self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        let tabs = serde_json::to_string(&snapshot.tabs)
            .map_err(|e| SessionError::SerializationError(e.to_string()))?;
        self.storage.set_items(&[
            (OPEN_TABS_KEY, tabs.as_str()),
            (ACTIVE_TAB_KEY, snapshot.active_tab_id.as_str()),
        ])?;
        debug!(tabs = snapshot.tabs.len(), active = %snapshot.active_tab_id, "session saved");
        Ok(())
    }

    /// Restores the last snapshot, or `None` if nothing was ever saved.
    ///
    /// Duplicate ids and dashboard entries in the stored list are dropped
    /// (first occurrence wins) so a damaged snapshot never yields duplicate tabs.
    fn restore_session(&self) -> Result<Option<SessionSnapshot>, SessionError> {
        let raw_tabs = self.storage.get_item(OPEN_TABS_KEY)?;
        let raw_active = self.storage.get_item(ACTIVE_TAB_KEY)?;
        if raw_tabs.is_none() && raw_active.is_none() {
            return Ok(None);
        }

        let stored: Vec<SessionTab> = match raw_tabs {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| SessionError::SerializationError(e.to_string()))?,
            None => Vec::new(),
        };

        let mut tabs: Vec<SessionTab> = Vec::with_capacity(stored.len());
        for tab in stored {
            if TabId::from(tab.id.as_str()).is_dashboard() {
                continue;
            }
            if tabs.iter().any(|t| t.id == tab.id) {
                warn!(tab_id = %tab.id, "dropping duplicate tab from stored session");
                continue;
            }
            tabs.push(tab);
        }

        let active_tab_id = raw_active.map(TabId::from).unwrap_or(TabId::Dashboard);
        Ok(Some(SessionSnapshot {
            tabs,
            active_tab_id,
        }))
    }
}
