//! Navigation Bridge for docviewer.
//!
//! Keeps the browser address and history stack consistent with the active
//! tab. Deciding the new tab state and applying the history side effect are
//! separate steps; the controller tells the bridge whether a transition came
//! from a popstate so the browser's own move is never pushed again.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::types::tab::TabId;

/// Location of the dashboard.
pub const DASHBOARD_LOCATION: &str = "/";
/// Prefix of document locations.
pub const DOCUMENT_PREFIX: &str = "/doc/";

/// Bytes escaped when a document id becomes a path segment. Ids are opaque,
/// so anything that would end or split the segment must be encoded.
const ID_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Where a location points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Document(String),
    Unknown(String),
}

/// Derives the navigation location of a tab.
pub fn location_for(id: &TabId) -> String {
    match id {
        TabId::Dashboard => DASHBOARD_LOCATION.to_string(),
        TabId::Document(doc_id) => {
            format!("{}{}", DOCUMENT_PREFIX, utf8_percent_encode(doc_id, ID_SEGMENT))
        }
    }
}

/// Parses a location (path, optionally with query or fragment) into a route.
///
/// The id segment is percent-decoded, so `parse_location(&location_for(id))`
/// yields the original id for any id.
pub fn parse_location(location: &str) -> Route {
    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let trimmed = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };

    if trimmed.is_empty() || trimmed == DASHBOARD_LOCATION {
        return Route::Dashboard;
    }
    match trimmed.strip_prefix(DOCUMENT_PREFIX) {
        Some(segment) if !segment.is_empty() && !segment.contains('/') => {
            match percent_decode_str(segment).decode_utf8() {
                Ok(id) => Route::Document(id.into_owned()),
                Err(_) => Route::Unknown(location.to_string()),
            }
        }
        _ => Route::Unknown(location.to_string()),
    }
}

/// A history change requested by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "location", rename_all = "snake_case")]
pub enum HistoryCommand {
    Push(String),
    Replace(String),
}

/// The browser history surface the bridge drives.
pub trait BrowserHistory {
    fn current_location(&self) -> String;
    fn push_state(&mut self, location: &str);
    fn replace_state(&mut self, location: &str);
    /// Number of entries in the session history.
    fn length(&self) -> usize;
}

/// A self-contained back/forward stack.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    /// A fresh history whose only entry is `initial_location`.
    pub fn new(initial_location: &str) -> Self {
        Self {
            entries: vec![initial_location.to_string()],
            index: 0,
        }
    }

    /// Moves one entry back, returning the new location (the popstate target).
    pub fn back(&mut self) -> Option<String> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index].clone())
    }

    /// Moves one entry forward, returning the new location.
    pub fn forward(&mut self) -> Option<String> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index].clone())
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl BrowserHistory for MemoryHistory {
    fn current_location(&self) -> String {
        self.entries[self.index].clone()
    }

    fn push_state(&mut self, location: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(location.to_string());
        self.index += 1;
    }

    fn replace_state(&mut self, location: &str) {
        self.entries[self.index] = location.to_string();
    }

    fn length(&self) -> usize {
        self.entries.len()
    }
}

/// Mirror of a host page's history.
///
/// Tracks the location the host last reported and queues the commands the
/// host must apply to its real history object.
#[derive(Debug, Clone)]
pub struct HostHistory {
    location: String,
    length: usize,
    pending: Vec<HistoryCommand>,
}

impl HostHistory {
    pub fn new(initial_location: &str) -> Self {
        Self {
            location: initial_location.to_string(),
            length: 1,
            pending: Vec::new(),
        }
    }

    /// Records where the host's history moved to on its own (back/forward).
    pub fn sync(&mut self, location: &str) {
        self.location = location.to_string();
    }

    /// Drains commands queued since the last call.
    pub fn take_commands(&mut self) -> Vec<HistoryCommand> {
        std::mem::take(&mut self.pending)
    }
}

impl BrowserHistory for HostHistory {
    fn current_location(&self) -> String {
        self.location.clone()
    }

    fn push_state(&mut self, location: &str) {
        self.location = location.to_string();
        self.length += 1;
        self.pending.push(HistoryCommand::Push(location.to_string()));
    }

    fn replace_state(&mut self, location: &str) {
        self.location = location.to_string();
        self.pending.push(HistoryCommand::Replace(location.to_string()));
    }

    fn length(&self) -> usize {
        self.length
    }
}

/// Applies tab activations to a [`BrowserHistory`].
pub struct NavigationBridge<H: BrowserHistory> {
    history: H,
    initializing: bool,
}

impl<H: BrowserHistory> NavigationBridge<H> {
    pub fn new(history: H) -> Self {
        Self {
            history,
            initializing: false,
        }
    }

    /// Suppresses history pushes until [`finish_initialization`](Self::finish_initialization).
    pub fn begin_initialization(&mut self) {
        self.initializing = true;
    }

    pub fn finish_initialization(&mut self) {
        self.initializing = false;
    }

    /// Brings the history in line with `active`.
    ///
    /// Popstate-originated transitions are left alone: the browser already
    /// moved. Otherwise a new entry is pushed when the location differs.
    /// During initialization the current entry is replaced instead, so the
    /// address stays consistent without growing the stack.
    pub fn reconcile(&mut self, active: &TabId, originated_from_popstate: bool) -> Option<HistoryCommand> {
        if originated_from_popstate {
            trace!(active = %active, "popstate transition, history untouched");
            return None;
        }
        let target = location_for(active);
        if target == self.history.current_location() {
            return None;
        }
        if self.initializing {
            debug!(location = %target, "replacing history entry during initialization");
            self.history.replace_state(&target);
            Some(HistoryCommand::Replace(target))
        } else {
            debug!(location = %target, "pushing history entry");
            self.history.push_state(&target);
            Some(HistoryCommand::Push(target))
        }
    }

    /// Replaces the current entry with `active`'s location if they differ.
    /// Used after the browser lands somewhere no tab corresponds to.
    pub fn normalize(&mut self, active: &TabId) -> Option<HistoryCommand> {
        let target = location_for(active);
        if target == self.history.current_location() {
            return None;
        }
        debug!(location = %target, "normalizing history entry");
        self.history.replace_state(&target);
        Some(HistoryCommand::Replace(target))
    }

    pub fn current_location(&self) -> String {
        self.history.current_location()
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }
}
