//! Tab Registry for docviewer.
//!
//! Owns the canonical in-memory set of open document tabs, their panes and
//! their load status, plus the active tab id. Holds no I/O: persistence,
//! navigation and content loading are sequenced by the session controller.

use crate::types::errors::TabError;
use crate::types::tab::{LoadStatus, Pane, PaneBody, Tab, TabId};

/// Trait defining the tab registry interface.
pub trait TabRegistryTrait {
    fn insert_tab(&mut self, id: &str, title: &str) -> bool;
    fn remove_tab(&mut self, id: &str) -> Option<Tab>;
    fn contains(&self, id: &str) -> bool;
    fn set_active(&mut self, id: TabId);
    fn active(&self) -> &TabId;
    fn rename_tab(&mut self, id: &str, title: &str) -> Result<(), TabError>;
    fn begin_load(&mut self, id: &str) -> bool;
    fn finish_load(&mut self, id: &str, result: Result<(String, String), String>) -> bool;
    fn get_tab(&self, id: &str) -> Option<&Tab>;
    fn get_pane(&self, id: &str) -> Option<&Pane>;
    fn get_all_tabs(&self) -> &[Tab];
    fn tab_ids(&self) -> Vec<String>;
    fn tab_count(&self) -> usize;
}

/// In-memory tab registry.
pub struct TabRegistry {
    tabs: Vec<Tab>,
    panes: Vec<Pane>,
    active: TabId,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self {
            tabs: Vec::new(),
            panes: Vec::new(),
            active: TabId::Dashboard,
        }
    }

    fn find_tab_index(&self, id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    fn find_pane_index(&self, id: &str) -> Option<usize> {
        self.panes.iter().position(|p| p.tab_id == id)
    }
}

impl Default for TabRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TabRegistryTrait for TabRegistry {
    /// Create an `Unloaded` tab with an empty pane.
    /// Returns `false` without touching anything if the id is already open.
    fn insert_tab(&mut self, id: &str, title: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.tabs.push(Tab {
            id: id.to_string(),
            title: title.to_string(),
            load_status: LoadStatus::Unloaded,
        });
        self.panes.push(Pane {
            tab_id: id.to_string(),
            header: title.to_string(),
            body: PaneBody::Placeholder,
        });
        true
    }

    /// Remove a tab and its pane. The active id is left for the caller to fix up.
    fn remove_tab(&mut self, id: &str) -> Option<Tab> {
        let idx = self.find_tab_index(id)?;
        if let Some(pane_idx) = self.find_pane_index(id) {
            self.panes.remove(pane_idx);
        }
        Some(self.tabs.remove(idx))
    }

    fn contains(&self, id: &str) -> bool {
        self.find_tab_index(id).is_some()
    }

    fn set_active(&mut self, id: TabId) {
        self.active = id;
    }

    fn active(&self) -> &TabId {
        &self.active
    }

    /// Update the title shown in the tab strip and in the pane header.
    /// Content and load status are untouched.
    fn rename_tab(&mut self, id: &str, title: &str) -> Result<(), TabError> {
        let tab = self
            .tabs
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TabError::NotFound(id.to_string()))?;
        tab.title = title.to_string();
        if let Some(pane) = self.panes.iter_mut().find(|p| p.tab_id == id) {
            pane.header = title.to_string();
        }
        Ok(())
    }

    /// Move a tab into `Loading`.
    ///
    /// Returns `false` when the tab is unknown or a load is already in flight;
    /// the caller must not start a fetch in that case.
    fn begin_load(&mut self, id: &str) -> bool {
        match self.tabs.iter_mut().find(|t| t.id == id) {
            Some(tab) if tab.load_status.is_loading() => false,
            Some(tab) => {
                tab.load_status = LoadStatus::Loading;
                true
            }
            None => false,
        }
    }

    /// Record the outcome of a load: `Ok((title, html))` or `Err(reason)`.
    ///
    /// Returns `false` if the tab was closed while the load was in flight.
    fn finish_load(&mut self, id: &str, result: Result<(String, String), String>) -> bool {
        let Some(tab_idx) = self.find_tab_index(id) else {
            return false;
        };
        let pane_idx = self.find_pane_index(id);
        match result {
            Ok((title, html)) => {
                self.tabs[tab_idx].title = title.clone();
                self.tabs[tab_idx].load_status = LoadStatus::Loaded;
                if let Some(p) = pane_idx {
                    self.panes[p].header = title;
                    self.panes[p].body = PaneBody::Rendered(html);
                }
            }
            Err(reason) => {
                self.tabs[tab_idx].load_status = LoadStatus::Failed(reason.clone());
                if let Some(p) = pane_idx {
                    self.panes[p].body = PaneBody::Error(reason);
                }
            }
        }
        true
    }

    fn get_tab(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    fn get_pane(&self, id: &str) -> Option<&Pane> {
        self.panes.iter().find(|p| p.tab_id == id)
    }

    fn get_all_tabs(&self) -> &[Tab] {
        &self.tabs
    }

    fn tab_ids(&self) -> Vec<String> {
        self.tabs.iter().map(|t| t.id.clone()).collect()
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }
}
