//! Pure mapping from session state to what the host page shows.
//!
//! Every call computes the full view: one entry per tab in the strip with
//! its active flag, and one entry per pane with its visibility. Nothing is
//! patched incrementally, so a projection can always be rendered from
//! scratch.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::managers::tab_manager::{TabRegistry, TabRegistryTrait};
use crate::types::document::{DocumentStatus, DocumentSummary};
use crate::types::event::ConnectionState;
use crate::types::tab::{LoadStatus, PaneBody, TabId};

/// Label of the dashboard tab.
pub const DASHBOARD_TITLE: &str = "Dashboard";

/// Everything [`project`] reads.
pub struct ProjectionInput<'a> {
    pub registry: &'a TabRegistry,
    pub documents: &'a [DocumentSummary],
    pub status_filter: Option<DocumentStatus>,
    pub connection: ConnectionState,
    pub close_all_armed: bool,
    pub clear_all_armed: bool,
    pub location: String,
}

/// One entry of the tab strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabView {
    pub id: TabId,
    pub title: String,
    pub active: bool,
    /// `None` for the dashboard, which has nothing to load.
    pub load_status: Option<LoadStatus>,
}

/// One document content pane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaneView {
    pub id: String,
    pub header: String,
    pub visible: bool,
    pub body: PaneBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    /// Dashboard first, then document tabs in opening order.
    pub tabs: Vec<TabView>,
    pub panes: Vec<PaneView>,
    pub dashboard_visible: bool,
    /// `{tabId: isActive}` for every tab, dashboard included.
    pub tab_active: BTreeMap<String, bool>,
    /// `{paneId: isVisible}` for every pane, dashboard included.
    pub pane_visible: BTreeMap<String, bool>,
    pub documents: Vec<DocumentSummary>,
    /// `None` when the dashboard lists every document.
    pub status_filter: Option<DocumentStatus>,
    pub connection: ConnectionState,
    pub close_all_armed: bool,
    pub clear_all_armed: bool,
    pub location: String,
}

impl Projection {
    pub fn active_tab(&self) -> Option<&TabView> {
        self.tabs.iter().find(|t| t.active)
    }
}

pub fn project(input: &ProjectionInput<'_>) -> Projection {
    let active = input.registry.active();
    let dashboard_visible = active.is_dashboard();

    let mut tabs = Vec::with_capacity(input.registry.tab_count() + 1);
    tabs.push(TabView {
        id: TabId::Dashboard,
        title: DASHBOARD_TITLE.to_string(),
        active: dashboard_visible,
        load_status: None,
    });

    let mut panes = Vec::with_capacity(input.registry.tab_count());
    for tab in input.registry.get_all_tabs() {
        let is_active = active.document_id() == Some(tab.id.as_str());
        tabs.push(TabView {
            id: TabId::document(tab.id.clone()),
            title: tab.title.clone(),
            active: is_active,
            load_status: Some(tab.load_status.clone()),
        });
        let (header, body) = match input.registry.get_pane(&tab.id) {
            Some(pane) => (pane.header.clone(), pane.body.clone()),
            None => (tab.title.clone(), PaneBody::Placeholder),
        };
        panes.push(PaneView {
            id: tab.id.clone(),
            header,
            visible: is_active,
            body,
        });
    }

    let tab_active = tabs
        .iter()
        .map(|t| (t.id.to_string(), t.active))
        .collect();
    let pane_visible = std::iter::once((TabId::Dashboard.to_string(), dashboard_visible))
        .chain(panes.iter().map(|p| (p.id.clone(), p.visible)))
        .collect();

    Projection {
        tabs,
        panes,
        dashboard_visible,
        tab_active,
        pane_visible,
        documents: input.documents.to_vec(),
        status_filter: input.status_filter,
        connection: input.connection,
        close_all_armed: input.close_all_armed,
        clear_all_armed: input.clear_all_armed,
        location: input.location.clone(),
    }
}
