//! Session controller for docviewer.
//!
//! The one constructed owner of client state: the tab registry, the
//! navigation bridge and the session store. Every operation follows the same
//! order: mutate the registry, reconcile the URL, persist the snapshot, and
//! queue any content load. I/O is never performed here; it is queued as
//! [`Effect`]s for [`crate::effects::EffectRunner`].

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::effects::Effect;
use crate::managers::confirm_gate::{ConfirmGate, ConfirmOutcome};
use crate::managers::navigation::{parse_location, BrowserHistory, NavigationBridge, Route};
use crate::managers::session_manager::{SessionManager, SessionManagerTrait, SessionStorage};
use crate::managers::tab_manager::{TabRegistry, TabRegistryTrait};
use crate::services::content_loader::RenderedDocument;
use crate::types::document::{DocumentStatus, DocumentSummary};
use crate::types::errors::TabError;
use crate::types::event::{ChannelMessage, ConnectionState, PushEvent};
use crate::types::session::{SessionSnapshot, SessionTab};
use crate::types::tab::TabId;
use crate::ui::projection::{project, Projection, ProjectionInput};

pub struct SessionController<S: SessionStorage, H: BrowserHistory> {
    registry: TabRegistry,
    navigation: NavigationBridge<H>,
    session: SessionManager<S>,
    close_all_gate: ConfirmGate,
    clear_all_gate: ConfirmGate,
    connection: ConnectionState,
    documents: Vec<DocumentSummary>,
    status_filter: Option<DocumentStatus>,
    effects: Vec<Effect>,
}

impl<S: SessionStorage, H: BrowserHistory> SessionController<S, H> {
    pub fn new(storage: S, history: H, confirm_timeout: Duration) -> Self {
        Self {
            registry: TabRegistry::new(),
            navigation: NavigationBridge::new(history),
            session: SessionManager::new(storage),
            close_all_gate: ConfirmGate::new(confirm_timeout),
            clear_all_gate: ConfirmGate::new(confirm_timeout),
            connection: ConnectionState::default(),
            documents: Vec::new(),
            status_filter: None,
            effects: Vec::new(),
        }
    }

    /// Startup: restore the saved tabs, then activate the deep link if one is
    /// given, or else the saved active tab.
    ///
    /// History pushes are suppressed until both steps are done; the current
    /// entry is replaced instead when the address has to change. The
    /// dashboard list is always reloaded afterwards.
    pub fn start(&mut self, deep_link: Option<&str>) {
        self.navigation.begin_initialization();

        let snapshot = match self.session.restore_session() {
            Ok(snapshot) => snapshot.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "could not restore session, starting empty");
                SessionSnapshot::default()
            }
        };
        info!(tabs = snapshot.tabs.len(), active = %snapshot.active_tab_id, "restoring session");

        for tab in &snapshot.tabs {
            if self.registry.insert_tab(&tab.id, &tab.title) {
                self.request_load(&tab.id);
            }
        }

        // A deep link wins over the saved active tab.
        match deep_link.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => {
                info!(doc_id = %id, "opening deep link");
                self.open_and_activate(id, id);
            }
            None => self.activate(snapshot.active_tab_id),
        }

        self.navigation.finish_initialization();
        self.effects.push(Effect::RefreshDocumentList);
        self.persist();
    }

    /// Opens `id` and shows it. A known id is only activated, never reloaded.
    pub fn open_and_activate(&mut self, id: &str, title: &str) {
        let tab_id = TabId::from(id);
        if tab_id.is_dashboard() || self.registry.contains(id) {
            self.activate(tab_id);
            return;
        }
        self.create_tab(id, title);
        self.activate(tab_id);
    }

    /// Opens `id` without changing the active tab.
    ///
    /// For an id that is already open this only reloads its content, which
    /// makes repeated delivery of the same push event harmless.
    pub fn open_in_background(&mut self, id: &str, title: &str) {
        if TabId::from(id).is_dashboard() {
            return;
        }
        if self.registry.contains(id) {
            debug!(doc_id = %id, "already open, reloading in place");
            let title = title.trim();
            let stale = self
                .registry
                .get_tab(id)
                .is_some_and(|tab| !title.is_empty() && tab.title != title);
            if stale && self.registry.rename_tab(id, title).is_ok() {
                self.persist();
            }
            self.request_load(id);
            return;
        }
        self.create_tab(id, title);
    }

    /// Closes a tab. Closing the active tab falls back to the dashboard.
    /// Unknown ids are ignored.
    pub fn close(&mut self, id: &str) {
        if self.registry.remove_tab(id).is_none() {
            debug!(doc_id = %id, "close ignored, tab not open");
            return;
        }
        self.effects
            .retain(|e| !matches!(e, Effect::LoadContent { id: pending } if pending == id));

        if self.registry.active().document_id() == Some(id) {
            self.activate(TabId::Dashboard);
        } else {
            self.persist();
        }
    }

    /// Closes every document tab, ending on the dashboard.
    pub fn close_all(&mut self) {
        for id in self.registry.tab_ids() {
            self.close(&id);
        }
        if !self.registry.active().is_dashboard() {
            self.activate(TabId::Dashboard);
        }
    }

    /// User gesture for [`close_all`](Self::close_all): the first press arms,
    /// a second press within the timeout closes everything.
    pub fn request_close_all(&mut self, now: Instant) -> ConfirmOutcome {
        let outcome = self.close_all_gate.press(now);
        match outcome {
            ConfirmOutcome::Armed => debug!("close-all armed"),
            ConfirmOutcome::Confirmed => {
                info!(tabs = self.registry.tab_count(), "closing all tabs");
                self.close_all();
            }
        }
        outcome
    }

    /// User gesture for deleting every document on the service, guarded the
    /// same way as close-all.
    pub fn request_clear_all(&mut self, now: Instant) -> ConfirmOutcome {
        let outcome = self.clear_all_gate.press(now);
        match outcome {
            ConfirmOutcome::Armed => debug!("clear-all armed"),
            ConfirmOutcome::Confirmed => self.effects.push(Effect::ClearAllDocuments),
        }
        outcome
    }

    /// Disarms gates whose window has passed. Returns `true` if any did.
    pub fn poll_timers(&mut self, now: Instant) -> bool {
        let close_all = self.close_all_gate.poll(now);
        let clear_all = self.clear_all_gate.poll(now);
        close_all || clear_all
    }

    /// Activates a tab and records the move in history.
    pub fn activate(&mut self, id: TabId) {
        self.activate_with_origin(id, false);
    }

    /// Activates a tab in response to the browser's own back/forward move.
    pub fn activate_without_history(&mut self, id: TabId) {
        self.activate_with_origin(id, true);
    }

    fn activate_with_origin(&mut self, id: TabId, originated_from_popstate: bool) {
        if let TabId::Document(doc_id) = &id {
            if !self.registry.contains(doc_id) {
                debug!(doc_id = %doc_id, "activating unknown tab, creating it");
                self.create_tab(doc_id, doc_id);
            }
        }
        self.registry.set_active(id);
        self.navigation
            .reconcile(self.registry.active(), originated_from_popstate);
        self.persist();
    }

    /// Changes a tab's title in the strip and in its pane, without reloading.
    pub fn rename(&mut self, id: &str, title: &str) -> Result<(), TabError> {
        if TabId::from(id).is_dashboard() {
            return Err(TabError::DashboardImmutable);
        }
        let title = title.trim();
        if title.is_empty() {
            return Err(TabError::EmptyTitle);
        }
        self.registry.rename_tab(id, title)?;
        self.persist();
        self.effects.push(Effect::RenameDocument {
            id: id.to_string(),
            title: title.to_string(),
        });
        Ok(())
    }

    /// Marks a document complete on the service. The dashboard list is
    /// reloaded once the service confirms.
    pub fn complete_document(&mut self, id: &str, commit_message: Option<&str>) -> Result<(), TabError> {
        let id = id.trim();
        if TabId::from(id).is_dashboard() {
            return Err(TabError::DashboardImmutable);
        }
        if id.is_empty() {
            return Err(TabError::NotFound(String::new()));
        }
        self.effects.push(Effect::CompleteDocument {
            id: id.to_string(),
            commit_message: commit_message
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
        });
        Ok(())
    }

    /// The service confirmed a completion.
    pub fn on_document_completed(&mut self, id: &str) {
        info!(doc_id = %id, "document completed");
        self.effects.push(Effect::RefreshDocumentList);
    }

    /// Restricts the dashboard list to one status, or shows everything.
    pub fn set_status_filter(&mut self, status: Option<DocumentStatus>) {
        if self.status_filter == status {
            return;
        }
        debug!(?status, "dashboard filter changed");
        self.status_filter = status;
        self.effects.push(Effect::RefreshDocumentList);
    }

    pub fn status_filter(&self) -> Option<DocumentStatus> {
        self.status_filter
    }

    /// Browser back/forward landed on `location`.
    pub fn on_popstate(&mut self, location: &str) {
        match parse_location(location) {
            Route::Dashboard => self.activate_without_history(TabId::Dashboard),
            Route::Document(id) => self.activate_without_history(TabId::Document(id)),
            Route::Unknown(location) => {
                warn!(%location, "unrecognised location, showing the dashboard");
                self.activate_without_history(TabId::Dashboard);
                self.navigation.normalize(self.registry.active());
            }
        }
    }

    pub fn on_push_event(&mut self, event: PushEvent) {
        match event {
            PushEvent::NewDocument { id, title } => {
                info!(doc_id = %id, %title, "new document pushed");
                self.effects.push(Effect::RefreshDocumentList);
                self.open_in_background(&id, &title);
            }
        }
    }

    /// Updates the status indicator. Tab state is never affected.
    pub fn on_connection_change(&mut self, state: ConnectionState) {
        if self.connection != state {
            info!(?state, "live update connection changed");
        }
        self.connection = state;
    }

    pub fn on_channel_message(&mut self, message: ChannelMessage) {
        match message {
            ChannelMessage::Connection(state) => self.on_connection_change(state),
            ChannelMessage::Event(event) => self.on_push_event(event),
        }
    }

    /// Records a finished content load. Results for closed tabs are dropped.
    pub fn complete_load(&mut self, id: &str, result: Result<RenderedDocument, String>) -> bool {
        if let Err(reason) = &result {
            warn!(doc_id = %id, %reason, "content load failed");
        }
        let accepted = self
            .registry
            .finish_load(id, result.map(|doc| (doc.title, doc.html)));
        if accepted {
            self.persist();
        } else {
            debug!(doc_id = %id, "discarding load result for closed tab");
        }
        accepted
    }

    pub fn set_document_list(&mut self, documents: Vec<DocumentSummary>) {
        self.documents = documents;
    }

    /// Every document is gone from the service: close their tabs and
    /// reload the list.
    pub fn on_documents_cleared(&mut self) {
        self.close_all();
        self.effects.push(Effect::RefreshDocumentList);
    }

    /// Drains queued effects.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn pending_effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn projection(&self, now: Instant) -> Projection {
        project(&ProjectionInput {
            registry: &self.registry,
            documents: &self.documents,
            status_filter: self.status_filter,
            connection: self.connection,
            close_all_armed: self.close_all_gate.is_armed(now),
            clear_all_armed: self.clear_all_gate.is_armed(now),
            location: self.navigation.current_location(),
        })
    }

    pub fn registry(&self) -> &TabRegistry {
        &self.registry
    }

    pub fn active_tab(&self) -> &TabId {
        self.registry.active()
    }

    /// The current browser location.
    pub fn location(&self) -> String {
        self.navigation.current_location()
    }

    pub fn history(&self) -> &H {
        self.navigation.history()
    }

    pub fn history_mut(&mut self) -> &mut H {
        self.navigation.history_mut()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    /// Creates an `Unloaded` tab, persists, and queues its first load.
    fn create_tab(&mut self, id: &str, title: &str) {
        let title = if title.trim().is_empty() { id } else { title };
        if self.registry.insert_tab(id, title) {
            debug!(doc_id = %id, "tab created");
            self.persist();
            self.request_load(id);
        }
    }

    fn request_load(&mut self, id: &str) {
        if self.registry.begin_load(id) {
            self.effects.push(Effect::LoadContent { id: id.to_string() });
        } else {
            debug!(doc_id = %id, "load already in flight");
        }
    }

    fn persist(&self) {
        let snapshot = SessionSnapshot {
            tabs: self
                .registry
                .get_all_tabs()
                .iter()
                .map(|t| SessionTab {
                    id: t.id.clone(),
                    title: t.title.clone(),
                })
                .collect(),
            active_tab_id: self.registry.active().clone(),
        };
        if let Err(e) = self.session.save_session(&snapshot) {
            warn!(error = %e, "session not saved");
        }
    }
}
