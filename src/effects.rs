//! I/O requested by the session controller and the driver that performs it.
//!
//! The controller never awaits anything. It queues [`Effect`]s, and an
//! [`EffectRunner`] starts them against a [`DocumentService`] without
//! waiting for one to finish before starting the next. Each finished effect
//! comes back as an [`EffectOutcome`] that [`apply_outcome`] feeds into the
//! controller, so the owner of the controller keeps handling input while
//! loads for several tabs are in flight.

use futures_util::future::{FutureExt, LocalBoxFuture};
use futures_util::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use crate::app::SessionController;
use crate::managers::navigation::BrowserHistory;
use crate::managers::session_manager::SessionStorage;
use crate::managers::tab_manager::TabRegistryTrait;
use crate::services::content_loader::{ContentLoader, RenderedDocument};
use crate::services::document_service::DocumentService;
use crate::types::document::{CompleteDocumentResponse, DocumentSummary};
use crate::types::errors::DocumentError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch and render the content of a document tab.
    LoadContent { id: String },
    /// Reload the dashboard's document list.
    RefreshDocumentList,
    /// Propagate a user rename to the service.
    RenameDocument { id: String, title: String },
    /// Mark a document complete on the service.
    CompleteDocument {
        id: String,
        commit_message: Option<String>,
    },
    /// Delete every document on the service.
    ClearAllDocuments,
}

/// What a finished effect produced.
#[derive(Debug)]
pub enum EffectOutcome {
    Loaded {
        id: String,
        result: Result<RenderedDocument, String>,
    },
    DocumentList(Result<Vec<DocumentSummary>, DocumentError>),
    Renamed {
        id: String,
        result: Result<(), DocumentError>,
    },
    Completed {
        id: String,
        result: Result<CompleteDocumentResponse, DocumentError>,
    },
    Cleared(Result<usize, DocumentError>),
}

/// Effects started but not yet finished.
pub struct EffectRunner<'a, D: DocumentService> {
    service: &'a D,
    in_flight: FuturesUnordered<LocalBoxFuture<'a, EffectOutcome>>,
}

impl<'a, D: DocumentService> EffectRunner<'a, D> {
    pub fn new(service: &'a D) -> Self {
        Self {
            service,
            in_flight: FuturesUnordered::new(),
        }
    }

    /// Starts every effect the controller has queued. Returns how many.
    pub fn dispatch<S, H>(&mut self, controller: &mut SessionController<S, H>) -> usize
    where
        S: SessionStorage,
        H: BrowserHistory,
    {
        if controller.pending_effects().is_empty() {
            return 0;
        }
        let effects = controller.take_effects();
        let started = effects.len();
        for effect in effects {
            let future = self.start(controller, effect);
            self.in_flight.push(future);
        }
        started
    }

    /// Number of effects still running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Waits for the next effect to finish, in completion order.
    /// Returns `None` at once when nothing is running.
    pub async fn next_outcome(&mut self) -> Option<EffectOutcome> {
        self.in_flight.next().await
    }

    fn start<S, H>(&self, controller: &SessionController<S, H>, effect: Effect) -> LocalBoxFuture<'a, EffectOutcome>
    where
        S: SessionStorage,
        H: BrowserHistory,
    {
        debug!(?effect, "starting effect");
        let service = self.service;
        match effect {
            Effect::LoadContent { id } => {
                let current_title = controller
                    .registry()
                    .get_tab(&id)
                    .map(|t| t.title.clone())
                    .unwrap_or_else(|| id.clone());
                async move {
                    let result = ContentLoader::new(service)
                        .load(&id, &current_title)
                        .await
                        .map_err(|e| e.to_string());
                    EffectOutcome::Loaded { id, result }
                }
                .boxed_local()
            }
            Effect::RefreshDocumentList => {
                let status = controller.status_filter();
                async move { EffectOutcome::DocumentList(service.list(status).await) }.boxed_local()
            }
            Effect::RenameDocument { id, title } => async move {
                let result = service.rename(&id, &title).await;
                EffectOutcome::Renamed { id, result }
            }
            .boxed_local(),
            Effect::CompleteDocument { id, commit_message } => async move {
                let result = service.complete(&id, commit_message.as_deref()).await;
                EffectOutcome::Completed { id, result }
            }
            .boxed_local(),
            Effect::ClearAllDocuments => {
                async move { EffectOutcome::Cleared(service.clear_all().await) }.boxed_local()
            }
        }
    }
}

/// Feeds a finished effect back into the controller. Follow-up effects it
/// queues are left for the next [`EffectRunner::dispatch`].
pub fn apply_outcome<S, H>(controller: &mut SessionController<S, H>, outcome: EffectOutcome)
where
    S: SessionStorage,
    H: BrowserHistory,
{
    match outcome {
        EffectOutcome::Loaded { id, result } => {
            controller.complete_load(&id, result);
        }
        EffectOutcome::DocumentList(Ok(documents)) => controller.set_document_list(documents),
        EffectOutcome::DocumentList(Err(e)) => warn!(error = %e, "document list refresh failed"),
        EffectOutcome::Renamed { id, result } => {
            if let Err(e) = result {
                warn!(doc_id = %id, error = %e, "rename not saved on the service");
            }
        }
        EffectOutcome::Completed { id, result } => match result {
            Ok(response) => {
                debug!(doc_id = %id, git = ?response.git, "completion confirmed");
                controller.on_document_completed(&id);
            }
            Err(e) => warn!(doc_id = %id, error = %e, "completing document failed"),
        },
        EffectOutcome::Cleared(Ok(count)) => {
            info!(count, "cleared all documents");
            controller.on_documents_cleared();
        }
        EffectOutcome::Cleared(Err(e)) => warn!(error = %e, "clearing documents failed"),
    }
}

/// Runs queued effects, and every effect they lead to, until none are left.
/// Returns the number of effects executed.
pub async fn run_effects<S, H, D>(controller: &mut SessionController<S, H>, service: &D) -> usize
where
    S: SessionStorage,
    H: BrowserHistory,
    D: DocumentService,
{
    let mut runner = EffectRunner::new(service);
    let mut executed = runner.dispatch(controller);
    while let Some(outcome) = runner.next_outcome().await {
        apply_outcome(controller, outcome);
        executed += runner.dispatch(controller);
    }
    executed
}
