//! Runs controller effects against the in-memory document service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use docviewer::app::SessionController;
use docviewer::effects::{apply_outcome, run_effects, Effect, EffectOutcome, EffectRunner};
use docviewer::managers::navigation::MemoryHistory;
use docviewer::managers::session_manager::MemoryStorage;
use docviewer::managers::tab_manager::TabRegistryTrait;
use docviewer::services::document_service::{DocumentService, MemoryDocumentService};
use docviewer::types::document::{
    CompleteDocumentResponse, CreateDocumentRequest, Document, DocumentStatus, DocumentSummary,
};
use docviewer::types::errors::DocumentError;
use docviewer::types::tab::{LoadStatus, PaneBody, TabId};

type Controller = SessionController<MemoryStorage, MemoryHistory>;

fn controller() -> Controller {
    SessionController::new(
        MemoryStorage::new(),
        MemoryHistory::new("/"),
        Duration::from_secs(3),
    )
}

async fn create(service: &MemoryDocumentService, title: &str, content: &str) -> String {
    service
        .create(&CreateDocumentRequest {
            title: title.to_string(),
            content: content.to_string(),
            metadata: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_start_refreshes_document_list() {
    let service = MemoryDocumentService::new();
    create(&service, "One", "1").await;
    create(&service, "Two", "2").await;
    let mut c = controller();

    c.start(None);
    let executed = run_effects(&mut c, &service).await;

    assert_eq!(executed, 1);
    assert_eq!(c.documents().len(), 2);
    assert!(c.pending_effects().is_empty());
}

#[tokio::test]
async fn test_open_loads_and_renders_content() {
    let service = MemoryDocumentService::new();
    let id = create(&service, "Plan", "# Plan\n\n- step").await;
    let mut c = controller();
    c.start(None);

    c.open_and_activate(&id, &id);
    run_effects(&mut c, &service).await;

    let tab = c.registry().get_tab(&id).unwrap();
    assert_eq!(tab.load_status, LoadStatus::Loaded);
    assert_eq!(tab.title, "Plan");
    match &c.registry().get_pane(&id).unwrap().body {
        PaneBody::Rendered(html) => assert!(html.contains("<li>step</li>")),
        other => panic!("expected rendered pane, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_document_fails_inline() {
    let service = MemoryDocumentService::new();
    let mut c = controller();
    c.start(Some("deadbeef"));
    run_effects(&mut c, &service).await;

    assert_eq!(c.active_tab(), &TabId::document("deadbeef"));
    let tab = c.registry().get_tab("deadbeef").unwrap();
    assert_eq!(
        tab.load_status,
        LoadStatus::Failed("Document not found: deadbeef".to_string())
    );
}

#[tokio::test]
async fn test_pushed_document_opens_in_background() {
    let service = MemoryDocumentService::new();
    let mut events = service.subscribe();
    let first = create(&service, "First", "# First").await;
    let mut c = controller();
    c.start(None);
    c.open_and_activate(&first, "First");
    run_effects(&mut c, &service).await;

    let second = create(&service, "Second", "# Second").await;
    for _ in 0..2 {
        c.on_push_event(events.recv().await.unwrap());
    }
    run_effects(&mut c, &service).await;

    assert_eq!(c.active_tab(), &TabId::document(first.as_str()));
    assert_eq!(c.registry().tab_count(), 2);
    assert_eq!(
        c.registry().get_tab(&second).unwrap().load_status,
        LoadStatus::Loaded
    );
    assert_eq!(c.documents().len(), 2);
}

#[tokio::test]
async fn test_rename_reaches_service() {
    let service = MemoryDocumentService::new();
    let id = create(&service, "Old", "body").await;
    let mut c = controller();
    c.start(None);
    c.open_and_activate(&id, "Old");
    run_effects(&mut c, &service).await;

    c.rename(&id, "New").unwrap();
    assert_eq!(
        c.pending_effects(),
        &[Effect::RenameDocument {
            id: id.clone(),
            title: "New".to_string()
        }]
    );
    run_effects(&mut c, &service).await;

    assert_eq!(service.get(&id).await.unwrap().title, "New");
}

#[tokio::test]
async fn test_confirmed_clear_all_empties_service_and_tabs() {
    let service = MemoryDocumentService::new();
    let a = create(&service, "A", "a").await;
    let b = create(&service, "B", "b").await;
    let mut c = controller();
    c.start(None);
    c.open_and_activate(&a, "A");
    c.open_in_background(&b, "B");
    run_effects(&mut c, &service).await;

    let t0 = Instant::now();
    c.request_clear_all(t0);
    c.request_clear_all(t0 + Duration::from_millis(200));
    run_effects(&mut c, &service).await;

    assert!(service.list(None).await.unwrap().is_empty());
    assert_eq!(c.registry().tab_count(), 0);
    assert!(c.active_tab().is_dashboard());
    assert!(c.documents().is_empty());
}

#[tokio::test]
async fn test_closing_tab_before_effects_run_skips_fetch() {
    let service = MemoryDocumentService::new();
    let id = create(&service, "A", "a").await;
    let mut c = controller();
    c.start(None);
    c.take_effects();

    c.open_in_background(&id, "A");
    c.close(&id);

    assert_eq!(run_effects(&mut c, &service).await, 0);
    assert!(!c.registry().contains(&id));
}

#[tokio::test]
async fn test_completing_document_refreshes_filtered_list() {
    let service = MemoryDocumentService::new();
    let a = create(&service, "A", "a").await;
    create(&service, "B", "b").await;
    let mut c = controller();
    c.start(None);
    c.set_status_filter(Some(DocumentStatus::Complete));
    run_effects(&mut c, &service).await;
    assert!(c.documents().is_empty());

    c.complete_document(&a, Some("done")).unwrap();
    run_effects(&mut c, &service).await;

    assert_eq!(service.get(&a).await.unwrap().status, DocumentStatus::Complete);
    let listed: Vec<&str> = c.documents().iter().map(|d| d.id.as_str()).collect();
    assert_eq!(listed, vec![a.as_str()]);
}

#[tokio::test]
async fn test_failed_completion_leaves_list_alone() {
    let service = MemoryDocumentService::new();
    let mut c = controller();
    c.start(None);
    run_effects(&mut c, &service).await;

    c.complete_document("missing", None).unwrap();
    assert_eq!(run_effects(&mut c, &service).await, 1);
    assert!(c.take_effects().is_empty());
}

// ─── concurrent execution ───

/// Holds every `get` until permits are released, counting how many started.
struct GatedService {
    inner: MemoryDocumentService,
    gate: Semaphore,
    started: AtomicUsize,
}

impl GatedService {
    fn new() -> Self {
        Self {
            inner: MemoryDocumentService::new(),
            gate: Semaphore::new(0),
            started: AtomicUsize::new(0),
        }
    }

    fn release(&self, permits: usize) {
        self.gate.add_permits(permits);
    }
}

impl DocumentService for GatedService {
    async fn create(&self, request: &CreateDocumentRequest) -> Result<Document, DocumentError> {
        self.inner.create(request).await
    }
    async fn list(&self, status: Option<DocumentStatus>) -> Result<Vec<DocumentSummary>, DocumentError> {
        self.inner.list(status).await
    }
    async fn get(&self, id: &str) -> Result<Document, DocumentError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.gate.acquire().await.unwrap().forget();
        self.inner.get(id).await
    }
    async fn update(&self, id: &str, title: &str, content: &str) -> Result<Document, DocumentError> {
        self.inner.update(id, title, content).await
    }
    async fn rename(&self, id: &str, title: &str) -> Result<(), DocumentError> {
        self.inner.rename(id, title).await
    }
    async fn complete(
        &self,
        id: &str,
        commit_message: Option<&str>,
    ) -> Result<CompleteDocumentResponse, DocumentError> {
        self.inner.complete(id, commit_message).await
    }
    async fn delete(&self, id: &str) -> Result<(), DocumentError> {
        self.inner.delete(id).await
    }
    async fn clear_all(&self) -> Result<usize, DocumentError> {
        self.inner.clear_all().await
    }
}

#[tokio::test]
async fn test_loads_run_concurrently_and_closed_tab_result_is_dropped() {
    let service = GatedService::new();
    let a = create(&service.inner, "A", "# A").await;
    let b = create(&service.inner, "B", "# B").await;
    let mut c = controller();
    c.start(None);
    c.take_effects();
    c.open_in_background(&a, "A");
    c.open_in_background(&b, "B");

    let mut runner = EffectRunner::new(&service);
    assert_eq!(runner.dispatch(&mut c), 2);

    // Neither load can finish yet, but both have started.
    let waited = tokio::time::timeout(Duration::from_millis(50), runner.next_outcome()).await;
    assert!(waited.is_err());
    assert_eq!(service.started.load(Ordering::SeqCst), 2);
    assert_eq!(runner.in_flight(), 2);

    // The controller stays usable while loads are in flight.
    c.close(&a);
    service.release(2);

    let mut accepted = Vec::new();
    while let Some(outcome) = runner.next_outcome().await {
        if let EffectOutcome::Loaded { id, result } = outcome {
            accepted.push((id.clone(), c.complete_load(&id, result)));
        } else {
            apply_outcome(&mut c, outcome);
        }
    }
    accepted.sort();
    let mut expected = vec![(a.clone(), false), (b.clone(), true)];
    expected.sort();

    assert_eq!(accepted, expected);
    assert!(!c.registry().contains(&a));
    assert_eq!(c.registry().get_tab(&b).unwrap().load_status, LoadStatus::Loaded);
    assert!(runner.is_idle());
}
