//! Document service collaborator.
//!
//! The viewer consumes documents through [`DocumentService`]. Two backends:
//! [`HttpDocumentService`] talks to the document server's JSON API, and
//! [`MemoryDocumentService`] keeps documents in process and broadcasts a
//! [`PushEvent`] for every new document to its subscribers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use serde_json::json;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::types::document::{
    CompleteDocumentRequest, CompleteDocumentResponse, CreateDocumentRequest, Document,
    DocumentListResponse, DocumentStatus, DocumentSummary,
};
use crate::types::errors::DocumentError;
use crate::types::event::PushEvent;

/// Operations the viewer needs from the document store.
#[allow(async_fn_in_trait)]
pub trait DocumentService {
    /// Creates a document, or updates the one whose `metadata.path` matches.
    async fn create(&self, request: &CreateDocumentRequest) -> Result<Document, DocumentError>;
    /// Newest first, optionally only documents with the given status.
    async fn list(&self, status: Option<DocumentStatus>) -> Result<Vec<DocumentSummary>, DocumentError>;
    async fn get(&self, id: &str) -> Result<Document, DocumentError>;
    async fn update(&self, id: &str, title: &str, content: &str) -> Result<Document, DocumentError>;
    async fn rename(&self, id: &str, title: &str) -> Result<(), DocumentError>;
    /// Marks a document complete; the server also commits it to its repository.
    async fn complete(
        &self,
        id: &str,
        commit_message: Option<&str>,
    ) -> Result<CompleteDocumentResponse, DocumentError>;
    async fn delete(&self, id: &str) -> Result<(), DocumentError>;
    /// Deletes every document, returning how many were removed.
    async fn clear_all(&self) -> Result<usize, DocumentError>;
}

// === HTTP backend ===

/// Client for the document server's `/api/documents` endpoints.
#[derive(Clone)]
pub struct HttpDocumentService {
    client: Client,
    base_url: Url,
}

impl HttpDocumentService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DocumentError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DocumentError::InvalidRequest(format!("bad base url {}: {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocumentError::NetworkError(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    /// Builds `{base}/api/documents[/segment...]` with each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, DocumentError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| DocumentError::InvalidRequest("base url cannot be a base".to_string()))?;
            path.pop_if_empty().extend(["api", "documents"]);
            path.extend(segments);
        }
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn network(e: reqwest::Error) -> DocumentError {
        DocumentError::NetworkError(e.to_string())
    }

    fn invalid(e: reqwest::Error) -> DocumentError {
        DocumentError::InvalidResponse(e.to_string())
    }

    /// Maps 404 to `NotFound` and other error statuses to `NetworkError`.
    fn check(resp: reqwest::Response, id: &str) -> Result<reqwest::Response, DocumentError> {
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(DocumentError::NotFound(id.to_string()));
        }
        resp.error_for_status().map_err(Self::network)
    }
}

impl DocumentService for HttpDocumentService {
    async fn create(&self, request: &CreateDocumentRequest) -> Result<Document, DocumentError> {
        let resp = self
            .client
            .post(self.endpoint(&[])?)
            .json(request)
            .send()
            .await
            .map_err(Self::network)?;
        let created: serde_json::Value = Self::check(resp, "")?.json().await.map_err(Self::invalid)?;
        let id = created
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| DocumentError::InvalidResponse("create response without id".to_string()))?;
        self.get(id).await
    }

    async fn list(&self, status: Option<DocumentStatus>) -> Result<Vec<DocumentSummary>, DocumentError> {
        let mut url = self.endpoint(&[])?;
        if let Some(status) = status {
            url.query_pairs_mut().append_pair("status", status.as_str());
        }
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(Self::network)?;
        let body: DocumentListResponse = Self::check(resp, "")?.json().await.map_err(Self::invalid)?;
        debug!(count = body.count, "listed documents");
        Ok(body.documents)
    }

    async fn get(&self, id: &str) -> Result<Document, DocumentError> {
        let resp = self
            .client
            .get(self.endpoint(&[id])?)
            .send()
            .await
            .map_err(Self::network)?;
        Self::check(resp, id)?.json().await.map_err(Self::invalid)
    }

    /// The server has no update-by-id route: documents are replaced by
    /// posting again with the same `metadata.path`, so only documents that
    /// carry a path can be updated.
    async fn update(&self, id: &str, title: &str, content: &str) -> Result<Document, DocumentError> {
        let existing = self.get(id).await?;
        if existing.metadata.path.is_none() {
            return Err(DocumentError::InvalidRequest(format!(
                "document {} has no metadata.path and cannot be updated",
                id
            )));
        }
        let updated = self
            .create(&CreateDocumentRequest {
                title: title.to_string(),
                content: content.to_string(),
                metadata: Some(existing.metadata),
            })
            .await?;
        if updated.id != id {
            return Err(DocumentError::InvalidResponse(format!(
                "update of {} landed on {}",
                id, updated.id
            )));
        }
        Ok(updated)
    }

    async fn rename(&self, id: &str, title: &str) -> Result<(), DocumentError> {
        if title.trim().is_empty() {
            return Err(DocumentError::InvalidRequest("Title is required".to_string()));
        }
        let resp = self
            .client
            .patch(self.endpoint(&[id])?)
            .json(&json!({ "title": title }))
            .send()
            .await
            .map_err(Self::network)?;
        Self::check(resp, id)?;
        Ok(())
    }

    async fn complete(
        &self,
        id: &str,
        commit_message: Option<&str>,
    ) -> Result<CompleteDocumentResponse, DocumentError> {
        let body = CompleteDocumentRequest {
            commit_message: commit_message.map(str::to_string),
        };
        let resp = self
            .client
            .post(self.endpoint(&[id, "complete"])?)
            .json(&body)
            .send()
            .await
            .map_err(Self::network)?;
        Self::check(resp, id)?.json().await.map_err(Self::invalid)
    }

    async fn delete(&self, id: &str) -> Result<(), DocumentError> {
        let resp = self
            .client
            .delete(self.endpoint(&[id])?)
            .send()
            .await
            .map_err(Self::network)?;
        Self::check(resp, id)?;
        Ok(())
    }

    async fn clear_all(&self) -> Result<usize, DocumentError> {
        let resp = self
            .client
            .delete(self.endpoint(&[])?)
            .send()
            .await
            .map_err(Self::network)?;
        let body: serde_json::Value = Self::check(resp, "")?.json().await.map_err(Self::invalid)?;
        Ok(body.get("deleted").and_then(|v| v.as_u64()).unwrap_or(0) as usize)
    }
}

// === In-process backend ===

const SUBSCRIBER_CAPACITY: usize = 64;

/// In-memory document store with new-document notifications.
pub struct MemoryDocumentService {
    documents: Mutex<HashMap<String, Document>>,
    events: broadcast::Sender<PushEvent>,
}

impl MemoryDocumentService {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
        Self {
            documents: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Subscribes to `NewDocument` events for documents created from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Document>>, DocumentError> {
        self.documents
            .lock()
            .map_err(|e| DocumentError::NetworkError(e.to_string()))
    }

    fn short_id() -> String {
        Uuid::new_v4().simple().to_string()[..8].to_string()
    }
}

impl Default for MemoryDocumentService {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentService for MemoryDocumentService {
    /// Creates a document, or updates in place when `metadata.path` matches
    /// an existing one. Only genuinely new documents are announced.
    async fn create(&self, request: &CreateDocumentRequest) -> Result<Document, DocumentError> {
        if request.title.trim().is_empty() {
            return Err(DocumentError::InvalidRequest("Title is required".to_string()));
        }
        let now = Utc::now().naive_utc();
        let metadata = request.metadata.clone().unwrap_or_default();

        let mut docs = self.lock()?;
        if let Some(path) = metadata.path.as_deref() {
            if let Some(doc) = docs.values_mut().find(|d| d.metadata.path.as_deref() == Some(path)) {
                doc.title = request.title.clone();
                doc.content = request.content.clone();
                doc.updated_at = now;
                return Ok(doc.clone());
            }
        }

        let mut id = Self::short_id();
        while docs.contains_key(&id) {
            id = Self::short_id();
        }
        let doc = Document {
            id: id.clone(),
            title: request.title.clone(),
            content: request.content.clone(),
            status: DocumentStatus::Active,
            created_at: now,
            updated_at: now,
            metadata,
        };
        docs.insert(id.clone(), doc.clone());
        drop(docs);

        // No subscribers is not an error.
        let _ = self.events.send(PushEvent::NewDocument {
            id,
            title: doc.title.clone(),
        });
        Ok(doc)
    }

    async fn list(&self, status: Option<DocumentStatus>) -> Result<Vec<DocumentSummary>, DocumentError> {
        let docs = self.lock()?;
        let mut summaries: Vec<DocumentSummary> = docs
            .values()
            .filter(|d| status.map_or(true, |s| d.status == s))
            .map(Document::summary)
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }

    async fn get(&self, id: &str) -> Result<Document, DocumentError> {
        self.lock()?
            .get(id)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))
    }

    async fn update(&self, id: &str, title: &str, content: &str) -> Result<Document, DocumentError> {
        let mut docs = self.lock()?;
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))?;
        doc.title = title.to_string();
        doc.content = content.to_string();
        doc.updated_at = Utc::now().naive_utc();
        Ok(doc.clone())
    }

    async fn rename(&self, id: &str, title: &str) -> Result<(), DocumentError> {
        if title.trim().is_empty() {
            return Err(DocumentError::InvalidRequest("Title is required".to_string()));
        }
        let mut docs = self.lock()?;
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))?;
        doc.title = title.to_string();
        doc.updated_at = Utc::now().naive_utc();
        Ok(())
    }

    /// There is no repository behind the in-memory store, so `git` is `None`.
    async fn complete(
        &self,
        id: &str,
        _commit_message: Option<&str>,
    ) -> Result<CompleteDocumentResponse, DocumentError> {
        let mut docs = self.lock()?;
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))?;
        doc.status = DocumentStatus::Complete;
        doc.updated_at = Utc::now().naive_utc();
        Ok(CompleteDocumentResponse {
            id: doc.id.clone(),
            status: doc.status,
            git: None,
        })
    }

    async fn delete(&self, id: &str) -> Result<(), DocumentError> {
        self.lock()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))
    }

    async fn clear_all(&self) -> Result<usize, DocumentError> {
        let mut docs = self.lock()?;
        let count = docs.len();
        docs.clear();
        Ok(count)
    }
}
