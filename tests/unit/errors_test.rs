use docviewer::types::errors::*;

// === TabError Tests ===

#[test]
fn tab_error_not_found_display() {
    let err = TabError::NotFound("a1b2c3d4".to_string());
    assert_eq!(err.to_string(), "Tab not found: a1b2c3d4");
}

#[test]
fn tab_error_dashboard_and_title_display() {
    assert_eq!(
        TabError::DashboardImmutable.to_string(),
        "The dashboard tab cannot be modified"
    );
    assert_eq!(TabError::EmptyTitle.to_string(), "Tab title cannot be empty");
}

#[test]
fn tab_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(TabError::NotFound("id".to_string()));
    assert!(err.source().is_none());
}

// === SessionError Tests ===

#[test]
fn session_error_display_variants() {
    assert_eq!(
        SessionError::SerializationError("eof".to_string()).to_string(),
        "Session serialization error: eof"
    );
    assert_eq!(
        SessionError::DatabaseError("locked".to_string()).to_string(),
        "Session database error: locked"
    );
    assert_eq!(
        SessionError::StorageUnavailable("poisoned".to_string()).to_string(),
        "Session storage unavailable: poisoned"
    );
}

// === DocumentError Tests ===

#[test]
fn document_error_display_variants() {
    assert_eq!(
        DocumentError::NotFound("x".to_string()).to_string(),
        "Document not found: x"
    );
    assert_eq!(
        DocumentError::NetworkError("refused".to_string()).to_string(),
        "Document service network error: refused"
    );
    assert_eq!(
        DocumentError::InvalidResponse("not json".to_string()).to_string(),
        "Invalid document service response: not json"
    );
    assert_eq!(
        DocumentError::InvalidRequest("Title is required".to_string()).to_string(),
        "Invalid document request: Title is required"
    );
}

// === StreamError Tests ===

#[test]
fn stream_error_display_variants() {
    assert_eq!(
        StreamError::UnknownEvent("doc_deleted".to_string()).to_string(),
        "Unknown stream event type: doc_deleted"
    );
    assert_eq!(
        StreamError::MalformedEvent("missing type tag".to_string()).to_string(),
        "Malformed stream event: missing type tag"
    );
    assert_eq!(
        StreamError::ConnectionError("reset".to_string()).to_string(),
        "Stream connection error: reset"
    );
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::InvalidKey("server.nope".to_string()).to_string(),
        "Invalid settings key: server.nope"
    );
    assert_eq!(
        SettingsError::IoError("denied".to_string()).to_string(),
        "Settings I/O error: denied"
    );
}
