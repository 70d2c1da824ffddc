//! Integration-level unit tests for the SettingsEngine public API.
//!
//! These tests exercise the SettingsEngine through its public trait interface,
//! validating default loading, value persistence, environment overrides and reset.

use docviewer::services::settings_engine::{SettingsEngine, SettingsEngineTrait, ENV_BASE_URL};
use docviewer::types::errors::SettingsError;
use docviewer::types::settings::ViewerSettings;
use tempfile::TempDir;

/// Helper: create a SettingsEngine backed by a temp directory that lives for the
/// duration of the test (the caller holds the `TempDir` handle).
fn engine_in_temp(dir: &TempDir) -> SettingsEngine {
    let path = dir
        .path()
        .join("settings.json")
        .to_string_lossy()
        .to_string();
    SettingsEngine::new(Some(path))
}

#[test]
fn test_load_defaults_when_no_config_file_exists() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let settings = engine.load().unwrap();

    assert_eq!(settings, ViewerSettings::default());
    assert_eq!(settings.server.base_url, "http://127.0.0.1:8000");
    assert_eq!(settings.interaction.confirm_timeout_ms, 3000);
    assert_eq!(settings.stream.retry_delay_ms, 3000);
}

/// A new engine reading the same file must see values written by `set_value`.
#[test]
fn test_set_value_persists_changes() {
    let dir = TempDir::new().unwrap();
    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();
        engine
            .set_value("server.base_url", serde_json::json!("http://docs.internal:9000"))
            .unwrap();
        engine
            .set_value("interaction.confirm_timeout_ms", serde_json::json!(5000))
            .unwrap();
    }

    let mut engine2 = engine_in_temp(&dir);
    let loaded = engine2.load().unwrap();
    assert_eq!(loaded.server.base_url, "http://docs.internal:9000");
    assert_eq!(loaded.interaction.confirm_timeout_ms, 5000);
}

#[test]
fn test_set_value_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    assert!(matches!(
        engine.set_value("server.nope", serde_json::json!(1)),
        Err(SettingsError::InvalidKey(_))
    ));
    assert!(matches!(
        engine.set_value("", serde_json::json!(1)),
        Err(SettingsError::InvalidKey(_))
    ));
}

#[test]
fn test_set_value_rejects_wrong_type() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    assert!(matches!(
        engine.set_value("stream.retry_delay_ms", serde_json::json!("soon")),
        Err(SettingsError::InvalidValue(_))
    ));
    assert_eq!(engine.get_settings().stream.retry_delay_ms, 3000);
}

#[test]
fn test_set_optional_database_path() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    let db_path = dir.path().join("s.db").to_string_lossy().to_string();
    engine
        .set_value("session.database_path", serde_json::json!(db_path))
        .unwrap();
    assert_eq!(engine.session_database_path(), dir.path().join("s.db"));
}

#[test]
fn test_malformed_file_is_serialization_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();
    let mut engine = engine_in_temp(&dir);
    assert!(matches!(engine.load(), Err(SettingsError::SerializationError(_))));
}

#[test]
fn test_env_override_applies_in_memory_only() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    std::env::set_var(ENV_BASE_URL, "http://override:1234");
    engine.apply_env_overrides();
    std::env::remove_var(ENV_BASE_URL);

    assert_eq!(engine.get_settings().server.base_url, "http://override:1234");
    assert!(!dir.path().join("settings.json").exists());
}

#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();
    {
        let mut engine = engine_in_temp(&dir);
        engine
            .set_value("logging.filter", serde_json::json!("docviewer=debug"))
            .unwrap();
        engine.reset().unwrap();
        assert_eq!(*engine.get_settings(), ViewerSettings::default());
    }

    let mut engine2 = engine_in_temp(&dir);
    assert_eq!(engine2.load().unwrap(), ViewerSettings::default());
}
