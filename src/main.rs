//! docviewer: headless follower for a document service.
//!
//! Restores the last session, optionally opens the document given as the
//! first argument (a document id or a `/doc/{id}` location), then follows
//! the service's live update stream and opens every pushed document in the
//! background until interrupted.

use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use docviewer::app::SessionController;
use docviewer::database::Database;
use docviewer::effects::{apply_outcome, EffectRunner};
use docviewer::logging;
use docviewer::managers::navigation::{parse_location, BrowserHistory, MemoryHistory, Route, DASHBOARD_LOCATION};
use docviewer::managers::session_manager::SqliteStorage;
use docviewer::services::document_service::HttpDocumentService;
use docviewer::services::live_updates::LiveUpdateChannel;
use docviewer::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use docviewer::types::tab::LoadStatus;

/// Accepts either a bare id or a navigation location.
fn deep_link_from_arg(arg: &str) -> Option<String> {
    if !arg.starts_with('/') {
        return Some(arg.to_string());
    }
    match parse_location(arg) {
        Route::Document(id) => Some(id),
        _ => None,
    }
}

fn log_tabs(controller: &SessionController<SqliteStorage, MemoryHistory>) {
    let view = controller.projection(Instant::now());
    for tab in view.tabs.iter().skip(1) {
        let status = match &tab.load_status {
            Some(LoadStatus::Failed(reason)) => format!("failed: {}", reason),
            Some(status) => format!("{:?}", status).to_lowercase(),
            None => String::new(),
        };
        info!(id = %tab.id, title = %tab.title, active = tab.active, %status, "tab");
    }
    info!(
        location = %view.location,
        history = controller.history().length(),
        documents = view.documents.len(),
        "session state"
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut settings_engine = SettingsEngine::new(None);
    let load_result = settings_engine.load();
    settings_engine.apply_env_overrides();
    let settings = settings_engine.get_settings().clone();
    logging::init(&settings.logging.filter);
    if let Err(e) = load_result {
        warn!(error = %e, "using default settings");
    }

    let deep_link = std::env::args().nth(1).and_then(|arg| deep_link_from_arg(&arg));
    let db = Arc::new(Database::open(settings_engine.session_database_path())?);
    let mut controller = SessionController::new(
        SqliteStorage::new(db),
        MemoryHistory::new(DASHBOARD_LOCATION),
        Duration::from_millis(settings.interaction.confirm_timeout_ms),
    );
    let service = HttpDocumentService::new(
        &settings.server.base_url,
        Duration::from_millis(settings.server.request_timeout_ms),
    )?;

    let mut runner = EffectRunner::new(&service);
    controller.start(deep_link.as_deref());
    runner.dispatch(&mut controller);

    let channel = LiveUpdateChannel::new(
        &settings.server.base_url,
        Duration::from_millis(settings.stream.retry_delay_ms),
    )?;
    info!(url = %channel.url(), "following live updates");
    let (stream_task, mut updates) = channel.spawn();

    loop {
        tokio::select! {
            Some(outcome) = runner.next_outcome(), if !runner.is_idle() => {
                apply_outcome(&mut controller, outcome);
                runner.dispatch(&mut controller);
                if runner.is_idle() {
                    log_tabs(&controller);
                }
            }
            message = updates.recv() => {
                let Some(message) = message else { break };
                controller.on_channel_message(message);
                runner.dispatch(&mut controller);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, session saved");
                break;
            }
        }
    }

    stream_task.abort();
    Ok(())
}
