//! docviewer RPC Server: JSON-RPC over stdin/stdout for a host page.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"tab.open", "params":{"id":"a1b2c3d4","title":"..."}}
//! Response: {"id":1, "result":{"state":{...},"history":[...]}} or {"id":1, "error":"..."}
//! Event:    {"event":"state", "state":{...}, "history":[...]}
//!
//! Logs go to stderr so stdout carries protocol lines only. Document I/O runs
//! alongside request handling; each finished load or list refresh is reported
//! as a state event.

use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use docviewer::app::SessionController;
use docviewer::database::Database;
use docviewer::effects::{apply_outcome, EffectRunner};
use docviewer::logging;
use docviewer::managers::navigation::{HostHistory, DASHBOARD_LOCATION};
use docviewer::managers::session_manager::{SessionStorage, SqliteStorage};
use docviewer::rpc_handler::{handle_method, state_event, RpcController};
use docviewer::services::document_service::HttpDocumentService;
use docviewer::services::live_updates::LiveUpdateChannel;
use docviewer::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

/// How often armed confirmation gates are checked for expiry.
const TIMER_TICK: Duration = Duration::from_millis(250);

fn emit(value: &Value) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{}", value);
    let _ = out.flush();
}

fn emit_state<S: SessionStorage>(controller: &mut RpcController<S>) {
    match state_event(controller) {
        Ok(event) => emit(&event),
        Err(e) => warn!(error = %e, "could not build state event"),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut settings_engine = SettingsEngine::new(None);
    let load_result = settings_engine.load();
    settings_engine.apply_env_overrides();
    let settings = settings_engine.get_settings().clone();
    logging::init(&settings.logging.filter);
    if let Err(e) = load_result {
        warn!(error = %e, "using default settings");
    }

    let db = Arc::new(Database::open(settings_engine.session_database_path())?);
    let controller = SessionController::new(
        SqliteStorage::new(db),
        HostHistory::new(DASHBOARD_LOCATION),
        Duration::from_millis(settings.interaction.confirm_timeout_ms),
    );
    let service = HttpDocumentService::new(
        &settings.server.base_url,
        Duration::from_millis(settings.server.request_timeout_ms),
    )?;
    let channel = LiveUpdateChannel::new(
        &settings.server.base_url,
        Duration::from_millis(settings.stream.retry_delay_ms),
    )?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(controller, service, channel));
    Ok(())
}

async fn serve(
    mut controller: RpcController<SqliteStorage>,
    service: HttpDocumentService,
    channel: LiveUpdateChannel,
) {
    info!(base_url = %service.base_url(), "rpc server ready");
    emit(&json!({"event":"ready","version":env!("CARGO_PKG_VERSION")}));

    let (stream_task, mut updates) = channel.spawn();
    let mut runner = EffectRunner::new(&service);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(TIMER_TICK);
    // Push events are held back until the session has been restored.
    let mut started = false;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "stdin read failed");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let req: Value = match serde_json::from_str(&line) {
                    Ok(v) => v,
                    Err(e) => {
                        emit(&json!({"id":null,"error":format!("parse error: {}", e)}));
                        continue;
                    }
                };

                let id = req.get("id").cloned().unwrap_or(Value::Null);
                let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
                let params = req.get("params").cloned().unwrap_or(json!({}));
                debug!(%method, "rpc request");

                let response = match handle_method(&mut controller, method, &params) {
                    Ok(val) => json!({"id": id, "result": val}),
                    Err(err) => json!({"id": id, "error": err}),
                };
                emit(&response);
                if method == "session.start" {
                    started = true;
                }
                runner.dispatch(&mut controller);
            }
            Some(outcome) = runner.next_outcome(), if !runner.is_idle() => {
                apply_outcome(&mut controller, outcome);
                runner.dispatch(&mut controller);
                emit_state(&mut controller);
            }
            Some(message) = updates.recv(), if started => {
                controller.on_channel_message(message);
                runner.dispatch(&mut controller);
                emit_state(&mut controller);
            }
            _ = ticker.tick() => {
                if controller.poll_timers(std::time::Instant::now()) {
                    emit_state(&mut controller);
                }
            }
        }
    }

    info!(in_flight = runner.in_flight(), "stdin closed, shutting down");
    stream_task.abort();
}
