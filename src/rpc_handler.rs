//! RPC method handler for the docviewer JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested without stdio.
//! `handle_method` applies one host request to the session controller and
//! answers with the resulting view. Queued effects are left for the server
//! to run, so this module never blocks on I/O.

use std::time::Instant;

use serde_json::{json, Value};

use crate::app::SessionController;
use crate::managers::navigation::{parse_location, HostHistory, Route};
use crate::managers::session_manager::SessionStorage;
use crate::types::document::DocumentStatus;
use crate::types::tab::TabId;

/// Controller driven by a host page: history changes are queued for the host.
pub type RpcController<S> = SessionController<S, HostHistory>;

/// The `{"state", "history"}` body every tab or navigation method returns.
///
/// Drains the history commands the host has to apply to its real history.
pub fn state_payload<S: SessionStorage>(controller: &mut RpcController<S>) -> Result<Value, String> {
    let commands = controller.history_mut().take_commands();
    let state = serde_json::to_value(controller.projection(Instant::now())).map_err(|e| e.to_string())?;
    let history = serde_json::to_value(commands).map_err(|e| e.to_string())?;
    Ok(json!({"state": state, "history": history}))
}

/// A `{"event":"state", ...}` notification for changes the host did not ask for.
pub fn state_event<S: SessionStorage>(controller: &mut RpcController<S>) -> Result<Value, String> {
    let mut payload = state_payload(controller)?;
    payload["event"] = json!("state");
    Ok(payload)
}

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", name))
}

fn with_outcome(mut payload: Value, key: &str, value: Value) -> Value {
    payload[key] = value;
    payload
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method<S: SessionStorage>(
    controller: &mut RpcController<S>,
    method: &str,
    params: &Value,
) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Session ───
        "session.start" => {
            let location = params.get("location").and_then(|v| v.as_str()).unwrap_or("/");
            controller.history_mut().sync(location);
            let deep_link = match params.get("deep_link").and_then(|v| v.as_str()) {
                Some(id) => Some(id.to_string()),
                None => match parse_location(location) {
                    Route::Document(id) => Some(id),
                    _ => None,
                },
            };
            controller.start(deep_link.as_deref());
            state_payload(controller)
        }
        "state.get" => state_payload(controller),

        // ─── Tabs ───
        "tab.open" => {
            let id = str_param(params, "id")?;
            let title = params.get("title").and_then(|v| v.as_str()).unwrap_or(id);
            let background = params.get("background").and_then(|v| v.as_bool()).unwrap_or(false);
            if background {
                controller.open_in_background(id, title);
            } else {
                controller.open_and_activate(id, title);
            }
            state_payload(controller)
        }
        "tab.activate" => {
            let id = str_param(params, "id")?;
            controller.activate(TabId::from(id));
            state_payload(controller)
        }
        "tab.close" => {
            let id = str_param(params, "id")?;
            controller.close(id);
            state_payload(controller)
        }
        "tab.close_all" => {
            let outcome = controller.request_close_all(Instant::now());
            let payload = state_payload(controller)?;
            Ok(with_outcome(payload, "outcome", json!(outcome)))
        }
        "tab.rename" => {
            let id = str_param(params, "id")?;
            let title = str_param(params, "title")?;
            controller.rename(id, title).map_err(|e| e.to_string())?;
            state_payload(controller)
        }

        // ─── Documents ───
        "documents.clear_all" => {
            let outcome = controller.request_clear_all(Instant::now());
            let payload = state_payload(controller)?;
            Ok(with_outcome(payload, "outcome", json!(outcome)))
        }

        "documents.complete" => {
            let id = str_param(params, "id")?;
            let message = params.get("commit_message").and_then(|v| v.as_str());
            controller
                .complete_document(id, message)
                .map_err(|e| e.to_string())?;
            state_payload(controller)
        }
        "documents.filter" => {
            let status = match params.get("status") {
                None | Some(Value::Null) => None,
                Some(value) => Some(
                    serde_json::from_value::<DocumentStatus>(value.clone())
                        .map_err(|e| format!("invalid status: {}", e))?,
                ),
            };
            controller.set_status_filter(status);
            state_payload(controller)
        }

        // ─── Navigation ───
        "nav.popstate" => {
            let location = str_param(params, "location")?;
            controller.history_mut().sync(location);
            controller.on_popstate(location);
            state_payload(controller)
        }

        // ─── Timers ───
        "timers.poll" => {
            let changed = controller.poll_timers(Instant::now());
            let payload = state_payload(controller)?;
            Ok(with_outcome(payload, "changed", json!(changed)))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
