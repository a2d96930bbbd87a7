use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::info;

fn handle_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!(state.sync.status()))
}

/// Explicit re-pull of the remote snapshot. Success fully replaces the
/// local collection, including the empty-collection case.
fn handle_refresh(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.store.is_none() {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    }

    match state.sync.pull_snapshot() {
        Ok(snapshot) => {
            let count = snapshot.len();
            let Some(store) = state.store.as_mut() else {
                return err(&req.id, "no_workspace", "select a workspace first", None);
            };
            if let Err(e) = store.replace_from_remote(snapshot) {
                return err(&req.id, "db_write_failed", format!("{e:?}"), None);
            }
            info!(reports = count, "local collection replaced from remote");
            ok(
                &req.id,
                json!({ "reportCount": count, "sync": state.sync.status() }),
            )
        }
        Err(e) => err(&req.id, "sync_failed", e.to_string(), None),
    }
}

fn handle_test(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.sync.probe() {
        Ok(time) => ok(&req.id, json!({ "status": "ok", "time": time })),
        Err(e) => err(&req.id, "sync_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "sync.status" => Some(handle_status(state, req)),
        "sync.refresh" => Some(handle_refresh(state, req)),
        "sync.test" => Some(handle_test(state, req)),
        _ => None,
    }
}
