use crate::db::ReportStore;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "syncConfigured": state.sync.configured(),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };

    let mut store = match ReportStore::open(&path) {
        Ok(store) => store,
        Err(e) => return err(&req.id, "db_open_failed", format!("{e:?}"), None),
    };

    // Local cache first for immediate availability, then a snapshot pull.
    // A failed pull leaves the cache in charge and the client in local mode.
    if state.sync.configured() {
        if let Ok(snapshot) = state.sync.pull_snapshot() {
            if let Err(e) = store.replace_from_remote(snapshot) {
                return err(&req.id, "db_write_failed", format!("{e:?}"), None);
            }
        }
    }

    info!(
        workspace = %path.display(),
        reports = store.reports().len(),
        "workspace opened"
    );
    let report_count = store.reports().len();
    state.workspace = Some(path.clone());
    state.store = Some(store);
    ok(
        &req.id,
        json!({
            "workspacePath": path.to_string_lossy(),
            "reportCount": report_count,
            "sync": state.sync.status(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
