use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::model::Report;
use crate::session::Session;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}

pub fn optional_bool(req: &Request, key: &str) -> bool {
    req.params.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

pub fn require_session<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a Session, serde_json::Value> {
    state
        .session
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_session", "log in first", None))
}

/// Bulk-set commit of the mutated collection, then a best-effort push of
/// the single changed report. Push failures are recorded on the sync
/// client and never unwind the local mutation.
pub fn commit_and_push(
    state: &mut AppState,
    req: &Request,
    next: Vec<Report>,
) -> Result<(), serde_json::Value> {
    let Some(store) = state.store.as_mut() else {
        return Err(err(&req.id, "no_workspace", "select a workspace first", None));
    };
    let changed = store
        .commit(next)
        .map_err(|e| err(&req.id, "db_write_failed", format!("{e:?}"), None))?;

    if let Some(report) = changed {
        if state.sync.configured() && !state.sync.is_offline() {
            // Failure is surfaced via sync.status; the next mutation
            // retries with the same report.
            let _ = state.sync.push(&report);
        }
    }
    Ok(())
}
