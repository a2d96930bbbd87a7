use crate::catalog;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{optional_str, require_session};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

/// Read-only archive of past reports: department users see their own
/// department, the admin sees everything. Newest period first.
fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let period = optional_str(req, "period");
    let user = match require_session(state, req) {
        Ok(s) => s.user.clone(),
        Err(resp) => return resp,
    };
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let mut rows: Vec<&crate::model::Report> = store
        .reports()
        .iter()
        .filter(|r| match user.department_id.as_deref() {
            Some(dept) => r.department_id == dept,
            None => true,
        })
        .filter(|r| period.as_deref().map(|p| r.period == p).unwrap_or(true))
        .collect();
    rows.sort_by(|a, b| b.period.cmp(&a.period));

    let reports: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|r| {
            json!({
                "id": &r.id,
                "departmentId": &r.department_id,
                "departmentName": catalog::department(&r.department_id).map(|d| d.name),
                "period": &r.period,
                "status": r.status.as_str(),
                "entryCount": r.entries.len(),
                "submittedAt": &r.submitted_at,
            })
        })
        .collect();
    ok(&req.id, json!({ "reports": reports }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.list" => Some(handle_list(state, req)),
        _ => None,
    }
}
