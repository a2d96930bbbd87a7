use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{commit_and_push, optional_bool, require_session, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::User;
use crate::review;
use serde_json::json;
use tracing::info;

fn admin_user(state: &AppState, req: &Request) -> Result<User, serde_json::Value> {
    let session = require_session(state, req)?;
    if !session.user.can_review() {
        return Err(err(&req.id, "permission_denied", "admin role required", None));
    }
    Ok(session.user.clone())
}

fn handle_overview(state: &mut AppState, req: &Request) -> serde_json::Value {
    let period = match required_str(req, "period") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(resp) = admin_user(state, req) {
        return resp;
    }
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let overview = review::overview(store.reports(), &period);
    ok(&req.id, json!(overview))
}

fn handle_goal_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    let period = match required_str(req, "period") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(resp) = admin_user(state, req) {
        return resp;
    }
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let groups = review::goal_view(store.reports(), &period);
    ok(&req.id, json!({ "period": period, "goals": groups }))
}

fn handle_accept(state: &mut AppState, req: &Request) -> serde_json::Value {
    let report_id = match required_str(req, "reportId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let confirm = optional_bool(req, "confirm");
    let user = match admin_user(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let mut next = store.snapshot();

    match review::accept_report(&mut next, &user, &report_id, confirm) {
        Ok(()) => {
            info!(report_id = %report_id, "report accepted");
            if let Err(resp) = commit_and_push(state, req, next) {
                return resp;
            }
            ok(&req.id, json!({ "reportId": report_id, "status": "ACCEPTED" }))
        }
        Err(e) => err(&req.id, &e.code, e.message, e.details),
    }
}

fn handle_request_revision(state: &mut AppState, req: &Request) -> serde_json::Value {
    let report_id = match required_str(req, "reportId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let confirm = optional_bool(req, "confirm");
    let user = match admin_user(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let mut next = store.snapshot();

    match review::request_revision(&mut next, &user, &report_id, confirm) {
        Ok(()) => {
            info!(report_id = %report_id, "revision requested; report unlocked");
            if let Err(resp) = commit_and_push(state, req, next) {
                return resp;
            }
            ok(
                &req.id,
                json!({ "reportId": report_id, "status": "REVISION_REQUESTED" }),
            )
        }
        Err(e) => err(&req.id, &e.code, e.message, e.details),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "admin.overview" => Some(handle_overview(state, req)),
        "admin.goalView" => Some(handle_goal_view(state, req)),
        "admin.accept" => Some(handle_accept(state, req)),
        "admin.requestRevision" => Some(handle_request_revision(state, req)),
        _ => None,
    }
}
