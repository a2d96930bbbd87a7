use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{optional_str, require_session, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use crate::session::{self, Session};
use serde_json::json;
use tracing::info;

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let role = match required_str(req, "role") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Ok(role) = serde_json::from_value::<Role>(json!(role)) else {
        return err(
            &req.id,
            "bad_params",
            "role must be one of: LECTURER, HOD, ADMIN",
            None,
        );
    };
    let name = optional_str(req, "name");
    let department_id = optional_str(req, "departmentId");

    match session::login(name.as_deref(), role, department_id.as_deref()) {
        Ok(user) => {
            info!(user = %user.name, role = ?user.role, "session opened");
            let view = json!({ "user": &user });
            state.session = Some(Session::new(user));
            ok(&req.id, view)
        }
        Err(e) => err(&req.id, &e.code, e.message, e.details),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let had_session = state.session.take().is_some();
    ok(&req.id, json!({ "loggedOut": had_session }))
}

fn handle_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        json!({
            "user": &session.user,
            "reportId": &session.report_id,
            "step": session.step.as_str(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.login" => Some(handle_login(state, req)),
        "session.logout" => Some(handle_logout(state, req)),
        "session.current" => Some(handle_current(state, req)),
        _ => None,
    }
}
