use crate::catalog;
use crate::ipc::error::ok;
use crate::ipc::helpers::optional_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_departments(req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "departments": catalog::DEPARTMENTS }))
}

fn handle_goals(req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "goals": catalog::GOALS }))
}

fn handle_objectives(req: &Request) -> serde_json::Value {
    let goal_id = optional_str(req, "goalId");
    let search = optional_str(req, "search").unwrap_or_default();
    let objectives = if search.is_empty() {
        match goal_id.as_deref() {
            Some(goal_id) => catalog::objectives_for_goal(goal_id),
            None => catalog::OBJECTIVES.iter().collect(),
        }
    } else {
        catalog::search_objectives(goal_id.as_deref(), &search)
    };
    ok(&req.id, json!({ "objectives": objectives }))
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "catalog.departments" => Some(handle_departments(req)),
        "catalog.goals" => Some(handle_goals(req)),
        "catalog.objectives" => Some(handle_objectives(req)),
        _ => None,
    }
}
