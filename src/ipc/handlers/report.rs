use crate::catalog;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{commit_and_push, optional_bool, optional_str, require_session, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{EntryStatus, Report, User};
use crate::workflow::{self, EntryPatch, EvidenceSource, Step, WorkflowError};
use serde_json::json;

fn wf_err(req: &Request, e: WorkflowError) -> serde_json::Value {
    err(&req.id, &e.code, e.message, e.details)
}

/// Department-side context: the session user plus the report the session
/// currently has open.
fn dept_context(state: &AppState, req: &Request) -> Result<(User, String), serde_json::Value> {
    let session = require_session(state, req)?;
    let Some(report_id) = session.report_id.clone() else {
        return Err(err(&req.id, "no_report", "start or open a report first", None));
    };
    Ok((session.user.clone(), report_id))
}

fn snapshot(state: &AppState, req: &Request) -> Result<Vec<Report>, serde_json::Value> {
    state
        .store
        .as_ref()
        .map(|s| s.snapshot())
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

fn handle_start(state: &mut AppState, req: &Request) -> serde_json::Value {
    let period = match required_str(req, "period") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let user = match require_session(state, req) {
        Ok(s) => s.user.clone(),
        Err(resp) => return resp,
    };
    let mut next = match snapshot(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let outcome = match workflow::start_report(&mut next, &user, &period) {
        Ok(v) => v,
        Err(e) => return wf_err(req, e),
    };
    let report = next
        .iter()
        .find(|r| r.id == outcome.report_id)
        .cloned();
    if outcome.created {
        if let Err(resp) = commit_and_push(state, req, next) {
            return resp;
        }
    }
    if let Some(session) = state.session.as_mut() {
        session.open_report(&outcome.report_id, outcome.step);
    }
    ok(
        &req.id,
        json!({
            "reportId": outcome.report_id,
            "step": outcome.step.as_str(),
            "created": outcome.created,
            "report": report,
        }),
    )
}

fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let report_id = match required_str(req, "reportId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let user = match require_session(state, req) {
        Ok(s) => s.user.clone(),
        Err(resp) => return resp,
    };
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(report) = store.find(&report_id) else {
        return err(&req.id, "not_found", "report not found", None);
    };
    if user.department_id.as_deref() != Some(report.department_id.as_str()) {
        return err(
            &req.id,
            "permission_denied",
            "report belongs to another department",
            None,
        );
    }

    let step = workflow::landing_step(report);
    let view = json!({ "reportId": &report.id, "step": step.as_str(), "report": report });
    if let Some(session) = state.session.as_mut() {
        session.open_report(&report_id, step);
    }
    ok(&req.id, view)
}

fn handle_step(state: &mut AppState, req: &Request) -> serde_json::Value {
    let to = match required_str(req, "to") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(to) = Step::parse(&to) else {
        return err(
            &req.id,
            "bad_params",
            "to must be one of: PERIOD_SELECT, GOAL_SELECT, ENTRIES, SUMMARY",
            None,
        );
    };
    let (_user, report_id) = match dept_context(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(report) = store.find(&report_id) else {
        return err(&req.id, "not_found", "report not found", None);
    };

    match workflow::goto_step(report, to) {
        Ok(step) => {
            if let Some(session) = state.session.as_mut() {
                if step == Step::PeriodSelect {
                    session.close_report();
                } else {
                    session.step = step;
                }
            }
            ok(&req.id, json!({ "step": step.as_str() }))
        }
        Err(e) => wf_err(req, e),
    }
}

fn handle_toggle_goal(state: &mut AppState, req: &Request) -> serde_json::Value {
    let goal_id = match required_str(req, "goalId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (_user, report_id) = match dept_context(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut next = match snapshot(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(report) = next.iter_mut().find(|r| r.id == report_id) else {
        return err(&req.id, "not_found", "report not found", None);
    };

    match workflow::toggle_goal(report, &goal_id) {
        Ok(applied) => {
            let selected = report.selected_goals.clone();
            if applied {
                if let Err(resp) = commit_and_push(state, req, next) {
                    return resp;
                }
            }
            ok(&req.id, json!({ "applied": applied, "selectedGoals": selected }))
        }
        Err(e) => wf_err(req, e),
    }
}

fn handle_add_entry(state: &mut AppState, req: &Request) -> serde_json::Value {
    let objective_id = match required_str(req, "objectiveId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status = match optional_str(req, "status") {
        None => EntryStatus::InProgress,
        Some(s) => match EntryStatus::parse(&s) {
            Some(v) => v,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "status must be one of: Not started, In progress, Completed, Delayed",
                    Some(json!({ "status": s })),
                )
            }
        },
    };
    let narrative = optional_str(req, "narrative").unwrap_or_default();
    let (user, report_id) = match dept_context(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut next = match snapshot(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(report) = next.iter_mut().find(|r| r.id == report_id) else {
        return err(&req.id, "not_found", "report not found", None);
    };

    match workflow::add_entry(report, &user, &objective_id, status, &narrative) {
        Ok(Some(entry_id)) => {
            let entry = report.entry(&entry_id).cloned();
            if let Err(resp) = commit_and_push(state, req, next) {
                return resp;
            }
            ok(
                &req.id,
                json!({ "applied": true, "entryId": entry_id, "entry": entry }),
            )
        }
        Ok(None) => ok(&req.id, json!({ "applied": false })),
        Err(e) => wf_err(req, e),
    }
}

/// Absent key = leave alone; null = clear; string = set. Only for the
/// optional free-text fields.
fn patch_field(req: &Request, key: &str) -> Option<Option<String>> {
    match req.params.get(key) {
        None => None,
        Some(serde_json::Value::Null) => Some(None),
        Some(v) => Some(v.as_str().map(|s| s.to_string())),
    }
}

fn handle_update_entry(state: &mut AppState, req: &Request) -> serde_json::Value {
    let entry_id = match required_str(req, "entryId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status = match optional_str(req, "status") {
        None => None,
        Some(s) => match EntryStatus::parse(&s) {
            Some(v) => Some(v),
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "status must be one of: Not started, In progress, Completed, Delayed",
                    Some(json!({ "status": s })),
                )
            }
        },
    };
    let patch = EntryPatch {
        status,
        narrative: optional_str(req, "narrative"),
        metrics: patch_field(req, "metrics"),
        challenges: patch_field(req, "challenges"),
        support_needed: patch_field(req, "supportNeeded"),
        evidence_url: patch_field(req, "evidenceUrl"),
    };
    let (user, report_id) = match dept_context(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut next = match snapshot(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(report) = next.iter_mut().find(|r| r.id == report_id) else {
        return err(&req.id, "not_found", "report not found", None);
    };

    match workflow::update_entry(report, &user, &entry_id, patch) {
        Ok(applied) => {
            if applied {
                if let Err(resp) = commit_and_push(state, req, next) {
                    return resp;
                }
            }
            ok(&req.id, json!({ "applied": applied }))
        }
        Err(e) => wf_err(req, e),
    }
}

fn handle_approve_entry(state: &mut AppState, req: &Request) -> serde_json::Value {
    let entry_id = match required_str(req, "entryId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (user, report_id) = match dept_context(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut next = match snapshot(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(report) = next.iter_mut().find(|r| r.id == report_id) else {
        return err(&req.id, "not_found", "report not found", None);
    };

    match workflow::approve_entry(report, &user, &entry_id) {
        Ok(applied) => {
            if applied {
                if let Err(resp) = commit_and_push(state, req, next) {
                    return resp;
                }
            }
            ok(&req.id, json!({ "applied": applied }))
        }
        Err(e) => wf_err(req, e),
    }
}

fn handle_delete_entry(state: &mut AppState, req: &Request) -> serde_json::Value {
    let entry_id = match required_str(req, "entryId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (user, report_id) = match dept_context(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut next = match snapshot(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(report) = next.iter_mut().find(|r| r.id == report_id) else {
        return err(&req.id, "not_found", "report not found", None);
    };

    match workflow::delete_entry(report, &user, &entry_id) {
        Ok(applied) => {
            if applied {
                if let Err(resp) = commit_and_push(state, req, next) {
                    return resp;
                }
            }
            ok(&req.id, json!({ "applied": applied }))
        }
        Err(e) => wf_err(req, e),
    }
}

fn handle_attach_evidence(state: &mut AppState, req: &Request) -> serde_json::Value {
    let entry_id = match required_str(req, "entryId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let url = optional_str(req, "url");
    let file = req.params.get("file");
    let source = match (url.as_deref(), file) {
        (Some(url), None) => EvidenceSource::Url(url),
        (None, Some(file)) => {
            let mime_type = file.get("mimeType").and_then(|v| v.as_str()).unwrap_or("");
            let Some(data_base64) = file.get("dataBase64").and_then(|v| v.as_str()) else {
                return err(&req.id, "bad_params", "missing file.dataBase64", None);
            };
            EvidenceSource::File {
                mime_type,
                data_base64,
            }
        }
        _ => {
            return err(
                &req.id,
                "bad_params",
                "provide exactly one of url or file",
                None,
            )
        }
    };
    let (user, report_id) = match dept_context(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut next = match snapshot(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(report) = next.iter_mut().find(|r| r.id == report_id) else {
        return err(&req.id, "not_found", "report not found", None);
    };

    match workflow::attach_evidence(report, &user, &entry_id, source) {
        Ok(applied) => {
            let evidence_url = report
                .entry(&entry_id)
                .and_then(|e| e.evidence_url.clone());
            let inline = evidence_url.as_deref().map(crate::evidence::is_inline);
            if applied {
                if let Err(resp) = commit_and_push(state, req, next) {
                    return resp;
                }
            }
            ok(
                &req.id,
                json!({ "applied": applied, "evidenceUrl": evidence_url, "inline": inline }),
            )
        }
        Err(e) => wf_err(req, e),
    }
}

fn handle_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let confirm = optional_bool(req, "confirmExclusions");
    let (user, report_id) = match dept_context(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut next = match snapshot(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(report) = next.iter_mut().find(|r| r.id == report_id) else {
        return err(&req.id, "not_found", "report not found", None);
    };

    match workflow::submit(report, &user, confirm) {
        Ok(outcome) => {
            let status = report.status;
            let entry_count = report.entries.len();
            if let Err(resp) = commit_and_push(state, req, next) {
                return resp;
            }
            if let Some(session) = state.session.as_mut() {
                session.step = Step::Summary;
            }
            ok(
                &req.id,
                json!({
                    "status": status.as_str(),
                    "submittedAt": outcome.submitted_at,
                    "droppedUnapproved": outcome.dropped_unapproved,
                    "entryCount": entry_count,
                }),
            )
        }
        Err(e) => wf_err(req, e),
    }
}

fn handle_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_user, report_id) = match dept_context(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(report) = store.find(&report_id) else {
        return err(&req.id, "not_found", "report not found", None);
    };

    let groups: Vec<serde_json::Value> = workflow::summary_groups(report)
        .into_iter()
        .map(|(goal, entries)| json!({ "goal": goal, "entries": entries }))
        .collect();
    ok(
        &req.id,
        json!({
            "reportId": &report.id,
            "departmentName": catalog::department(&report.department_id).map(|d| d.name),
            "period": &report.period,
            "status": report.status.as_str(),
            "submittedAt": &report.submitted_at,
            "unapprovedCount": report.unapproved_count(),
            "groups": groups,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "report.start" => Some(handle_start(state, req)),
        "report.open" => Some(handle_open(state, req)),
        "report.step" => Some(handle_step(state, req)),
        "report.toggleGoal" => Some(handle_toggle_goal(state, req)),
        "report.addEntry" => Some(handle_add_entry(state, req)),
        "report.updateEntry" => Some(handle_update_entry(state, req)),
        "report.approveEntry" => Some(handle_approve_entry(state, req)),
        "report.deleteEntry" => Some(handle_delete_entry(state, req)),
        "report.attachEvidence" => Some(handle_attach_evidence(state, req)),
        "report.submit" => Some(handle_submit(state, req)),
        "report.summary" => Some(handle_summary(state, req)),
        _ => None,
    }
}
