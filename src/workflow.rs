use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::catalog;
use crate::evidence;
use crate::model::{EntryStatus, Report, ReportEntry, ReportStatus, Role, User};

/// Department-side workflow error. Permission and validation failures stop
/// at the operation boundary; the shared report collection is never touched
/// on the error path.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl WorkflowError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        WorkflowError {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

type Result<T> = std::result::Result<T, WorkflowError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    PeriodSelect,
    GoalSelect,
    Entries,
    Summary,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::PeriodSelect => "PERIOD_SELECT",
            Step::GoalSelect => "GOAL_SELECT",
            Step::Entries => "ENTRIES",
            Step::Summary => "SUMMARY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PERIOD_SELECT" => Some(Step::PeriodSelect),
            "GOAL_SELECT" => Some(Step::GoalSelect),
            "ENTRIES" => Some(Step::Entries),
            "SUMMARY" => Some(Step::Summary),
            _ => None,
        }
    }
}

/// Landing step when a report is opened: locked reports are read-only and go
/// straight to the summary.
pub fn landing_step(report: &Report) -> Step {
    if report.status.is_editable() {
        Step::GoalSelect
    } else {
        Step::Summary
    }
}

/// Guarded navigation between workflow steps.
pub fn goto_step(report: &Report, to: Step) -> Result<Step> {
    match to {
        Step::PeriodSelect | Step::GoalSelect | Step::Summary if report.status.is_editable() => {
            Ok(to)
        }
        Step::Entries if report.status.is_editable() => {
            if report.selected_goals.is_empty() {
                Err(WorkflowError::new(
                    "invalid_transition",
                    "select at least one goal before recording entries",
                ))
            } else {
                Ok(to)
            }
        }
        // Locked reports only admit the read-only summary and going back to
        // period selection.
        Step::Summary | Step::PeriodSelect => Ok(to),
        _ => Err(WorkflowError::new(
            "report_locked",
            "report is submitted; editing steps are closed",
        )),
    }
}

fn require_department_actor(user: &User) -> Result<&str> {
    if user.role == Role::Admin {
        return Err(WorkflowError::new(
            "permission_denied",
            "admin users do not own department reports",
        ));
    }
    user.department_id.as_deref().ok_or_else(|| {
        WorkflowError::new("permission_denied", "no department attached to this session")
    })
}

#[derive(Debug)]
pub struct StartOutcome {
    pub report_id: String,
    pub step: Step,
    pub created: bool,
}

/// Open the report for (department, period), creating a fresh draft when
/// none exists. Creation is the only place report rows are born, which is
/// what keeps (departmentId, period) unique.
pub fn start_report(reports: &mut Vec<Report>, user: &User, period: &str) -> Result<StartOutcome> {
    let department_id = require_department_actor(user)?;
    if !crate::model::is_valid_period(period) {
        return Err(WorkflowError::new("bad_params", "period must be YYYY-MM")
            .with_details(serde_json::json!({ "period": period })));
    }

    if let Some(existing) = reports
        .iter()
        .find(|r| r.department_id == department_id && r.period == period)
    {
        return Ok(StartOutcome {
            report_id: existing.id.clone(),
            step: landing_step(existing),
            created: false,
        });
    }

    let report = Report::new(department_id, period, &user.id);
    let outcome = StartOutcome {
        report_id: report.id.clone(),
        step: Step::GoalSelect,
        created: true,
    };
    reports.push(report);
    Ok(outcome)
}

/// Toggle a goal's membership in the report's selection. Returns false
/// without touching anything when the report is locked. Deselecting a goal
/// keeps any entries already recorded under it; display layers re-derive
/// visibility from the selection.
pub fn toggle_goal(report: &mut Report, goal_id: &str) -> Result<bool> {
    if catalog::goal(goal_id).is_none() {
        return Err(WorkflowError::new("not_found", "unknown goal")
            .with_details(serde_json::json!({ "goalId": goal_id })));
    }
    if !report.status.is_editable() {
        return Ok(false);
    }
    if let Some(pos) = report.selected_goals.iter().position(|g| g == goal_id) {
        report.selected_goals.remove(pos);
    } else {
        report.selected_goals.push(goal_id.to_string());
    }
    Ok(true)
}

/// Append a new entry for an objective under a selected goal. HOD entries
/// are born approved; everyone else's wait for explicit HOD approval.
pub fn add_entry(
    report: &mut Report,
    user: &User,
    objective_id: &str,
    status: EntryStatus,
    narrative: &str,
) -> Result<Option<String>> {
    let objective = catalog::objective(objective_id).ok_or_else(|| {
        WorkflowError::new("not_found", "unknown objective")
            .with_details(serde_json::json!({ "objectiveId": objective_id }))
    })?;
    if !report.has_goal(objective.goal_id) {
        return Err(WorkflowError::new(
            "goal_not_selected",
            "the objective's goal is not selected for this period",
        )
        .with_details(serde_json::json!({ "goalId": objective.goal_id })));
    }
    if !report.status.is_editable() {
        return Ok(None);
    }

    let entry = ReportEntry {
        id: Uuid::new_v4().to_string(),
        report_id: report.id.clone(),
        objective_id: objective_id.to_string(),
        status,
        narrative: narrative.to_string(),
        metrics: None,
        challenges: None,
        support_needed: None,
        evidence_url: None,
        created_at: Utc::now().to_rfc3339(),
        submitted_by: user.id.clone(),
        submitted_by_name: user.name.clone(),
        is_approved_by_hod: user.is_hod(),
    };
    let id = entry.id.clone();
    report.entries.push(entry);
    Ok(Some(id))
}

#[derive(Debug, Default, Clone)]
pub struct EntryPatch {
    pub status: Option<EntryStatus>,
    pub narrative: Option<String>,
    pub metrics: Option<Option<String>>,
    pub challenges: Option<Option<String>>,
    pub support_needed: Option<Option<String>>,
    pub evidence_url: Option<Option<String>>,
}

/// Apply a field patch to an entry. Author-or-HOD rule; anyone else is a
/// silent no-op, as is any edit on a locked report.
pub fn update_entry(
    report: &mut Report,
    user: &User,
    entry_id: &str,
    patch: EntryPatch,
) -> Result<bool> {
    if !report.status.is_editable() {
        return Ok(false);
    }
    let Some(entry) = report.entry_mut(entry_id) else {
        return Err(WorkflowError::new("not_found", "entry not found")
            .with_details(serde_json::json!({ "entryId": entry_id })));
    };
    if !user.can_edit_entry(entry) {
        return Ok(false);
    }

    if let Some(status) = patch.status {
        entry.status = status;
    }
    if let Some(narrative) = patch.narrative {
        entry.narrative = narrative;
    }
    if let Some(metrics) = patch.metrics {
        entry.metrics = metrics;
    }
    if let Some(challenges) = patch.challenges {
        entry.challenges = challenges;
    }
    if let Some(support_needed) = patch.support_needed {
        entry.support_needed = support_needed;
    }
    if let Some(evidence_url) = patch.evidence_url {
        entry.evidence_url = evidence_url;
    }
    Ok(true)
}

/// HOD sign-off on a single entry.
pub fn approve_entry(report: &mut Report, user: &User, entry_id: &str) -> Result<bool> {
    if !user.can_approve() || !report.status.is_editable() {
        return Ok(false);
    }
    let Some(entry) = report.entry_mut(entry_id) else {
        return Err(WorkflowError::new("not_found", "entry not found")
            .with_details(serde_json::json!({ "entryId": entry_id })));
    };
    entry.is_approved_by_hod = true;
    Ok(true)
}

pub fn delete_entry(report: &mut Report, user: &User, entry_id: &str) -> Result<bool> {
    if !report.status.is_editable() {
        return Ok(false);
    }
    let Some(entry) = report.entry(entry_id) else {
        return Err(WorkflowError::new("not_found", "entry not found")
            .with_details(serde_json::json!({ "entryId": entry_id })));
    };
    if !user.can_edit_entry(entry) {
        return Ok(false);
    }
    report.entries.retain(|e| e.id != entry_id);
    Ok(true)
}

pub enum EvidenceSource<'a> {
    Url(&'a str),
    File {
        mime_type: &'a str,
        data_base64: &'a str,
    },
}

/// Attach evidence to an entry: a URL verbatim, or a file inlined as a
/// `data:` URL subject to the size cap.
pub fn attach_evidence(
    report: &mut Report,
    user: &User,
    entry_id: &str,
    source: EvidenceSource<'_>,
) -> Result<bool> {
    let value = match source {
        EvidenceSource::Url(url) => url.to_string(),
        EvidenceSource::File {
            mime_type,
            data_base64,
        } => evidence::encode_attachment_base64(mime_type, data_base64)
            .map_err(|e| WorkflowError::new(e.code, e.message))?,
    };
    update_entry(
        report,
        user,
        entry_id,
        EntryPatch {
            evidence_url: Some(if value.is_empty() { None } else { Some(value) }),
            ..EntryPatch::default()
        },
    )
}

#[derive(Debug)]
pub struct SubmitOutcome {
    pub dropped_unapproved: usize,
    pub submitted_at: String,
}

/// Final HOD submission. Unapproved entries do not survive: the caller must
/// acknowledge the exclusion when any exist, and the persisted report keeps
/// only HOD-approved entries.
pub fn submit(report: &mut Report, user: &User, confirm_exclusions: bool) -> Result<SubmitOutcome> {
    if !user.can_submit() {
        return Err(WorkflowError::new(
            "permission_denied",
            "only the Head of Department can perform the final submission",
        ));
    }
    if !report.status.is_editable() {
        return Err(WorkflowError::new(
            "invalid_transition",
            format!("report is {} and cannot be submitted", report.status.as_str()),
        ));
    }

    let unapproved = report.unapproved_count();
    if unapproved > 0 && !confirm_exclusions {
        return Err(WorkflowError::new(
            "confirm_required",
            format!("{unapproved} unapproved entries will be excluded from the final report"),
        )
        .with_details(serde_json::json!({ "unapprovedCount": unapproved })));
    }

    report.entries.retain(|e| e.is_approved_by_hod);
    report.status = ReportStatus::Submitted;
    let submitted_at = Utc::now().to_rfc3339();
    report.submitted_at = Some(submitted_at.clone());
    Ok(SubmitOutcome {
        dropped_unapproved: unapproved,
        submitted_at,
    })
}

/// Summary grouping: selected goals in selection order, each with the
/// entries whose objective sits under it. Entries orphaned by a later
/// deselection are retained in the data but filtered from this view.
pub fn summary_groups<'a>(
    report: &'a Report,
) -> Vec<(&'static catalog::Goal, Vec<&'a ReportEntry>)> {
    report
        .selected_goals
        .iter()
        .filter_map(|goal_id| catalog::goal(goal_id))
        .map(|goal| {
            let entries = report
                .entries
                .iter()
                .filter(|e| {
                    catalog::goal_for_objective(&e.objective_id)
                        .map(|g| g.id == goal.id)
                        .unwrap_or(false)
                })
                .collect();
            (goal, entries)
        })
        .collect()
}
