use serde::Serialize;

use crate::catalog;
use crate::model::{Report, ReportStatus, User};
use crate::workflow::WorkflowError;

type Result<T> = std::result::Result<T, WorkflowError>;

fn require_admin(user: &User) -> Result<()> {
    if user.can_review() {
        Ok(())
    } else {
        Err(WorkflowError::new(
            "permission_denied",
            "admin role required",
        ))
    }
}

fn find_report<'a>(reports: &'a mut [Report], report_id: &str) -> Result<&'a mut Report> {
    reports
        .iter_mut()
        .find(|r| r.id == report_id)
        .ok_or_else(|| {
            WorkflowError::new("not_found", "report not found")
                .with_details(serde_json::json!({ "reportId": report_id }))
        })
}

/// Mark a submitted report as final. Terminal: nothing further is defined on
/// an accepted report.
pub fn accept_report(
    reports: &mut [Report],
    user: &User,
    report_id: &str,
    confirm: bool,
) -> Result<()> {
    require_admin(user)?;
    if !confirm {
        return Err(WorkflowError::new(
            "confirm_required",
            "accepting a report is final; pass confirm=true",
        ));
    }
    let report = find_report(reports, report_id)?;
    if report.status != ReportStatus::Submitted {
        return Err(WorkflowError::new(
            "invalid_transition",
            format!("cannot accept a {} report", report.status.as_str()),
        ));
    }
    report.status = ReportStatus::Accepted;
    Ok(())
}

/// Send a submitted report back to the department. Reopens editing and
/// clears nothing.
pub fn request_revision(
    reports: &mut [Report],
    user: &User,
    report_id: &str,
    confirm: bool,
) -> Result<()> {
    require_admin(user)?;
    if !confirm {
        return Err(WorkflowError::new(
            "confirm_required",
            "requesting a revision unlocks the report for the department; pass confirm=true",
        ));
    }
    let report = find_report(reports, report_id)?;
    if report.status != ReportStatus::Submitted {
        return Err(WorkflowError::new(
            "invalid_transition",
            format!("cannot request revision on a {} report", report.status.as_str()),
        ));
    }
    report.status = ReportStatus::RevisionRequested;
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentRow {
    pub department_id: String,
    pub department_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReportStatus>,
    pub entry_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub period: String,
    pub total_departments: usize,
    pub submitted: usize,
    pub pending: usize,
    pub submission_rate: i64,
    pub total_items: usize,
    pub departments: Vec<DepartmentRow>,
}

/// Submission rate as a whole percentage, 0 when there are no departments.
pub fn submission_rate(submitted: usize, total_departments: usize) -> i64 {
    if total_departments == 0 {
        return 0;
    }
    (100.0 * submitted as f64 / total_departments as f64).round() as i64
}

/// Per-department submission state for one period, plus the aggregate
/// counters the dashboard header shows.
pub fn overview(reports: &[Report], period: &str) -> Overview {
    let period_reports: Vec<&Report> = reports.iter().filter(|r| r.period == period).collect();
    let departments: Vec<DepartmentRow> = catalog::DEPARTMENTS
        .iter()
        .map(|dept| {
            let report = period_reports.iter().find(|r| r.department_id == dept.id);
            DepartmentRow {
                department_id: dept.id.to_string(),
                department_name: dept.name.to_string(),
                report_id: report.map(|r| r.id.clone()),
                status: report.map(|r| r.status),
                entry_count: report.map(|r| r.entries.len()).unwrap_or(0),
            }
        })
        .collect();

    let submitted = period_reports
        .iter()
        .filter(|r| r.status.is_submitted())
        .count();
    let total_departments = catalog::DEPARTMENTS.len();
    let total_items = period_reports.iter().map(|r| r.entries.len()).sum();

    Overview {
        period: period.to_string(),
        total_departments,
        submitted,
        pending: total_departments.saturating_sub(submitted),
        submission_rate: submission_rate(submitted, total_departments),
        total_items,
        departments,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalGroupEntry {
    pub department_id: String,
    pub department_name: String,
    pub objective_id: String,
    pub objective_code: String,
    pub entry: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalGroup {
    pub goal_id: String,
    pub code: String,
    pub title: String,
    pub entries: Vec<GoalGroupEntry>,
}

/// Cross-department view: every entry for the period, grouped under the
/// goal its objective belongs to. Entries with an unknown objective are
/// filtered defensively rather than treated as errors.
pub fn goal_view(reports: &[Report], period: &str) -> Vec<GoalGroup> {
    catalog::GOALS
        .iter()
        .map(|goal| {
            let mut entries = Vec::new();
            for report in reports.iter().filter(|r| r.period == period) {
                let dept_name = catalog::department(&report.department_id)
                    .map(|d| d.name)
                    .unwrap_or("Unknown");
                for entry in &report.entries {
                    let Some(objective) = catalog::objective(&entry.objective_id) else {
                        continue;
                    };
                    if objective.goal_id != goal.id {
                        continue;
                    }
                    entries.push(GoalGroupEntry {
                        department_id: report.department_id.clone(),
                        department_name: dept_name.to_string(),
                        objective_id: objective.id.to_string(),
                        objective_code: objective.code.to_string(),
                        entry: serde_json::to_value(entry).unwrap_or(serde_json::Value::Null),
                    });
                }
            }
            GoalGroup {
                goal_id: goal.id.to_string(),
                code: goal.code.to_string(),
                title: goal.title.to_string(),
                entries,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntryStatus, Role};
    use crate::workflow;

    fn admin() -> User {
        User {
            id: "u-admin".to_string(),
            name: "Dean Office Admin".to_string(),
            role: Role::Admin,
            department_id: None,
        }
    }

    fn hod_of(dept: &str) -> User {
        User {
            id: format!("u-hod-{dept}"),
            name: format!("HoD of {dept}"),
            role: Role::Hod,
            department_id: Some(dept.to_string()),
        }
    }

    fn submitted_report(dept: &str, period: &str) -> Report {
        let hod = hod_of(dept);
        let mut reports = Vec::new();
        workflow::start_report(&mut reports, &hod, period).unwrap();
        let report = &mut reports[0];
        workflow::toggle_goal(report, "goal-1").unwrap();
        workflow::add_entry(report, &hod, "obj-1-1", EntryStatus::Completed, "done").unwrap();
        workflow::submit(report, &hod, false).unwrap();
        reports.pop().unwrap()
    }

    #[test]
    fn accept_only_from_submitted() {
        let mut reports = vec![submitted_report("dept-1", "2025-01")];
        let id = reports[0].id.clone();

        let err = accept_report(&mut reports, &admin(), &id, false).unwrap_err();
        assert_eq!(err.code, "confirm_required");

        accept_report(&mut reports, &admin(), &id, true).unwrap();
        assert_eq!(reports[0].status, ReportStatus::Accepted);

        // Accepting twice is rejected and changes nothing.
        let err = accept_report(&mut reports, &admin(), &id, true).unwrap_err();
        assert_eq!(err.code, "invalid_transition");
        assert_eq!(reports[0].status, ReportStatus::Accepted);

        let mut drafts = vec![Report::new("dept-2", "2025-01", "u")];
        let draft_id = drafts[0].id.clone();
        let err = accept_report(&mut drafts, &admin(), &draft_id, true).unwrap_err();
        assert_eq!(err.code, "invalid_transition");
    }

    #[test]
    fn revision_reopens_editing() {
        let mut reports = vec![submitted_report("dept-1", "2025-01")];
        let id = reports[0].id.clone();
        request_revision(&mut reports, &admin(), &id, true).unwrap();
        assert_eq!(reports[0].status, ReportStatus::RevisionRequested);
        assert_eq!(reports[0].entries.len(), 1);

        // Department can mutate again.
        let hod = hod_of("dept-1");
        let entry_id = reports[0].entries[0].id.clone();
        let applied = workflow::approve_entry(&mut reports[0], &hod, &entry_id).unwrap();
        assert!(applied);
    }

    #[test]
    fn review_requires_admin_role() {
        let mut reports = vec![submitted_report("dept-1", "2025-01")];
        let id = reports[0].id.clone();
        let err = request_revision(&mut reports, &hod_of("dept-1"), &id, true).unwrap_err();
        assert_eq!(err.code, "permission_denied");
    }

    #[test]
    fn submission_rate_rounds_and_handles_zero() {
        assert_eq!(submission_rate(0, 0), 0);
        assert_eq!(submission_rate(0, 14), 0);
        assert_eq!(submission_rate(14, 14), 100);
        assert_eq!(submission_rate(1, 3), 33);
        assert_eq!(submission_rate(2, 3), 67);
        assert_eq!(submission_rate(1, 8), 13);
    }

    #[test]
    fn overview_counts_submitted_and_accepted() {
        let mut reports = vec![
            submitted_report("dept-1", "2025-01"),
            submitted_report("dept-2", "2025-01"),
            submitted_report("dept-3", "2025-02"),
        ];
        let id = reports[1].id.clone();
        accept_report(&mut reports, &admin(), &id, true).unwrap();

        let ov = overview(&reports, "2025-01");
        assert_eq!(ov.total_departments, catalog::DEPARTMENTS.len());
        assert_eq!(ov.submitted, 2);
        assert_eq!(ov.pending, catalog::DEPARTMENTS.len() - 2);
        assert_eq!(ov.submission_rate, submission_rate(2, catalog::DEPARTMENTS.len()));
        assert_eq!(ov.total_items, 2);
        let row = ov
            .departments
            .iter()
            .find(|d| d.department_id == "dept-4")
            .unwrap();
        assert!(row.status.is_none());
        assert_eq!(row.entry_count, 0);
    }

    #[test]
    fn goal_view_groups_across_departments() {
        let reports = vec![
            submitted_report("dept-1", "2025-01"),
            submitted_report("dept-2", "2025-01"),
        ];
        let groups = goal_view(&reports, "2025-01");
        assert_eq!(groups.len(), catalog::GOALS.len());
        let g1 = groups.iter().find(|g| g.goal_id == "goal-1").unwrap();
        assert_eq!(g1.entries.len(), 2);
        assert!(g1
            .entries
            .iter()
            .any(|e| e.department_name == "Business Communications Unit"));
        let g2 = groups.iter().find(|g| g.goal_id == "goal-2").unwrap();
        assert!(g2.entries.is_empty());
    }
}
