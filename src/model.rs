use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Lecturer,
    Hod,
    Admin,
}

/// Session identity. Roles are self-asserted at login; there is no real
/// authentication behind this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
}

impl User {
    pub fn is_hod(&self) -> bool {
        self.role == Role::Hod
    }

    /// HOD may edit anything in the department report; everyone else only
    /// their own entries.
    pub fn can_edit_entry(&self, entry: &ReportEntry) -> bool {
        self.is_hod() || entry.submitted_by == self.id
    }

    pub fn can_approve(&self) -> bool {
        self.is_hod()
    }

    /// Final submission to the faculty admin is reserved for the HOD.
    pub fn can_submit(&self) -> bool {
        self.is_hod()
    }

    pub fn can_review(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Draft,
    Submitted,
    RevisionRequested,
    Accepted,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Draft => "DRAFT",
            ReportStatus::Submitted => "SUBMITTED",
            ReportStatus::RevisionRequested => "REVISION_REQUESTED",
            ReportStatus::Accepted => "ACCEPTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(ReportStatus::Draft),
            "SUBMITTED" => Some(ReportStatus::Submitted),
            "REVISION_REQUESTED" => Some(ReportStatus::RevisionRequested),
            "ACCEPTED" => Some(ReportStatus::Accepted),
            _ => None,
        }
    }

    /// Department-side edits are only open on a draft or a report sent back
    /// for revision.
    pub fn is_editable(self) -> bool {
        matches!(self, ReportStatus::Draft | ReportStatus::RevisionRequested)
    }

    /// Submitted or accepted; counts toward the submission rate.
    pub fn is_submitted(self) -> bool {
        matches!(self, ReportStatus::Submitted | ReportStatus::Accepted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    #[serde(rename = "Not started")]
    NotStarted,
    #[serde(rename = "In progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Delayed")]
    Delayed,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::NotStarted => "Not started",
            EntryStatus::InProgress => "In progress",
            EntryStatus::Completed => "Completed",
            EntryStatus::Delayed => "Delayed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Not started" => Some(EntryStatus::NotStarted),
            "In progress" => Some(EntryStatus::InProgress),
            "Completed" => Some(EntryStatus::Completed),
            "Delayed" => Some(EntryStatus::Delayed),
            _ => None,
        }
    }
}

/// One department's progress claim against a single objective. Owned by its
/// report; no lifecycle outside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub id: String,
    pub report_id: String,
    pub objective_id: String,
    pub status: EntryStatus,
    pub narrative: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenges: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_needed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_url: Option<String>,
    pub created_at: String,
    pub submitted_by: String,
    pub submitted_by_name: String,
    #[serde(rename = "isApprovedByHOD")]
    pub is_approved_by_hod: bool,
}

/// Unit of work for one department and one calendar period (YYYY-MM).
/// At most one exists per (departmentId, period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub department_id: String,
    pub period: String,
    pub status: ReportStatus,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    pub selected_goals: Vec<String>,
    pub entries: Vec<ReportEntry>,
    /// Monotonic push token: bumped on every committed change so the
    /// persistence adapter can apply last-intended-write-wins on
    /// out-of-order upserts.
    #[serde(default)]
    pub revision: i64,
}

impl Report {
    pub fn new(department_id: &str, period: &str, created_by: &str) -> Self {
        Report {
            id: Uuid::new_v4().to_string(),
            department_id: department_id.to_string(),
            period: period.to_string(),
            status: ReportStatus::Draft,
            created_by: created_by.to_string(),
            submitted_at: None,
            selected_goals: Vec::new(),
            entries: Vec::new(),
            revision: 0,
        }
    }

    pub fn has_goal(&self, goal_id: &str) -> bool {
        self.selected_goals.iter().any(|g| g == goal_id)
    }

    pub fn entry(&self, entry_id: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.id == entry_id)
    }

    pub fn entry_mut(&mut self, entry_id: &str) -> Option<&mut ReportEntry> {
        self.entries.iter_mut().find(|e| e.id == entry_id)
    }

    pub fn unapproved_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_approved_by_hod).count()
    }
}

/// Period strings are plain "YYYY-MM". Anything else is rejected before it
/// can become a report key.
pub fn is_valid_period(period: &str) -> bool {
    let bytes = period.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return false;
    }
    let year = &period[..4];
    let month = &period[5..];
    if !year.chars().all(|c| c.is_ascii_digit()) || !month.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    matches!(month.parse::<u32>(), Ok(1..=12))
}
