use uuid::Uuid;

use crate::catalog;
use crate::model::{Role, User};
use crate::workflow::{Step, WorkflowError};

/// Explicit session context: the signed-in user plus the workflow position.
/// Created on login, torn down on logout; nothing about the current actor
/// lives outside this object.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub report_id: Option<String>,
    pub step: Step,
}

impl Session {
    pub fn new(user: User) -> Self {
        Session {
            user,
            report_id: None,
            step: Step::PeriodSelect,
        }
    }

    pub fn open_report(&mut self, report_id: &str, step: Step) {
        self.report_id = Some(report_id.to_string());
        self.step = step;
    }

    pub fn close_report(&mut self) {
        self.report_id = None;
        self.step = Step::PeriodSelect;
    }
}

/// Stub local-only login. Roles are self-asserted; the only validation is
/// structural: department roles need a known department, the admin has no
/// department scope at all.
pub fn login(
    name: Option<&str>,
    role: Role,
    department_id: Option<&str>,
) -> Result<User, WorkflowError> {
    let department_id = match role {
        Role::Admin => {
            if department_id.is_some() {
                return Err(WorkflowError::new(
                    "bad_params",
                    "admin sessions are not scoped to a department",
                ));
            }
            None
        }
        Role::Hod | Role::Lecturer => {
            let id = department_id.ok_or_else(|| {
                WorkflowError::new("bad_params", "department roles require departmentId")
            })?;
            if catalog::department(id).is_none() {
                return Err(WorkflowError::new("not_found", "unknown department")
                    .with_details(serde_json::json!({ "departmentId": id })));
            }
            Some(id.to_string())
        }
    };

    let name = match name {
        Some(n) if !n.trim().is_empty() => n.trim().to_string(),
        _ => default_name(role, department_id.as_deref()),
    };

    Ok(User {
        id: Uuid::new_v4().to_string(),
        name,
        role,
        department_id,
    })
}

fn default_name(role: Role, department_id: Option<&str>) -> String {
    match role {
        Role::Admin => "Dean Office Admin".to_string(),
        _ => {
            let dept = department_id
                .and_then(catalog::department)
                .map(|d| d.name)
                .unwrap_or("Unknown Department");
            match role {
                Role::Hod => format!("HoD of {dept}"),
                _ => format!("Lecturer, {dept}"),
            }
        }
    }
}
