use anyhow::{bail, Context};
use rusqlite::Connection;
use std::path::Path;

use crate::model::{EntryStatus, Report, ReportEntry, ReportStatus};

/// Local durable cache for the report collection. The in-memory `Vec` is
/// the authoritative working set; every mutation is committed here before
/// any remote sync is attempted.
pub struct ReportStore {
    conn: Connection,
    reports: Vec<Report>,
}

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("fmsc.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS reports(
            id TEXT PRIMARY KEY,
            department_id TEXT NOT NULL,
            period TEXT NOT NULL,
            status TEXT NOT NULL,
            created_by TEXT NOT NULL,
            submitted_at TEXT,
            selected_goals TEXT NOT NULL,
            revision INTEGER NOT NULL DEFAULT 0,
            UNIQUE(department_id, period)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS report_entries(
            id TEXT PRIMARY KEY,
            report_id TEXT NOT NULL,
            objective_id TEXT NOT NULL,
            status TEXT NOT NULL,
            narrative TEXT NOT NULL,
            metrics TEXT,
            challenges TEXT,
            support_needed TEXT,
            evidence_url TEXT,
            created_at TEXT NOT NULL,
            submitted_by TEXT NOT NULL,
            submitted_by_name TEXT NOT NULL,
            approved_by_hod INTEGER NOT NULL,
            FOREIGN KEY(report_id) REFERENCES reports(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_report_entries_report ON report_entries(report_id)",
        [],
    )?;

    Ok(conn)
}

impl ReportStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        let conn = open_db(workspace)?;
        let reports = load_all(&conn)?;
        Ok(ReportStore { conn, reports })
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// Working copy for the engines to mutate; hand the result back through
    /// `commit`.
    pub fn snapshot(&self) -> Vec<Report> {
        self.reports.clone()
    }

    pub fn find(&self, report_id: &str) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == report_id)
    }

    /// Bulk-set commit: detects the single report whose serialized content
    /// changed, bumps its push revision, persists the whole collection,
    /// then swaps it in as the working set. Returns the changed report for
    /// the sync push, if any.
    pub fn commit(&mut self, mut next: Vec<Report>) -> anyhow::Result<Option<Report>> {
        let changed_id = next
            .iter()
            .find(|candidate| match self.reports.iter().find(|r| r.id == candidate.id) {
                Some(current) => {
                    serde_json::to_value(candidate).ok() != serde_json::to_value(current).ok()
                }
                None => true,
            })
            .map(|r| r.id.clone());

        let mut changed = None;
        if let Some(id) = changed_id {
            if let Some(report) = next.iter_mut().find(|r| r.id == id) {
                report.revision += 1;
                changed = Some(report.clone());
            }
        }

        persist_all(&mut self.conn, &next)?;
        self.reports = next;
        Ok(changed)
    }

    /// Full replacement from a remote snapshot. Revisions come from the
    /// payload untouched; an empty snapshot clears the cache.
    pub fn replace_from_remote(&mut self, reports: Vec<Report>) -> anyhow::Result<()> {
        persist_all(&mut self.conn, &reports)?;
        self.reports = reports;
        Ok(())
    }
}

fn persist_all(conn: &mut Connection, reports: &[Report]) -> anyhow::Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM report_entries", [])?;
    tx.execute("DELETE FROM reports", [])?;

    for report in reports {
        let selected_goals = serde_json::to_string(&report.selected_goals)?;
        tx.execute(
            "INSERT INTO reports(id, department_id, period, status, created_by, submitted_at, selected_goals, revision)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &report.id,
                &report.department_id,
                &report.period,
                report.status.as_str(),
                &report.created_by,
                &report.submitted_at,
                &selected_goals,
                report.revision,
            ),
        )
        .with_context(|| format!("persist report {}", report.id))?;

        for entry in &report.entries {
            tx.execute(
                "INSERT INTO report_entries(
                    id, report_id, objective_id, status, narrative, metrics,
                    challenges, support_needed, evidence_url, created_at,
                    submitted_by, submitted_by_name, approved_by_hod
                 ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    &entry.id,
                    &report.id,
                    &entry.objective_id,
                    entry.status.as_str(),
                    &entry.narrative,
                    &entry.metrics,
                    &entry.challenges,
                    &entry.support_needed,
                    &entry.evidence_url,
                    &entry.created_at,
                    &entry.submitted_by,
                    &entry.submitted_by_name,
                    entry.is_approved_by_hod as i64,
                ],
            )
            .with_context(|| format!("persist entry {}", entry.id))?;
        }
    }

    tx.commit()?;
    Ok(())
}

fn load_all(conn: &Connection) -> anyhow::Result<Vec<Report>> {
    let mut stmt = conn.prepare(
        "SELECT id, department_id, period, status, created_by, submitted_at, selected_goals, revision
         FROM reports ORDER BY period DESC",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, Option<String>>(5)?,
                r.get::<_, String>(6)?,
                r.get::<_, i64>(7)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut reports = Vec::with_capacity(rows.len());
    for (id, department_id, period, status, created_by, submitted_at, selected_goals, revision) in
        rows
    {
        let Some(status) = ReportStatus::parse(&status) else {
            bail!("report {id} has unknown status {status:?}");
        };
        let selected_goals: Vec<String> = serde_json::from_str(&selected_goals)
            .with_context(|| format!("selected_goals of report {id}"))?;
        reports.push(Report {
            id,
            department_id,
            period,
            status,
            created_by,
            submitted_at,
            selected_goals,
            entries: Vec::new(),
            revision,
        });
    }

    let mut stmt = conn.prepare(
        "SELECT id, report_id, objective_id, status, narrative, metrics, challenges,
                support_needed, evidence_url, created_at, submitted_by, submitted_by_name,
                approved_by_hod
         FROM report_entries ORDER BY created_at",
    )?;
    let entry_rows = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, Option<String>>(5)?,
                r.get::<_, Option<String>>(6)?,
                r.get::<_, Option<String>>(7)?,
                r.get::<_, Option<String>>(8)?,
                r.get::<_, String>(9)?,
                r.get::<_, String>(10)?,
                r.get::<_, String>(11)?,
                r.get::<_, i64>(12)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (
        id,
        report_id,
        objective_id,
        status,
        narrative,
        metrics,
        challenges,
        support_needed,
        evidence_url,
        created_at,
        submitted_by,
        submitted_by_name,
        approved_by_hod,
    ) in entry_rows
    {
        let Some(status) = EntryStatus::parse(&status) else {
            bail!("entry {id} has unknown status {status:?}");
        };
        let Some(report) = reports.iter_mut().find(|r| r.id == report_id) else {
            // Defensive: an orphaned entry row is skipped, not fatal.
            continue;
        };
        report.entries.push(ReportEntry {
            id,
            report_id,
            objective_id,
            status,
            narrative,
            metrics,
            challenges,
            support_needed,
            evidence_url,
            created_at,
            submitted_by,
            submitted_by_name,
            is_approved_by_hod: approved_by_hod != 0,
        });
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, User};
    use crate::workflow;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_workspace() -> PathBuf {
        let p = std::env::temp_dir().join(format!(
            "fmscd-db-test-{}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    fn hod() -> User {
        User {
            id: "u-hod".to_string(),
            name: "Dr. Head".to_string(),
            role: Role::Hod,
            department_id: Some("dept-1".to_string()),
        }
    }

    #[test]
    fn commit_detects_the_changed_report_and_bumps_revision() {
        let workspace = temp_workspace();
        let mut store = ReportStore::open(&workspace).unwrap();

        let mut next = store.snapshot();
        workflow::start_report(&mut next, &hod(), "2025-01").unwrap();
        let changed = store.commit(next).unwrap().expect("new report is a change");
        assert_eq!(changed.revision, 1);

        // No-op commit pushes nothing.
        let next = store.snapshot();
        assert!(store.commit(next).unwrap().is_none());

        let mut next = store.snapshot();
        workflow::toggle_goal(&mut next[0], "goal-1").unwrap();
        let changed = store.commit(next).unwrap().expect("goal toggle is a change");
        assert_eq!(changed.revision, 2);
    }

    #[test]
    fn cache_round_trips_across_reopen() {
        let workspace = temp_workspace();
        {
            let mut store = ReportStore::open(&workspace).unwrap();
            let mut next = store.snapshot();
            workflow::start_report(&mut next, &hod(), "2025-01").unwrap();
            workflow::toggle_goal(&mut next[0], "goal-1").unwrap();
            workflow::add_entry(
                &mut next[0],
                &hod(),
                "obj-1-1",
                EntryStatus::Delayed,
                "slow going",
            )
            .unwrap();
            next[0].entries[0].metrics = Some("2 of 5 workshops".to_string());
            store.commit(next).unwrap();
        }

        let store = ReportStore::open(&workspace).unwrap();
        assert_eq!(store.reports().len(), 1);
        let report = &store.reports()[0];
        assert_eq!(report.period, "2025-01");
        assert_eq!(report.selected_goals, vec!["goal-1".to_string()]);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].status, EntryStatus::Delayed);
        assert_eq!(report.entries[0].metrics.as_deref(), Some("2 of 5 workshops"));
        assert!(report.entries[0].is_approved_by_hod);
        assert_eq!(report.revision, 1);
    }

    #[test]
    fn remote_replace_clears_on_empty_snapshot() {
        let workspace = temp_workspace();
        let mut store = ReportStore::open(&workspace).unwrap();
        let mut next = store.snapshot();
        workflow::start_report(&mut next, &hod(), "2025-01").unwrap();
        store.commit(next).unwrap();
        assert_eq!(store.reports().len(), 1);

        store.replace_from_remote(Vec::new()).unwrap();
        assert!(store.reports().is_empty());

        let reopened = ReportStore::open(&workspace).unwrap();
        assert!(reopened.reports().is_empty());
    }
}
