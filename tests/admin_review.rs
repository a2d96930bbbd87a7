use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_fmscd");
    let mut child = Command::new(exe)
        .env_remove("FMSCD_API_BASE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn fmscd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

/// Submit a one-entry report for a department as its HOD, returning the
/// report id.
fn submit_department_report(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    seq: &mut u32,
    dept: &str,
    objective: &str,
    goal: &str,
) -> String {
    let mut next = |stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>, method: &str, params: serde_json::Value| {
        *seq += 1;
        request_ok(stdin, reader, &seq.to_string(), method, params)
    };
    let _ = next(stdin, reader, "session.login", json!({ "role": "HOD", "departmentId": dept }));
    let started = next(stdin, reader, "report.start", json!({ "period": "2025-05" }));
    let report_id = started["reportId"].as_str().expect("reportId").to_string();
    let _ = next(stdin, reader, "report.toggleGoal", json!({ "goalId": goal }));
    let _ = next(
        stdin,
        reader,
        "report.addEntry",
        json!({ "objectiveId": objective, "status": "Completed", "narrative": "done" }),
    );
    let _ = next(stdin, reader, "report.submit", json!({}));
    let _ = next(stdin, reader, "session.logout", json!({}));
    report_id
}

#[test]
fn overview_goal_view_and_accept_transitions() {
    let workspace = temp_dir("fmscd-admin");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let mut seq: u32 = 0;

    seq += 1;
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let first = submit_department_report(&mut stdin, &mut reader, &mut seq, "dept-1", "obj-1-1", "goal-1");
    let second = submit_department_report(&mut stdin, &mut reader, &mut seq, "dept-2", "obj-1-2", "goal-1");

    // A third department leaves a draft only.
    seq += 1;
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "session.login",
        json!({ "role": "HOD", "departmentId": "dept-3" }),
    );
    seq += 1;
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "report.start",
        json!({ "period": "2025-05" }),
    );
    seq += 1;
    let _ = request_ok(&mut stdin, &mut reader, &seq.to_string(), "session.logout", json!({}));

    // Department roles cannot reach the review surface.
    seq += 1;
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "session.login",
        json!({ "role": "LECTURER", "departmentId": "dept-1" }),
    );
    seq += 1;
    let denied = request(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "admin.overview",
        json!({ "period": "2025-05" }),
    );
    assert_eq!(denied["error"]["code"].as_str(), Some("permission_denied"));
    seq += 1;
    let _ = request_ok(&mut stdin, &mut reader, &seq.to_string(), "session.logout", json!({}));

    seq += 1;
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "session.login",
        json!({ "role": "ADMIN" }),
    );

    // Admins own no department report flow.
    seq += 1;
    let no_start = request(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "report.start",
        json!({ "period": "2025-05" }),
    );
    assert_eq!(no_start["error"]["code"].as_str(), Some("permission_denied"));

    seq += 1;
    let overview = request_ok(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "admin.overview",
        json!({ "period": "2025-05" }),
    );
    assert_eq!(overview["totalDepartments"].as_u64(), Some(14));
    assert_eq!(overview["submitted"].as_u64(), Some(2));
    assert_eq!(overview["pending"].as_u64(), Some(12));
    // round(100 * 2 / 14) = 14
    assert_eq!(overview["submissionRate"].as_i64(), Some(14));
    assert_eq!(overview["totalItems"].as_u64(), Some(2));
    let rows = overview["departments"].as_array().expect("departments");
    assert_eq!(rows.len(), 14);
    let dept3 = rows
        .iter()
        .find(|r| r["departmentId"].as_str() == Some("dept-3"))
        .expect("dept-3 row");
    assert_eq!(dept3["status"].as_str(), Some("DRAFT"));

    seq += 1;
    let goal_view = request_ok(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "admin.goalView",
        json!({ "period": "2025-05" }),
    );
    let goals = goal_view["goals"].as_array().expect("goals");
    assert_eq!(goals.len(), 7);
    let goal1 = goals
        .iter()
        .find(|g| g["goalId"].as_str() == Some("goal-1"))
        .expect("goal-1 group");
    assert_eq!(goal1["entries"].as_array().map(|e| e.len()), Some(2));

    // Accept: confirmation gate, then terminal.
    seq += 1;
    let unconfirmed = request(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "admin.accept",
        json!({ "reportId": first }),
    );
    assert_eq!(unconfirmed["error"]["code"].as_str(), Some("confirm_required"));

    seq += 1;
    let accepted = request_ok(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "admin.accept",
        json!({ "reportId": first, "confirm": true }),
    );
    assert_eq!(accepted["status"].as_str(), Some("ACCEPTED"));

    seq += 1;
    let twice = request(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "admin.accept",
        json!({ "reportId": first, "confirm": true }),
    );
    assert_eq!(twice["error"]["code"].as_str(), Some("invalid_transition"));

    // Accepted still counts as submitted in the rate.
    seq += 1;
    let after = request_ok(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "admin.overview",
        json!({ "period": "2025-05" }),
    );
    assert_eq!(after["submitted"].as_u64(), Some(2));

    // Revision only applies to submitted reports.
    seq += 1;
    let revise_accepted = request(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "admin.requestRevision",
        json!({ "reportId": first, "confirm": true }),
    );
    assert_eq!(
        revise_accepted["error"]["code"].as_str(),
        Some("invalid_transition")
    );

    seq += 1;
    let revised = request_ok(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "admin.requestRevision",
        json!({ "reportId": second, "confirm": true }),
    );
    assert_eq!(revised["status"].as_str(), Some("REVISION_REQUESTED"));

    // The admin archive view spans departments.
    seq += 1;
    let listing = request_ok(
        &mut stdin,
        &mut reader,
        &seq.to_string(),
        "reports.list",
        json!({ "period": "2025-05" }),
    );
    assert_eq!(listing["reports"].as_array().map(|r| r.len()), Some(3));
}
