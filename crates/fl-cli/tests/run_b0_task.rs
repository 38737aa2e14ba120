//! Exercises the CLI binary end to end against a single-task file: a
//! deterministic Timeout at step 0 under B0 must fail the run and still
//! produce a trace file and an exit code of 0 (the run itself is not an
//! engine failure; only an unreadable task file is).

use std::process::Command;

fn faultline_bin() -> &'static str {
    env!("CARGO_BIN_EXE_faultline")
}

#[test]
fn b0_timeout_task_runs_and_writes_trace() {
    let dir = tempfile::tempdir().unwrap();
    let tasks_path = dir.path().join("tasks.jsonl");
    let task = serde_json::json!({
        "task_id": "cli-b0",
        "initial_world_state": {
            "records": {"REC1": {"status": "pending"}},
            "inventory": {},
            "audit_log": []
        },
        "steps": [
            {"step_idx": 0, "step_name": "get", "tool_name": "get_record", "params": {"record_id": "REC1"}}
        ],
        "fault_injections": [
            {"fault_id": "f0", "step_idx": 0, "kind": "timeout", "probability": 1.0, "mode": "once"}
        ],
        "success_condition": {"record_id": "REC1", "expected_status": "pending"}
    });
    std::fs::write(&tasks_path, format!("{task}\n")).unwrap();

    let memory_path = dir.path().join("memory.json");
    let output = Command::new(faultline_bin())
        .arg("--strategy")
        .arg("b0")
        .arg("--tasks")
        .arg(&tasks_path)
        .arg("--memory")
        .arg(&memory_path)
        .output()
        .expect("failed to run faultline binary");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("faultline run summary"));

    let trace_path = dir.path().join("tasks.trace.jsonl");
    let trace = std::fs::read_to_string(trace_path).unwrap();
    assert!(trace.lines().count() >= 2);
}

#[test]
fn unreadable_task_file_exits_nonzero() {
    let output = Command::new(faultline_bin())
        .arg("--strategy")
        .arg("b0")
        .arg("--tasks")
        .arg("/nonexistent/tasks.jsonl")
        .output()
        .expect("failed to run faultline binary");
    assert!(!output.status.success());
}
