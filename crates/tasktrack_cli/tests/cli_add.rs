use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tasktrack-{nanos}-{file_name}"))
}

fn run(store_path: &PathBuf, args: &[&str]) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_tasktrack");
    Command::new(exe)
        .args(args)
        .env("TASKTRACK_STORE_PATH", store_path)
        .output()
        .expect("failed to run tasktrack")
}

#[test]
fn add_command_succeeds() {
    let store_path = temp_path("cli-add.json");
    let output = run(&store_path, &["add", "demo task"]);

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Added task: demo task (1)"));
}

#[test]
fn add_command_rejects_missing_description() {
    let store_path = temp_path("cli-add-missing.json");
    let output = run(&store_path, &["add"]);

    std::fs::remove_file(&store_path).ok();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}

#[test]
fn add_command_rejects_blank_description() {
    let store_path = temp_path("cli-add-blank.json");
    let output = run(&store_path, &["add", "   "]);

    std::fs::remove_file(&store_path).ok();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}

#[test]
fn add_command_json_reports_new_task() {
    let store_path = temp_path("cli-add-json.json");
    let output = run(&store_path, &["--json", "add", "Buy milk"]);

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("json output");

    assert_eq!(parsed["id"], 1);
    assert_eq!(parsed["description"], "Buy milk");
    assert_eq!(parsed["status"], "todo");
    assert_eq!(parsed["updatedAt"], serde_json::Value::Null);
    assert!(parsed["createdAt"].is_string());
}

#[test]
fn add_command_skips_deleted_ids() {
    let store_path = temp_path("cli-add-id-reuse.json");

    assert!(run(&store_path, &["add", "Task A"]).status.success());
    assert!(run(&store_path, &["add", "Task B"]).status.success());
    assert!(run(&store_path, &["delete", "1"]).status.success());

    let output = run(&store_path, &["--json", "add", "Task C"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    assert_eq!(parsed["id"], 3);
}

#[test]
fn add_command_writes_store_file() {
    let store_path = temp_path("cli-add-store.json");
    let output = run(&store_path, &["add", "persisted"]);

    assert!(output.status.success());
    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store_path).unwrap()).unwrap();
    std::fs::remove_file(&store_path).ok();

    let tasks = stored.as_array().expect("store is a json array");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], 1);
    assert_eq!(tasks[0]["description"], "persisted");
    assert_eq!(tasks[0]["status"], "todo");
}
