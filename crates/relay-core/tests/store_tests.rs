// Tests for the per-task artifact directory: atomic writes, status
// transitions, and the append-only output log.

use chrono::Utc;
use tempfile::TempDir;

use relay_core::store::{TaskStore, OUTPUT_LOG, PID_FILE, STATUS_FILE};
use relay_core::types::{ResultRecord, Status, TaskMeta};

fn store(dir: &TempDir) -> TaskStore {
    TaskStore::create(dir.path(), "task-1").unwrap()
}

#[test]
fn create_makes_the_task_directory() {
    let dir = TempDir::new().unwrap();
    let s = store(&dir);
    assert!(s.dir().is_dir());
    assert_eq!(s.dir(), dir.path().join("task-1"));
}

#[test]
fn write_json_atomic_leaves_no_tmp_file() {
    let dir = TempDir::new().unwrap();
    let s = store(&dir);
    s.set_status(Status::Starting, "boot").unwrap();

    assert!(s.exists(STATUS_FILE));
    assert!(!s.path(&format!("{STATUS_FILE}.tmp")).exists());
}

#[test]
fn set_status_overwrites_in_place() {
    let dir = TempDir::new().unwrap();
    let s = store(&dir);

    s.set_status(Status::Starting, "boot").unwrap();
    s.set_status(Status::Running, "active").unwrap();

    let record = s.read_status().unwrap();
    assert_eq!(record.status, Status::Running);
    assert_eq!(record.detail, "active");
    assert_eq!(record.pid, std::process::id());
}

#[test]
fn status_tags_serialize_snake_case() {
    let dir = TempDir::new().unwrap();
    let s = store(&dir);
    s.set_status(Status::WaitingForAnswer, "").unwrap();

    let raw = std::fs::read_to_string(s.path(STATUS_FILE)).unwrap();
    assert!(raw.contains("\"waiting_for_answer\""));
}

#[test]
fn status_terminal_states() {
    assert!(Status::Complete.is_terminal());
    assert!(Status::Error.is_terminal());
    assert!(!Status::Running.is_terminal());
    assert!(!Status::WaitingForAnswer.is_terminal());
}

#[test]
fn append_log_is_append_only() {
    let dir = TempDir::new().unwrap();
    let s = store(&dir);

    s.append_log("first\n").unwrap();
    s.append_log("[Tool: Bash]\n").unwrap();

    let contents = std::fs::read_to_string(s.path(OUTPUT_LOG)).unwrap();
    assert_eq!(contents, "first\n[Tool: Bash]\n");
}

#[test]
fn touch_log_preserves_existing_content() {
    let dir = TempDir::new().unwrap();
    let s = store(&dir);

    s.append_log("kept\n").unwrap();
    s.touch_log().unwrap();

    let contents = std::fs::read_to_string(s.path(OUTPUT_LOG)).unwrap();
    assert_eq!(contents, "kept\n");
}

#[test]
fn read_json_missing_returns_none() {
    let dir = TempDir::new().unwrap();
    let s = store(&dir);
    assert!(s.read_json::<TaskMeta>("task.json").is_none());
}

#[test]
fn read_json_malformed_returns_none() {
    let dir = TempDir::new().unwrap();
    let s = store(&dir);
    std::fs::write(s.path("task.json"), "{ truncated").unwrap();
    assert!(s.read_json::<TaskMeta>("task.json").is_none());
}

#[test]
fn remove_is_noop_when_absent() {
    let dir = TempDir::new().unwrap();
    let s = store(&dir);
    s.remove("answer.json");
}

#[test]
fn write_pid_records_current_process() {
    let dir = TempDir::new().unwrap();
    let s = store(&dir);
    s.write_pid().unwrap();

    let raw = std::fs::read_to_string(s.path(PID_FILE)).unwrap();
    assert_eq!(raw, std::process::id().to_string());
}

#[test]
fn task_meta_round_trips() {
    let dir = TempDir::new().unwrap();
    let s = store(&dir);
    let meta = TaskMeta {
        task_id: "task-1".to_string(),
        workdir: "/tmp/work".to_string(),
        prompt: "do the thing".to_string(),
        created_at: Utc::now(),
    };
    s.write_task_meta(&meta).unwrap();

    let back: TaskMeta = s.read_json("task.json").unwrap();
    assert_eq!(back.task_id, meta.task_id);
    assert_eq!(back.workdir, meta.workdir);
    assert_eq!(back.prompt, meta.prompt);
}

#[test]
fn result_record_skips_absent_fields() {
    let dir = TempDir::new().unwrap();
    let s = store(&dir);
    s.write_result(&ResultRecord {
        subtype: Some("success".to_string()),
        result: None,
        session_id: None,
        num_turns: None,
        total_cost_usd: None,
        is_error: Some(false),
        completed_at: Utc::now(),
    })
    .unwrap();

    let raw = std::fs::read_to_string(s.path("result.json")).unwrap();
    assert!(raw.contains("\"subtype\""));
    assert!(!raw.contains("\"session_id\""));
    assert!(!raw.contains("\"num_turns\""));
}
