use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::types::{ResultRecord, Status, StatusRecord, TaskMeta};

pub const TASK_FILE: &str = "task.json";
pub const STATUS_FILE: &str = "status.json";
pub const QUESTION_FILE: &str = "question.json";
pub const ANSWER_FILE: &str = "answer.json";
pub const OUTPUT_LOG: &str = "output.log";
pub const RESULT_FILE: &str = "result.json";
pub const PID_FILE: &str = "bridge.pid";

/// Handle to one task's durable directory.
///
/// Every artifact the bridge exchanges with the external supervisor lives
/// here. Exactly one process owns the directory at a time, so the atomic
/// tmp+rename write is the only concurrency-safety mechanism needed.
#[derive(Debug, Clone)]
pub struct TaskStore {
    dir: PathBuf,
}

impl TaskStore {
    /// Open (creating if needed) the directory for `task_id` under `tasks_root`.
    pub fn create(tasks_root: &Path, task_id: &str) -> Result<Self> {
        let dir = tasks_root.join(task_id);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating task dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Wrap an existing directory without creating anything.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Serialize `value` to `<name>.tmp`, then rename into place, so a
    /// concurrent reader never observes a partially written artifact.
    pub fn write_json_atomic<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.path(name);
        let tmp = self.dir.join(format!("{name}.tmp"));
        let data = serde_json::to_vec_pretty(value)?;
        std::fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("renaming {} into place", tmp.display()))?;
        Ok(())
    }

    /// Read and parse a JSON artifact. Returns `None` when the file is
    /// absent or unparseable — malformed IPC content is tolerated, never
    /// fatal.
    pub fn read_json<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let contents = std::fs::read_to_string(self.path(name)).ok()?;
        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("malformed artifact {name}: {e}");
                None
            }
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    /// Remove an artifact, ignoring absence.
    pub fn remove(&self, name: &str) {
        let _ = std::fs::remove_file(self.path(name));
    }

    /// Overwrite `status.json` with a new state tag and detail line.
    pub fn set_status(&self, status: Status, detail: &str) -> Result<()> {
        self.write_json_atomic(
            STATUS_FILE,
            &StatusRecord {
                status,
                detail: detail.to_string(),
                updated_at: Utc::now(),
                pid: std::process::id(),
            },
        )
    }

    pub fn read_status(&self) -> Option<StatusRecord> {
        self.read_json(STATUS_FILE)
    }

    pub fn write_task_meta(&self, meta: &TaskMeta) -> Result<()> {
        self.write_json_atomic(TASK_FILE, meta)
    }

    pub fn write_result(&self, result: &ResultRecord) -> Result<()> {
        self.write_json_atomic(RESULT_FILE, result)
    }

    pub fn write_pid(&self) -> Result<()> {
        std::fs::write(self.path(PID_FILE), std::process::id().to_string())
            .context("writing pid marker")
    }

    /// Append a text fragment to the output log verbatim.
    pub fn append_log(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(OUTPUT_LOG))
            .context("opening output log")?;
        file.write_all(text.as_bytes()).context("appending output log")
    }

    /// Make sure `output.log` exists even when the run produces no output.
    pub fn touch_log(&self) -> Result<()> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(OUTPUT_LOG))
            .map(|_| ())
            .context("creating output log")
    }
}
