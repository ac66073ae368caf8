use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Status state machine ─────────────────────────────────────────────────

/// Lifecycle state of a task as exposed to the external supervisor.
///
/// `starting → running → waiting_for_answer → running → complete | error`;
/// a termination signal forces `error` from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Starting,
    Running,
    WaitingForAnswer,
    Complete,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::WaitingForAnswer => "waiting_for_answer",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// Contents of `status.json`, overwritten in place on every transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: Status,
    pub detail: String,
    pub updated_at: DateTime<Utc>,
    pub pid: u32,
}

/// Contents of `task.json`, written once at bridge start and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskMeta {
    pub task_id: String,
    pub workdir: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

// ── Question / answer artifacts ──────────────────────────────────────────

/// One labeled option offered for a sub-question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub label: String,
}

/// A single sub-question inside an intercepted `AskUserQuestion` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubQuestion {
    pub question: String,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

/// Contents of `question.json`; exists until answered or timed out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub questions: Vec<SubQuestion>,
    pub asked_at: DateTime<Utc>,
}

/// Contents of `answer.json`, written by the external actor.
///
/// Either an explicit question→answer mapping, or a single free-text reply
/// which binds to the first sub-question only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Contents of `result.json`, written exactly once at run termination.
///
/// Every field except the completion timestamp is optional: only whatever
/// subset the underlying session exposed is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_turns: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    pub completed_at: DateTime<Utc>,
}
