use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::store::{TaskStore, ANSWER_FILE, QUESTION_FILE};
use crate::types::{AnswerRecord, QuestionRecord, Status, SubQuestion};

/// Recheck interval while waiting for an external answer.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Give up waiting and substitute defaults after this long.
pub const ANSWER_TIMEOUT: Duration = Duration::from_secs(600);
/// Default answer for a sub-question that offers no options.
pub const NO_PREFERENCE: &str = "No preference";

/// Everything the interception callback needs to relay one question set,
/// passed explicitly at construction time.
#[derive(Debug, Clone)]
pub struct RelayContext {
    pub store: TaskStore,
    pub poll_interval: Duration,
    pub answer_timeout: Duration,
}

impl RelayContext {
    pub fn new(store: TaskStore) -> Self {
        Self {
            store,
            poll_interval: POLL_INTERVAL,
            answer_timeout: ANSWER_TIMEOUT,
        }
    }
}

/// Relay a question set to the external actor and block until an answer
/// artifact appears or the deadline passes.
///
/// The question is persisted atomically, status moves to
/// `waiting_for_answer`, and the task directory is polled on a cooperative
/// sleep cycle. Both artifacts are deleted before returning, on every path,
/// so a later question can never observe a stale exchange. A timed-out wait
/// resolves to default answers rather than an error — the run never
/// deadlocks on an unanswered question.
pub async fn resolve_answers(
    ctx: &RelayContext,
    questions: &[SubQuestion],
) -> Result<BTreeMap<String, String>> {
    // Status moves first so a reader that sees the question artifact always
    // sees `waiting_for_answer` alongside it.
    ctx.store
        .set_status(Status::WaitingForAnswer, "Agent is asking a clarifying question")?;
    ctx.store.write_json_atomic(
        QUESTION_FILE,
        &QuestionRecord {
            questions: questions.to_vec(),
            asked_at: Utc::now(),
        },
    )?;

    // A leftover answer from a previous question must not satisfy this one.
    ctx.store.remove(ANSWER_FILE);

    info!(questions = questions.len(), "waiting for external answer");
    let deadline = tokio::time::Instant::now() + ctx.answer_timeout;

    loop {
        if ctx.store.exists(ANSWER_FILE) {
            let record: AnswerRecord = ctx.store.read_json(ANSWER_FILE).unwrap_or_default();
            ctx.store.remove(QUESTION_FILE);
            ctx.store.remove(ANSWER_FILE);
            ctx.store.set_status(Status::Running, "Received answer, continuing")?;
            return Ok(bind_answer(questions, record));
        }

        if tokio::time::Instant::now() >= deadline {
            ctx.store.remove(QUESTION_FILE);
            ctx.store.remove(ANSWER_FILE);
            ctx.store
                .set_status(Status::Running, "Answer timed out, continuing with default")?;
            warn!(timeout = ?ctx.answer_timeout, "answer wait timed out, substituting defaults");
            return Ok(default_answers(questions));
        }

        tokio::time::sleep(ctx.poll_interval).await;
    }
}

/// Map an answer artifact onto the question set.
///
/// An explicit mapping is used verbatim. A bare free-text reply binds to the
/// first sub-question only; later sub-questions stay unanswered. Malformed
/// or empty content yields an empty mapping.
pub fn bind_answer(
    questions: &[SubQuestion],
    record: AnswerRecord,
) -> BTreeMap<String, String> {
    if let Some(answers) = record.answers {
        return answers;
    }
    let mut out = BTreeMap::new();
    if let (Some(text), Some(first)) = (record.text, questions.first()) {
        out.insert(first.question.clone(), text);
    }
    out
}

/// Synthesize the defaults used when the wait times out: the first listed
/// option's label per sub-question, or the fixed placeholder when a
/// sub-question has no options.
pub fn default_answers(questions: &[SubQuestion]) -> BTreeMap<String, String> {
    questions
        .iter()
        .map(|q| {
            let answer = q
                .options
                .first()
                .map(|o| o.label.clone())
                .unwrap_or_else(|| NO_PREFERENCE.to_string());
            (q.question.clone(), answer)
        })
        .collect()
}
