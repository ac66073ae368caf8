use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use clap::Parser;
use serde_json::Value;
use tracing::{error, info};

use relay_agent::claude::ClaudeSession;
use relay_agent::gate::{GateDecision, SessionObserver, ToolGate};
use relay_core::config::Config;
use relay_core::relay::{self, RelayContext};
use relay_core::store::TaskStore;
use relay_core::types::{ResultRecord, Status, SubQuestion, TaskMeta};

/// The one tool whose invocations are relayed instead of auto-approved.
const ASK_USER_QUESTION: &str = "AskUserQuestion";

/// Run one agent task, relaying its questions to an external supervisor
/// through the task's artifact directory.
#[derive(Parser)]
#[command(name = "bridge")]
struct Args {
    /// Unique task identifier.
    #[arg(long)]
    task_id: String,

    /// Working directory for the agent session.
    #[arg(long)]
    workdir: String,

    /// Prompt to send.
    #[arg(long)]
    prompt: String,
}

/// Intercepts `AskUserQuestion` and blocks on the external answer; every
/// other tool passes through with its input unchanged.
struct RelayGate {
    ctx: RelayContext,
}

#[async_trait]
impl ToolGate for RelayGate {
    async fn check(&self, tool_name: &str, input: Value) -> Result<GateDecision> {
        if tool_name != ASK_USER_QUESTION {
            return Ok(GateDecision::Allow {
                updated_input: input,
            });
        }

        let raw_questions = input
            .get("questions")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        let questions: Vec<SubQuestion> =
            serde_json::from_value(raw_questions.clone()).unwrap_or_default();

        let answers = relay::resolve_answers(&self.ctx, &questions).await?;

        Ok(GateDecision::Allow {
            updated_input: serde_json::json!({
                "questions": raw_questions,
                "answers": answers,
            }),
        })
    }
}

/// Appends assistant text and tool markers to the task's output log.
struct LogObserver {
    store: TaskStore,
}

impl SessionObserver for LogObserver {
    fn on_text(&mut self, text: &str) {
        if let Err(e) = self.store.append_log(&format!("{text}\n")) {
            error!("appending output log: {e}");
        }
    }

    fn on_tool_use(&mut self, name: &str) {
        if let Err(e) = self.store.append_log(&format!("[Tool: {name}]\n")) {
            error!("appending output log: {e}");
        }
    }
}

enum Outcome {
    Finished(Result<()>),
    Terminated,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let store = TaskStore::create(&config.tasks_dir(), &args.task_id)?;
    store.write_pid()?;
    store.write_task_meta(&TaskMeta {
        task_id: args.task_id.clone(),
        workdir: args.workdir.clone(),
        prompt: args.prompt.clone(),
        created_at: Utc::now(),
    })?;
    store.set_status(Status::Starting, "Initializing agent session")?;
    store.touch_log()?;

    let outcome = tokio::select! {
        res = run_task(&config, &store, &args) => Outcome::Finished(res),
        _ = terminate_signal() => Outcome::Terminated,
    };

    match outcome {
        Outcome::Terminated => {
            store
                .set_status(Status::Error, "Process terminated by signal")
                .ok();
            info!(task_id = %args.task_id, "terminated by signal");
            std::process::exit(1);
        }
        Outcome::Finished(Err(e)) => {
            store.set_status(Status::Error, &format!("{e:#}")).ok();
            store.append_log(&format!("\n[BRIDGE ERROR] {e:#}\n")).ok();
            Err(e)
        }
        Outcome::Finished(Ok(())) => Ok(()),
    }
}

async fn run_task(config: &Config, store: &TaskStore, args: &Args) -> Result<()> {
    let gate = RelayGate {
        ctx: RelayContext {
            store: store.clone(),
            poll_interval: Duration::from_secs(config.poll_interval_s),
            answer_timeout: Duration::from_secs(config.answer_timeout_s),
        },
    };
    let mut observer = LogObserver {
        store: store.clone(),
    };

    let session = ClaudeSession::new(config.claude_bin.clone(), args.workdir.clone())
        .with_model(config.model.clone())
        .with_permission_mode(config.permission_mode.clone());

    store.set_status(Status::Running, "Agent session active")?;
    let result = session.run(&args.prompt, &gate, &mut observer).await?;

    store.write_result(&ResultRecord {
        subtype: result.subtype.clone(),
        result: result.result.clone(),
        session_id: result.session_id.clone(),
        num_turns: result.num_turns,
        total_cost_usd: result.total_cost_usd,
        is_error: Some(result.is_error),
        completed_at: Utc::now(),
    })?;

    if result.is_error {
        store.set_status(Status::Error, "Agent session reported an error")?;
    } else {
        store.set_status(Status::Complete, "Task finished successfully")?;
    }
    Ok(())
}

/// Resolves when SIGTERM arrives.
async fn terminate_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            term.recv().await;
        }
        Err(e) => {
            error!("installing SIGTERM handler: {e}");
            std::future::pending::<()>().await;
        }
    }
}
