use std::process::Stdio;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

use crate::event::{self, AgentEvent, ContentBlock, ControlRequestEvent, ResultEvent};
use crate::gate::{GateDecision, SessionObserver, ToolGate};

/// Outcome of a completed session.
#[derive(Debug, Clone, Default)]
pub struct SessionResult {
    pub subtype: Option<String>,
    pub result: Option<String>,
    pub session_id: Option<String>,
    pub num_turns: Option<u64>,
    pub total_cost_usd: Option<f64>,
    pub is_error: bool,
}

/// Runs Claude Code as a subprocess in bidirectional stream-json mode.
///
/// The prompt goes in as a single NDJSON user message on stdin; events come
/// back on stdout. Permission checks arrive as `control_request` events and
/// are answered through the installed [`ToolGate`].
pub struct ClaudeSession {
    /// Path to the `claude` CLI binary.
    pub claude_bin: String,
    /// Working directory for the agent run.
    pub workdir: String,
    /// Model override. Empty = CLI default.
    pub model: String,
    /// Permission mode for tools the gate waves through.
    pub permission_mode: String,
}

impl ClaudeSession {
    pub fn new(claude_bin: impl Into<String>, workdir: impl Into<String>) -> Self {
        Self {
            claude_bin: claude_bin.into(),
            workdir: workdir.into(),
            model: String::new(),
            permission_mode: "acceptEdits".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_permission_mode(mut self, mode: impl Into<String>) -> Self {
        self.permission_mode = mode.into();
        self
    }

    /// Drive one run to completion.
    ///
    /// Blocks until the CLI emits its result event or exits. Assistant text
    /// and tool invocations are forwarded to `observer` as they stream in.
    pub async fn run(
        &self,
        prompt: &str,
        gate: &dyn ToolGate,
        observer: &mut dyn SessionObserver,
    ) -> Result<SessionResult> {
        let mut args: Vec<String> = vec![
            "--input-format".into(),
            "stream-json".into(),
            "--output-format".into(),
            "stream-json".into(),
            "--verbose".into(),
            "--permission-prompt-tool".into(),
            "stdio".into(),
            "--permission-mode".into(),
            self.permission_mode.clone(),
        ];
        if !self.model.is_empty() {
            args.push("--model".into());
            args.push(self.model.clone());
        }

        info!(workdir = %self.workdir, "spawning claude subprocess");

        let mut child = Command::new(&self.claude_bin)
            .args(&args)
            .current_dir(&self.workdir)
            .kill_on_drop(true)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn claude: {}", self.claude_bin))?;

        let mut stdin = child.stdin.take().context("failed to take stdin")?;
        let stdout = child.stdout.take().context("failed to take stdout")?;
        let stderr = child.stderr.take().context("failed to take stderr")?;

        let opening = event::user_message(prompt).to_string();
        stdin
            .write_all(format!("{opening}\n").as_bytes())
            .await
            .context("writing prompt")?;
        stdin.flush().await.context("flushing prompt")?;

        let mut stdout_lines = BufReader::new(stdout).lines();
        let mut stderr_lines = BufReader::new(stderr).lines();

        let mut assistant_text = String::new();
        let mut session_id: Option<String> = None;
        let mut final_event: Option<ResultEvent> = None;

        loop {
            tokio::select! {
                line = stdout_lines.next_line() => {
                    let Some(line) = line.context("error reading stdout")? else { break };
                    if line.is_empty() {
                        continue;
                    }
                    let evt: AgentEvent = match serde_json::from_str(&line) {
                        Ok(e) => e,
                        Err(_) => continue,
                    };
                    match evt {
                        AgentEvent::System(e) => {
                            if let Some(sid) = e.session_id {
                                session_id = Some(sid);
                            }
                        }
                        AgentEvent::Assistant(e) => {
                            for block in e.message.and_then(|m| m.content).unwrap_or_default() {
                                match block {
                                    ContentBlock::Text { text } => {
                                        if !assistant_text.is_empty() {
                                            assistant_text.push('\n');
                                        }
                                        assistant_text.push_str(&text);
                                        observer.on_text(&text);
                                    }
                                    ContentBlock::ToolUse { name, .. } => {
                                        observer.on_tool_use(&name);
                                    }
                                    _ => {}
                                }
                            }
                        }
                        AgentEvent::ControlRequest(req) => {
                            let response = answer_control_request(req, gate).await?;
                            stdin
                                .write_all(format!("{response}\n").as_bytes())
                                .await
                                .context("writing control response")?;
                            stdin.flush().await.context("flushing control response")?;
                        }
                        AgentEvent::Result(e) => {
                            if let Some(sid) = &e.session_id {
                                session_id = Some(sid.clone());
                            }
                            final_event = Some(e);
                            break;
                        }
                        _ => {}
                    }
                }
                line = stderr_lines.next_line() => {
                    if let Ok(Some(l)) = line {
                        if !l.is_empty() {
                            warn!("claude stderr: {}", l);
                        }
                    }
                }
            }
        }

        drop(stdin);
        let status = child.wait().await.context("failed to wait for claude")?;

        while let Ok(Some(l)) = stderr_lines.next_line().await {
            if !l.is_empty() {
                warn!("claude stderr: {}", l);
            }
        }

        if final_event.is_none() && !status.success() {
            anyhow::bail!("claude exited with {status} before emitting a result");
        }

        let mut out = SessionResult {
            session_id,
            ..SessionResult::default()
        };
        if let Some(e) = final_event {
            out.subtype = e.subtype;
            out.num_turns = e.num_turns;
            out.total_cost_usd = e.total_cost_usd;
            out.is_error = e.is_error.unwrap_or(false);
            out.result = e.result.filter(|r| !r.is_empty());
        }
        // Fall back to collected assistant text if the result carried none.
        if out.result.is_none() && !assistant_text.is_empty() {
            out.result = Some(assistant_text);
        }

        info!(
            session_id = ?out.session_id,
            is_error = out.is_error,
            num_turns = ?out.num_turns,
            "claude subprocess finished"
        );

        Ok(out)
    }
}

/// Build the wire response for one control request.
async fn answer_control_request(
    req: ControlRequestEvent,
    gate: &dyn ToolGate,
) -> Result<Value> {
    let subtype = req.request.subtype.as_deref().unwrap_or("");
    if subtype != "can_use_tool" {
        // Other control subtypes (interrupt acks etc.) just succeed.
        return Ok(event::allow_response(&req.request_id, req.request.input));
    }

    let tool_name = req.request.tool_name.as_deref().unwrap_or("");
    match gate.check(tool_name, req.request.input.clone()).await? {
        GateDecision::Allow { updated_input } => {
            Ok(event::allow_response(&req.request_id, updated_input))
        }
        GateDecision::Deny { message } => Ok(event::deny_response(&req.request_id, &message)),
    }
}
