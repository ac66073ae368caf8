use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Decision returned by a gate for one tool invocation.
#[derive(Debug, Clone)]
pub enum GateDecision {
    /// Let the tool run, with a possibly rewritten input payload.
    Allow { updated_input: Value },
    /// Refuse the tool call.
    Deny { message: String },
}

/// Interception seam for tool permission checks.
///
/// The bridge installs a gate that relays `AskUserQuestion` to an external
/// actor and waves everything else through unchanged. A gate may suspend for
/// as long as it needs — the session blocks on the decision.
#[async_trait]
pub trait ToolGate: Send + Sync {
    async fn check(&self, tool_name: &str, input: Value) -> Result<GateDecision>;
}

/// Side-channel consumer of assistant output during a run.
pub trait SessionObserver: Send {
    /// A text fragment produced by the assistant.
    fn on_text(&mut self, text: &str);

    /// A tool invocation surfaced in the assistant's turn.
    fn on_tool_use(&mut self, name: &str);
}
