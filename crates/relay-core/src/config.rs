use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;

/// Bridge configuration. Everything comes from the environment or a local
/// `.env` file; the skill CLIs take no configuration at all.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root for per-task durable directories.
    pub bridge_home: PathBuf,
    /// Path to the `claude` CLI binary.
    pub claude_bin: String,
    /// Model override passed to the CLI. Empty = CLI default.
    pub model: String,
    /// Permission mode for tools that are not relayed.
    pub permission_mode: String,
    pub poll_interval_s: u64,
    pub answer_timeout_s: u64,
}

fn parse_dotenv() -> HashMap<String, String> {
    let mut map = HashMap::new();
    let Ok(contents) = std::fs::read_to_string(".env") else {
        return map;
    };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            map.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
    map
}

fn get(key: &str, dotenv: &HashMap<String, String>) -> Option<String> {
    std::env::var(key).ok().or_else(|| dotenv.get(key).cloned())
}

fn get_str(key: &str, dotenv: &HashMap<String, String>, default: &str) -> String {
    get(key, dotenv).unwrap_or_else(|| default.to_string())
}

fn get_u64(key: &str, dotenv: &HashMap<String, String>, default: u64) -> u64 {
    get(key, dotenv)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn resolve_tilde(path: &str) -> String {
    if path.starts_with("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{}/{}", home, path.strip_prefix("~/").unwrap_or(path));
        }
    }
    path.to_string()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let dotenv = parse_dotenv();

        let home = std::env::var("HOME").unwrap_or_default();
        let default_home = format!("{home}/.claude-bridge");
        let bridge_home = resolve_tilde(&get_str("RELAY_HOME", &dotenv, &default_home));

        Ok(Config {
            bridge_home: PathBuf::from(bridge_home),
            claude_bin: get_str("CLAUDE_BIN", &dotenv, "claude"),
            model: get_str("MODEL", &dotenv, ""),
            permission_mode: get_str("PERMISSION_MODE", &dotenv, "acceptEdits"),
            poll_interval_s: get_u64("POLL_INTERVAL_S", &dotenv, 2),
            answer_timeout_s: get_u64("ANSWER_TIMEOUT_S", &dotenv, 600),
        })
    }

    /// Directory holding every task's artifact directory.
    pub fn tasks_dir(&self) -> PathBuf {
        self.bridge_home.join("tasks")
    }
}
