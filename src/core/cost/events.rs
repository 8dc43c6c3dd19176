//! Hook event records
//!
//! One [`HookEvent`] corresponds to one line of the append-only hook log
//! written by the `hook` subcommand. The agent CLI delivers these as JSON on
//! stdin of the hook script; only the fields the cost tracker cares about are
//! kept.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Event kind emitted after a tool finishes
pub const EVENT_POST_TOOL_USE: &str = "PostToolUse";

/// Event kind emitted when the user submits a prompt
pub const EVENT_USER_PROMPT_SUBMIT: &str = "UserPromptSubmit";

/// One normalized hook event.
///
/// `kind` is kept as a string: unknown kinds are a documented no-op for the
/// tracker, not an error, so there is nothing to gain from a closed enum at
/// this boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookEvent {
    /// Event kind ("PostToolUse", "UserPromptSubmit", ...)
    #[serde(rename = "hook_event_name")]
    pub kind: String,
    /// Name of the tool, for tool events
    pub tool_name: Option<String>,
    /// Tool input parameters, for tool events
    pub tool_input: Option<Value>,
    /// Tool response payload, for tool-completion events
    pub tool_response: Option<Value>,
    /// Submitted prompt text, for prompt events
    pub prompt: Option<String>,
}

impl HookEvent {
    /// Parse a single JSON event line. Returns None for malformed input;
    /// the caller decides whether to skip or report.
    pub fn from_json_line(line: &str) -> Option<Self> {
        serde_json::from_str(line.trim()).ok()
    }
}

/// Read a JSONL hook log into a list of events, skipping malformed and
/// empty lines. Returns an empty list when the file is missing.
pub fn read_hook_log<P: AsRef<Path>>(path: P) -> Vec<HookEvent> {
    let path = path.as_ref();

    if !path.exists() {
        return Vec::new();
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return Vec::new(),
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| HookEvent::from_json_line(&l))
        .collect()
}
