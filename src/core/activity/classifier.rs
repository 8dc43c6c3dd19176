//! Activity state classification
//!
//! Maps a [`SessionSnapshot`] to a single [`ActivityState`] plus a short
//! human-readable detail string. All rendering keys off this one label.
//!
//! The evaluation order below IS the algorithm - signals are checked by
//! priority and the first match wins:
//!
//! 1. Context pressure (>= 90% of the window used)
//! 2. Running subagent
//! 3. Running tool, mapped by name to a category
//! 4. Tool completed within the last few seconds
//! 5. All todos completed
//! 6. A todo in progress
//! 7. Recent history -> thinking, stale history -> idle
//! 8. No history at all -> sleeping
//!
//! The function is pure given the snapshot and an explicit `now`; it holds no
//! state between calls and is safe to invoke at a fast polling cadence.

use super::types::{truncate_string, SessionSnapshot, TodoStatus, ToolStatus};
use std::time::{Duration, SystemTime};

/// Maximum length for detail strings (descriptions, targets, todo content)
pub const DETAIL_MAX_LEN: usize = 28;

/// A completed tool counts as a fresh success within this window
pub const SUCCESS_WINDOW: Duration = Duration::from_secs(3);

/// History younger than this keeps the "thinking" transitional state
pub const THINKING_WINDOW: Duration = Duration::from_secs(10);

/// Context percentage at which the pressure warning takes over
pub const PRESSURE_THRESHOLD: u32 = 90;

/// What the agent is currently doing, as a closed enumeration.
///
/// Exactly one state holds at any evaluation instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    /// Context window nearly exhausted; overrides every other signal
    Pressure,
    /// A subagent (or Task/agent-named tool) is running
    Delegating,
    /// A read/glob/ls tool is running
    Reading,
    /// A write/edit/notebook tool is running
    Writing,
    /// A grep/search/find tool is running
    Searching,
    /// A bash/shell/exec tool is running
    RunningShell,
    /// A fetch/web/http tool is running
    Fetching,
    /// Unrecognized running tool, or fresh post-completion lull
    Thinking,
    /// A tool just finished, or every todo is done
    Celebrating,
    /// A todo item is in progress
    OnTask,
    /// History exists but nothing recent
    Idle,
    /// No tool or agent history at all
    Sleeping,
}

/// Cosmetic animation family for a state. Consumed by the renderer to pick
/// a spinner glyph set; carries no logic of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationHint {
    Scan,
    Build,
    Crunch,
    Pulse,
    Rest,
}

impl ActivityState {
    /// Short lowercase label for display
    pub fn label(&self) -> &'static str {
        match self {
            ActivityState::Pressure => "context",
            ActivityState::Delegating => "delegating",
            ActivityState::Reading => "reading",
            ActivityState::Writing => "writing",
            ActivityState::Searching => "searching",
            ActivityState::RunningShell => "running",
            ActivityState::Fetching => "fetching",
            ActivityState::Thinking => "thinking",
            ActivityState::Celebrating => "done",
            ActivityState::OnTask => "on task",
            ActivityState::Idle => "idle",
            ActivityState::Sleeping => "sleeping",
        }
    }

    /// Which animation family the renderer should use for this state
    pub fn animation(&self) -> AnimationHint {
        match self {
            ActivityState::Pressure => AnimationHint::Pulse,
            ActivityState::Delegating => AnimationHint::Crunch,
            ActivityState::Reading | ActivityState::Searching | ActivityState::Fetching => {
                AnimationHint::Scan
            }
            ActivityState::Writing | ActivityState::Thinking => AnimationHint::Build,
            ActivityState::RunningShell => AnimationHint::Crunch,
            ActivityState::Celebrating | ActivityState::OnTask => AnimationHint::Pulse,
            ActivityState::Idle | ActivityState::Sleeping => AnimationHint::Rest,
        }
    }
}

/// Classifier output: the state, what to print next to it, and when the
/// underlying activity started (for elapsed-time display)
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub state: ActivityState,
    pub detail: String,
    pub since: Option<SystemTime>,
}

impl Classification {
    fn new(state: ActivityState, detail: String, since: Option<SystemTime>) -> Self {
        Self {
            state,
            detail,
            since,
        }
    }
}

/// Ordered keyword table mapping tool names to states. Checked top to bottom,
/// first match wins; matching is case-insensitive substring.
const TOOL_KEYWORDS: &[(&[&str], ActivityState)] = &[
    (&["read", "glob"], ActivityState::Reading),
    (&["write", "edit", "multiedit", "notebook"], ActivityState::Writing),
    (&["grep", "search", "find"], ActivityState::Searching),
    (&["bash", "shell", "exec"], ActivityState::RunningShell),
    (&["fetch", "web", "http"], ActivityState::Fetching),
    (&["task", "agent"], ActivityState::Delegating),
];

/// Classify a tool name into an activity state.
///
/// `ls` is matched exactly (substring matching would catch too much);
/// everything else goes through [`TOOL_KEYWORDS`]. Unknown names fall back
/// to [`ActivityState::Thinking`].
pub fn classify_tool_name(name: &str) -> ActivityState {
    let lower = name.to_lowercase();

    if lower == "ls" {
        return ActivityState::Reading;
    }

    for (keywords, state) in TOOL_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return *state;
        }
    }

    ActivityState::Thinking
}

/// Classify a session snapshot at the given instant.
///
/// Pure: the only inputs are the snapshot and `now`. Never panics for
/// well-formed input; missing optional fields default safely (no context
/// usage means 0%, missing sequences mean empty history).
pub fn classify(snapshot: &SessionSnapshot, now: SystemTime) -> Classification {
    // 1. Context pressure is a hard ceiling - the operator must see it first
    let percent = snapshot.context_percent();
    if percent >= PRESSURE_THRESHOLD {
        return Classification::new(
            ActivityState::Pressure,
            format!("{}% context used", percent),
            None,
        );
    }

    // 2. Running subagent
    if let Some(agent) = snapshot.running_agents().first() {
        let raw = agent.description.as_deref().unwrap_or(&agent.agent_type);
        return Classification::new(
            ActivityState::Delegating,
            truncate_string(raw, DETAIL_MAX_LEN),
            Some(agent.start_time),
        );
    }

    // 3. Running tool: the last one in iteration order is the most recently
    // observed and wins
    if let Some(tool) = snapshot.running_tools().last() {
        let state = classify_tool_name(&tool.name);
        let raw = tool.target.as_deref().unwrap_or(&tool.name);
        return Classification::new(
            state,
            truncate_string(raw, DETAIL_MAX_LEN),
            Some(tool.start_time),
        );
    }

    // 4. A tool finished moments ago
    if let Some(tool) = latest_completed_tool(snapshot) {
        if let Some(end) = tool.end_time {
            let age = now.duration_since(end).unwrap_or_default();
            if age <= SUCCESS_WINDOW {
                return Classification::new(
                    ActivityState::Celebrating,
                    format!("{} done!", tool.name),
                    Some(tool.start_time),
                );
            }
        }
    }

    // 5. Every todo done
    if !snapshot.todos.is_empty()
        && snapshot
            .todos
            .iter()
            .all(|t| t.status == TodoStatus::Completed)
    {
        return Classification::new(
            ActivityState::Celebrating,
            "all tasks complete!".to_string(),
            None,
        );
    }

    // 6. A todo in progress; first in iteration order is canonical
    if let Some(todo) = snapshot
        .todos
        .iter()
        .find(|t| t.status == TodoStatus::InProgress)
    {
        return Classification::new(
            ActivityState::OnTask,
            truncate_string(&todo.content, DETAIL_MAX_LEN),
            None,
        );
    }

    // 7. History exists: recent completion keeps the transitional thinking
    // state, anything older is idle
    if snapshot.has_activity() {
        let recent = latest_completed_tool(snapshot)
            .and_then(|t| t.end_time)
            .map(|end| now.duration_since(end).unwrap_or_default() <= THINKING_WINDOW)
            .unwrap_or(false);

        if recent {
            return Classification::new(ActivityState::Thinking, "...".to_string(), None);
        }
        return Classification::new(ActivityState::Idle, "ready".to_string(), None);
    }

    // 8. Nothing has happened yet
    Classification::new(
        ActivityState::Sleeping,
        "waiting for input".to_string(),
        None,
    )
}

/// The completed tool with the newest end_time
fn latest_completed_tool(snapshot: &SessionSnapshot) -> Option<&super::types::ToolEntry> {
    snapshot
        .tools
        .iter()
        .filter(|t| t.status == ToolStatus::Completed)
        .max_by_key(|t| t.end_time)
}
