//! Session snapshot data structures
//!
//! This module defines the data structures describing one session's tool,
//! agent, and todo history, plus context-window usage. A [`SessionSnapshot`]
//! is a point-in-time read-only view built by the transcript parser and
//! consumed by the activity classifier.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// Tool execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Running,
    Completed,
}

/// Agent execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Running,
    Completed,
}

/// Todo item status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

/// Represents a single tool invocation
///
/// Invariant: `end_time` is present iff `status == Completed`. Entries are
/// created running, flipped to completed at most once, and never removed
/// within a session.
#[derive(Debug, Clone)]
pub struct ToolEntry {
    /// Unique identifier from the tool_use block
    pub id: String,
    /// Tool name (e.g., "Read", "Edit", "Bash")
    pub name: String,
    /// Optional target (file path, pattern, command preview)
    pub target: Option<String>,
    /// Current execution status
    pub status: ToolStatus,
    /// When the tool was invoked
    pub start_time: SystemTime,
    /// When the tool completed (if finished)
    pub end_time: Option<SystemTime>,
}

impl ToolEntry {
    /// Create a new running tool entry
    pub fn new(id: String, name: String, target: Option<String>, start_time: SystemTime) -> Self {
        Self {
            id,
            name,
            target,
            status: ToolStatus::Running,
            start_time,
            end_time: None,
        }
    }

    /// Mark the tool as completed at the given time
    pub fn complete_at(&mut self, end_time: SystemTime) {
        self.status = ToolStatus::Completed;
        self.end_time = Some(end_time);
    }

    /// Get elapsed time since start, up to `now` for running tools
    pub fn elapsed(&self, now: SystemTime) -> Duration {
        let end = self.end_time.unwrap_or(now);
        end.duration_since(self.start_time).unwrap_or_default()
    }
}

/// Represents a subagent (delegated task) invocation
#[derive(Debug, Clone)]
pub struct AgentEntry {
    /// Unique identifier from the Task tool_use block
    pub id: String,
    /// Agent type (e.g., "Explore", "fix", "Plan")
    pub agent_type: String,
    /// Model used by the agent (e.g., "haiku", "sonnet")
    pub model: Option<String>,
    /// Task description
    pub description: Option<String>,
    /// Current execution status
    pub status: AgentStatus,
    /// When the agent was started
    pub start_time: SystemTime,
    /// When the agent completed (if finished)
    pub end_time: Option<SystemTime>,
}

impl AgentEntry {
    /// Create a new running agent entry
    pub fn new(
        id: String,
        agent_type: String,
        model: Option<String>,
        description: Option<String>,
        start_time: SystemTime,
    ) -> Self {
        Self {
            id,
            agent_type,
            model,
            description,
            status: AgentStatus::Running,
            start_time,
            end_time: None,
        }
    }

    /// Mark the agent as completed at the given time
    pub fn complete_at(&mut self, end_time: SystemTime) {
        self.status = AgentStatus::Completed;
        self.end_time = Some(end_time);
    }
}

/// One item in the agent's task list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoItem {
    /// Task description
    pub content: String,
    /// Current status
    pub status: TodoStatus,
}

/// Token accounting for the model's input budget
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ContextUsage {
    pub input_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
}

impl ContextUsage {
    /// Total tokens counted against the context window
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.cache_creation_tokens + self.cache_read_tokens
    }
}

/// Point-in-time view of one session, consumed by the classifier
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Tracked tools (limited to the last N by the parser)
    pub tools: Vec<ToolEntry>,
    /// Tracked agents (limited to the last N by the parser)
    pub agents: Vec<AgentEntry>,
    /// Current todo list (latest TodoWrite wins)
    pub todos: Vec<TodoItem>,
    /// Context-window usage from the latest assistant message, if any
    pub context_usage: Option<ContextUsage>,
    /// Context window size in tokens, if known
    pub context_window_size: Option<u64>,
}

impl SessionSnapshot {
    /// Percentage of the context window consumed, rounded to an integer.
    ///
    /// Returns 0 when usage or window size is absent (never divides by zero).
    pub fn context_percent(&self) -> u32 {
        match (&self.context_usage, self.context_window_size) {
            (Some(usage), Some(size)) if size > 0 => {
                (100.0 * usage.total_tokens() as f64 / size as f64).round() as u32
            }
            _ => 0,
        }
    }

    /// Check if there's any tool or agent history
    pub fn has_activity(&self) -> bool {
        !self.tools.is_empty() || !self.agents.is_empty()
    }

    /// Get currently running tools
    pub fn running_tools(&self) -> Vec<&ToolEntry> {
        self.tools
            .iter()
            .filter(|t| t.status == ToolStatus::Running)
            .collect()
    }

    /// Get completed tools
    pub fn completed_tools(&self) -> Vec<&ToolEntry> {
        self.tools
            .iter()
            .filter(|t| t.status == ToolStatus::Completed)
            .collect()
    }

    /// Get currently running agents
    pub fn running_agents(&self) -> Vec<&AgentEntry> {
        self.agents
            .iter()
            .filter(|a| a.status == AgentStatus::Running)
            .collect()
    }
}

/// Format a duration for display
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 1 {
        return "<1s".to_string();
    }

    if secs < 60 {
        return format!("{}s", secs);
    }

    let mins = secs / 60;
    let remaining_secs = secs % 60;

    if remaining_secs == 0 {
        format!("{}m", mins)
    } else {
        format!("{}m {}s", mins, remaining_secs)
    }
}

/// Truncate a string to max length with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        // Count chars, not bytes: slicing at a byte index would panic when
        // a multibyte character straddles the cut
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "<1s");
        assert_eq!(format_duration(Duration::from_secs(0)), "<1s");
        assert_eq!(format_duration(Duration::from_secs(1)), "1s");
        assert_eq!(format_duration(Duration::from_secs(59)), "59s");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(120)), "2m");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("hi", 2), "hi");
        assert_eq!(truncate_string("hello", 3), "...");
        assert_eq!(truncate_string("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_string_exact_boundary() {
        // 30 chars at max 25 must yield exactly 25 chars ending in "..."
        let long = "abcdefghijklmnopqrstuvwxyz1234";
        assert_eq!(long.len(), 30);
        let out = truncate_string(long, 25);
        assert_eq!(out.len(), 25);
        assert!(out.ends_with("..."));
        assert_eq!(out, "abcdefghijklmnopqrstuv...");

        // Short input returned unchanged
        assert_eq!(truncate_string("0123456789", 25), "0123456789");
    }

    #[test]
    fn test_truncate_string_multibyte() {
        // A multibyte char straddling the cut point must not panic
        let s = format!("{}{}", "a".repeat(24), "é".repeat(6));
        assert_eq!(s.chars().count(), 30);
        let out = truncate_string(&s, 28);
        assert_eq!(out.chars().count(), 28);
        assert!(out.ends_with("..."));

        // All-multibyte input within the limit is returned unchanged
        let short = "é".repeat(10);
        assert_eq!(truncate_string(&short, 25), short);

        // Cut landing mid-char sequence
        assert_eq!(truncate_string("ééééé", 4), "é...");
    }

    #[test]
    fn test_context_percent() {
        let mut snapshot = SessionSnapshot::default();
        assert_eq!(snapshot.context_percent(), 0);

        snapshot.context_usage = Some(ContextUsage {
            input_tokens: 100_000,
            cache_creation_tokens: 50_000,
            cache_read_tokens: 30_000,
        });
        // No window size yet
        assert_eq!(snapshot.context_percent(), 0);

        snapshot.context_window_size = Some(200_000);
        assert_eq!(snapshot.context_percent(), 90);

        snapshot.context_window_size = Some(0);
        assert_eq!(snapshot.context_percent(), 0);
    }

    #[test]
    fn test_tool_entry_lifecycle() {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let mut tool = ToolEntry::new(
            "123".to_string(),
            "Read".to_string(),
            Some("file.rs".to_string()),
            start,
        );
        assert_eq!(tool.status, ToolStatus::Running);
        assert!(tool.end_time.is_none());

        let end = start + Duration::from_secs(5);
        tool.complete_at(end);
        assert_eq!(tool.status, ToolStatus::Completed);
        assert_eq!(tool.end_time, Some(end));
        assert_eq!(tool.elapsed(end), Duration::from_secs(5));
    }

    #[test]
    fn test_agent_entry_lifecycle() {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let mut agent = AgentEntry::new(
            "456".to_string(),
            "Explore".to_string(),
            Some("haiku".to_string()),
            Some("Finding code".to_string()),
            start,
        );
        assert_eq!(agent.status, AgentStatus::Running);
        assert!(agent.end_time.is_none());

        agent.complete_at(start + Duration::from_secs(30));
        assert_eq!(agent.status, AgentStatus::Completed);
        assert!(agent.end_time.is_some());
    }

    #[test]
    fn test_snapshot_filters() {
        let start = SystemTime::UNIX_EPOCH;
        let mut snapshot = SessionSnapshot::default();
        assert!(!snapshot.has_activity());

        snapshot
            .tools
            .push(ToolEntry::new("1".to_string(), "Read".to_string(), None, start));
        assert!(snapshot.has_activity());
        assert_eq!(snapshot.running_tools().len(), 1);
        assert_eq!(snapshot.completed_tools().len(), 0);

        snapshot.tools[0].complete_at(start + Duration::from_secs(1));
        assert_eq!(snapshot.running_tools().len(), 0);
        assert_eq!(snapshot.completed_tools().len(), 1);
    }
}
