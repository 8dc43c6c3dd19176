//! Transcript parsing for coding-agent session activity
//!
//! Parses the session's JSONL transcript into a [`SessionSnapshot`]:
//! tool_use/tool_result blocks become tool and agent entries, the latest
//! TodoWrite input becomes the todo list, and the newest assistant message's
//! usage becomes the context-window accounting.

use super::types::{
    AgentEntry, ContextUsage, SessionSnapshot, TodoItem, ToolEntry,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::SystemTime;

/// Maximum number of tools to keep in the snapshot
const MAX_TOOLS: usize = 20;

/// Maximum number of agents to keep in the snapshot
const MAX_AGENTS: usize = 10;

/// Maximum length for extracted targets (command, url, query)
const MAX_TARGET_LEN: usize = 30;

/// A single line entry from the transcript JSONL file
#[derive(Debug, Deserialize)]
struct TranscriptLine {
    /// ISO 8601 timestamp
    timestamp: Option<String>,
    /// Entry type: "assistant", "user", "summary", etc.
    #[serde(rename = "type")]
    entry_type: Option<String>,
    /// Message containing content blocks and usage
    message: Option<Message>,
}

/// Message structure containing content blocks
#[derive(Debug, Deserialize)]
struct Message {
    /// Array of content blocks (tool_use, tool_result, text, etc.)
    content: Option<Vec<ContentBlock>>,
    /// Token usage reported with assistant messages
    usage: Option<RawUsage>,
}

/// A content block within a message
#[derive(Debug, Deserialize)]
struct ContentBlock {
    /// Block type: "tool_use", "tool_result", "text", etc.
    #[serde(rename = "type")]
    block_type: String,
    /// Unique identifier for tool_use blocks
    id: Option<String>,
    /// Tool name for tool_use blocks
    name: Option<String>,
    /// Input parameters for tool_use blocks
    input: Option<Value>,
    /// Reference to tool_use id for tool_result blocks
    tool_use_id: Option<String>,
}

/// Usage block as it appears on the wire
#[derive(Debug, Deserialize)]
struct RawUsage {
    input_tokens: Option<u64>,
    cache_creation_input_tokens: Option<u64>,
    cache_read_input_tokens: Option<u64>,
}

impl RawUsage {
    fn normalize(&self) -> ContextUsage {
        ContextUsage {
            input_tokens: self.input_tokens.unwrap_or(0),
            cache_creation_tokens: self.cache_creation_input_tokens.unwrap_or(0),
            cache_read_tokens: self.cache_read_input_tokens.unwrap_or(0),
        }
    }
}

/// Internal state accumulated while parsing
struct ParserState {
    /// Map of tool_use_id to ToolEntry
    tool_map: HashMap<String, ToolEntry>,
    /// Map of tool_use_id to AgentEntry (for Task tools)
    agent_map: HashMap<String, AgentEntry>,
    /// Latest todo list seen (each TodoWrite replaces the previous)
    todos: Vec<TodoItem>,
    /// Usage from the newest assistant message
    context_usage: Option<ContextUsage>,
}

impl ParserState {
    fn new() -> Self {
        Self {
            tool_map: HashMap::new(),
            agent_map: HashMap::new(),
            todos: Vec::new(),
            context_usage: None,
        }
    }

    /// Convert to the final snapshot, keeping only the last N entries
    fn into_snapshot(self) -> SessionSnapshot {
        let mut tools: Vec<ToolEntry> = self.tool_map.into_values().collect();
        tools.sort_by(|a, b| a.start_time.cmp(&b.start_time));

        let mut agents: Vec<AgentEntry> = self.agent_map.into_values().collect();
        agents.sort_by(|a, b| a.start_time.cmp(&b.start_time));

        let tools_len = tools.len();
        let tools = if tools_len > MAX_TOOLS {
            tools.into_iter().skip(tools_len - MAX_TOOLS).collect()
        } else {
            tools
        };

        let agents_len = agents.len();
        let agents = if agents_len > MAX_AGENTS {
            agents.into_iter().skip(agents_len - MAX_AGENTS).collect()
        } else {
            agents
        };

        SessionSnapshot {
            tools,
            agents,
            todos: self.todos,
            context_usage: self.context_usage,
            context_window_size: None,
        }
    }
}

/// Parse a transcript JSONL file into a session snapshot.
///
/// Returns an empty snapshot when the file is missing or unreadable.
/// Malformed and empty lines are skipped. The caller supplies the context
/// window size separately (it comes from model configuration, not the
/// transcript).
pub fn parse_transcript<P: AsRef<Path>>(transcript_path: P) -> SessionSnapshot {
    let path = transcript_path.as_ref();

    if !path.exists() {
        return SessionSnapshot::default();
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return SessionSnapshot::default(),
    };

    let reader = BufReader::new(file);
    let mut state = ParserState::new();

    for line_result in reader.lines() {
        let line = match line_result {
            Ok(l) => l,
            Err(_) => continue,
        };

        if line.trim().is_empty() {
            continue;
        }

        let entry: TranscriptLine = match serde_json::from_str(&line) {
            Ok(e) => e,
            Err(_) => continue, // Skip malformed lines
        };

        process_entry(&entry, &mut state);
    }

    state.into_snapshot()
}

/// Process a single transcript entry
fn process_entry(entry: &TranscriptLine, state: &mut ParserState) {
    let timestamp = parse_timestamp(entry.timestamp.as_deref());

    let message = match &entry.message {
        Some(msg) => msg,
        None => return,
    };

    // Later assistant messages overwrite earlier usage; the newest one
    // describes the current context window
    if entry.entry_type.as_deref() == Some("assistant") {
        if let Some(raw) = &message.usage {
            state.context_usage = Some(raw.normalize());
        }
    }

    let content = match &message.content {
        Some(c) => c,
        None => return,
    };

    for block in content {
        match block.block_type.as_str() {
            "tool_use" => process_tool_use(block, timestamp, state),
            "tool_result" => process_tool_result(block, timestamp, state),
            _ => {} // Ignore other block types (text, etc.)
        }
    }
}

/// Process a tool_use block
fn process_tool_use(block: &ContentBlock, timestamp: SystemTime, state: &mut ParserState) {
    let id = match &block.id {
        Some(id) => id.clone(),
        None => return,
    };

    let name = match &block.name {
        Some(n) => n.clone(),
        None => return,
    };

    if name == "Task" {
        let agent_entry = create_agent_entry(&id, &block.input, timestamp);
        state.agent_map.insert(id, agent_entry);
    } else if name == "TodoWrite" {
        // The todo list is state, not activity: each write replaces it
        state.todos = extract_todos(&block.input);
    } else {
        let target = extract_target(&name, &block.input);
        let tool_entry = ToolEntry::new(id.clone(), name, target, timestamp);
        state.tool_map.insert(id, tool_entry);
    }
}

/// Process a tool_result block
fn process_tool_result(block: &ContentBlock, timestamp: SystemTime, state: &mut ParserState) {
    let tool_use_id = match &block.tool_use_id {
        Some(id) => id,
        None => return,
    };

    if let Some(tool) = state.tool_map.get_mut(tool_use_id) {
        tool.complete_at(timestamp);
    }

    if let Some(agent) = state.agent_map.get_mut(tool_use_id) {
        agent.complete_at(timestamp);
    }
}

/// Create an AgentEntry from Task tool input
fn create_agent_entry(id: &str, input: &Option<Value>, timestamp: SystemTime) -> AgentEntry {
    let (agent_type, model, description) = match input {
        Some(Value::Object(obj)) => {
            let agent_type = obj
                .get("subagent_type")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string();

            let model = obj.get("model").and_then(|v| v.as_str()).map(String::from);

            let description = obj
                .get("description")
                .and_then(|v| v.as_str())
                .map(String::from);

            (agent_type, model, description)
        }
        _ => ("unknown".to_string(), None, None),
    };

    AgentEntry::new(id.to_string(), agent_type, model, description, timestamp)
}

/// Extract the todo list from TodoWrite input. Items with unknown status
/// strings are dropped rather than guessed at.
fn extract_todos(input: &Option<Value>) -> Vec<TodoItem> {
    let todos = match input {
        Some(Value::Object(obj)) => match obj.get("todos") {
            Some(Value::Array(arr)) => arr,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    todos
        .iter()
        .filter_map(|item| serde_json::from_value::<TodoItem>(item.clone()).ok())
        .collect()
}

/// Extract a display target from tool input based on tool name
fn extract_target(tool_name: &str, input: &Option<Value>) -> Option<String> {
    let obj = match input {
        Some(Value::Object(o)) => o,
        _ => return None,
    };

    let clip = |s: &str| {
        if s.chars().count() > MAX_TARGET_LEN {
            let head: String = s.chars().take(MAX_TARGET_LEN).collect();
            format!("{}...", head)
        } else {
            s.to_string()
        }
    };

    match tool_name {
        // File operations: extract file_path or path
        "Read" | "Write" | "Edit" | "MultiEdit" | "NotebookEdit" => obj
            .get("file_path")
            .or_else(|| obj.get("path"))
            .and_then(|v| v.as_str())
            .map(String::from),

        // Pattern-based tools
        "Glob" | "Grep" => obj.get("pattern").and_then(|v| v.as_str()).map(String::from),

        // Bash: first 30 chars of the command
        "Bash" => obj.get("command").and_then(|v| v.as_str()).map(clip),

        // Web tools: url or query, truncated
        "WebFetch" => obj.get("url").and_then(|v| v.as_str()).map(clip),
        "WebSearch" => obj.get("query").and_then(|v| v.as_str()).map(clip),

        // Unknown tool: no target
        _ => None,
    }
}

/// Parse an ISO 8601 timestamp string to SystemTime
fn parse_timestamp(timestamp_str: Option<&str>) -> SystemTime {
    match timestamp_str {
        Some(ts) => match DateTime::parse_from_rfc3339(ts) {
            Ok(dt) => to_system_time(dt.into()),
            Err(_) => {
                // Try parsing without timezone (assume UTC)
                match chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f") {
                    Ok(ndt) => to_system_time(ndt.and_utc()),
                    Err(_) => SystemTime::now(),
                }
            }
        },
        None => SystemTime::now(),
    }
}

/// Pre-epoch dates clamp to the epoch; casting a negative timestamp to u64
/// would wrap into an absurd future time
fn to_system_time(utc: DateTime<Utc>) -> SystemTime {
    let secs = utc.timestamp();
    if secs < 0 {
        return SystemTime::UNIX_EPOCH;
    }
    SystemTime::UNIX_EPOCH
        + std::time::Duration::from_secs(secs as u64)
        + std::time::Duration::from_nanos(utc.timestamp_subsec_nanos() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::activity::types::{AgentStatus, TodoStatus, ToolStatus};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_transcript(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_empty_file() {
        let file = create_test_transcript(&[]);
        let snapshot = parse_transcript(file.path());
        assert!(snapshot.tools.is_empty());
        assert!(snapshot.agents.is_empty());
        assert!(snapshot.todos.is_empty());
        assert!(snapshot.context_usage.is_none());
    }

    #[test]
    fn test_parse_nonexistent_file() {
        let snapshot = parse_transcript("/nonexistent/path/transcript.jsonl");
        assert!(snapshot.tools.is_empty());
        assert!(snapshot.agents.is_empty());
    }

    #[test]
    fn test_parse_tool_use() {
        let lines = [
            r#"{"timestamp":"2024-01-15T10:00:00Z","message":{"content":[{"type":"tool_use","id":"tool_1","name":"Read","input":{"file_path":"/src/main.rs"}}]}}"#,
        ];
        let file = create_test_transcript(&lines);
        let snapshot = parse_transcript(file.path());

        assert_eq!(snapshot.tools.len(), 1);
        assert_eq!(snapshot.tools[0].name, "Read");
        assert_eq!(snapshot.tools[0].target, Some("/src/main.rs".to_string()));
        assert_eq!(snapshot.tools[0].status, ToolStatus::Running);
    }

    #[test]
    fn test_parse_tool_result() {
        let lines = [
            r#"{"timestamp":"2024-01-15T10:00:00Z","message":{"content":[{"type":"tool_use","id":"tool_1","name":"Read","input":{"file_path":"/src/main.rs"}}]}}"#,
            r#"{"timestamp":"2024-01-15T10:00:01Z","message":{"content":[{"type":"tool_result","tool_use_id":"tool_1"}]}}"#,
        ];
        let file = create_test_transcript(&lines);
        let snapshot = parse_transcript(file.path());

        assert_eq!(snapshot.tools.len(), 1);
        assert_eq!(snapshot.tools[0].status, ToolStatus::Completed);
        assert!(snapshot.tools[0].end_time.is_some());
    }

    #[test]
    fn test_parse_agent_task() {
        let lines = [
            r#"{"timestamp":"2024-01-15T10:00:00Z","message":{"content":[{"type":"tool_use","id":"agent_1","name":"Task","input":{"subagent_type":"Explore","model":"haiku","description":"Finding auth code"}}]}}"#,
        ];
        let file = create_test_transcript(&lines);
        let snapshot = parse_transcript(file.path());

        assert!(snapshot.tools.is_empty());
        assert_eq!(snapshot.agents.len(), 1);
        assert_eq!(snapshot.agents[0].agent_type, "Explore");
        assert_eq!(snapshot.agents[0].model, Some("haiku".to_string()));
        assert_eq!(
            snapshot.agents[0].description,
            Some("Finding auth code".to_string())
        );
        assert_eq!(snapshot.agents[0].status, AgentStatus::Running);
    }

    #[test]
    fn test_parse_agent_completion() {
        let lines = [
            r#"{"timestamp":"2024-01-15T10:00:00Z","message":{"content":[{"type":"tool_use","id":"agent_1","name":"Task","input":{"subagent_type":"Explore"}}]}}"#,
            r#"{"timestamp":"2024-01-15T10:02:00Z","message":{"content":[{"type":"tool_result","tool_use_id":"agent_1"}]}}"#,
        ];
        let file = create_test_transcript(&lines);
        let snapshot = parse_transcript(file.path());

        assert_eq!(snapshot.agents.len(), 1);
        assert_eq!(snapshot.agents[0].status, AgentStatus::Completed);
        assert!(snapshot.agents[0].end_time.is_some());
    }

    #[test]
    fn test_todo_write_captured() {
        let lines = [
            r#"{"timestamp":"2024-01-15T10:00:00Z","message":{"content":[{"type":"tool_use","id":"todo_1","name":"TodoWrite","input":{"todos":[{"content":"write tests","status":"in_progress"},{"content":"ship","status":"pending"}]}}]}}"#,
        ];
        let file = create_test_transcript(&lines);
        let snapshot = parse_transcript(file.path());

        assert!(snapshot.tools.is_empty());
        assert_eq!(snapshot.todos.len(), 2);
        assert_eq!(snapshot.todos[0].content, "write tests");
        assert_eq!(snapshot.todos[0].status, TodoStatus::InProgress);
        assert_eq!(snapshot.todos[1].status, TodoStatus::Pending);
    }

    #[test]
    fn test_latest_todo_write_wins() {
        let lines = [
            r#"{"timestamp":"2024-01-15T10:00:00Z","message":{"content":[{"type":"tool_use","id":"todo_1","name":"TodoWrite","input":{"todos":[{"content":"old","status":"pending"}]}}]}}"#,
            r#"{"timestamp":"2024-01-15T10:01:00Z","message":{"content":[{"type":"tool_use","id":"todo_2","name":"TodoWrite","input":{"todos":[{"content":"new","status":"completed"}]}}]}}"#,
        ];
        let file = create_test_transcript(&lines);
        let snapshot = parse_transcript(file.path());

        assert_eq!(snapshot.todos.len(), 1);
        assert_eq!(snapshot.todos[0].content, "new");
    }

    #[test]
    fn test_context_usage_from_latest_assistant() {
        let lines = [
            r#"{"timestamp":"2024-01-15T10:00:00Z","type":"assistant","message":{"usage":{"input_tokens":1000,"cache_creation_input_tokens":200,"cache_read_input_tokens":300}}}"#,
            r#"{"timestamp":"2024-01-15T10:01:00Z","type":"assistant","message":{"usage":{"input_tokens":5000,"cache_creation_input_tokens":0,"cache_read_input_tokens":2000}}}"#,
        ];
        let file = create_test_transcript(&lines);
        let snapshot = parse_transcript(file.path());

        let usage = snapshot.context_usage.expect("usage should be captured");
        assert_eq!(usage.input_tokens, 5000);
        assert_eq!(usage.cache_read_tokens, 2000);
        assert_eq!(usage.total_tokens(), 7000);
    }

    #[test]
    fn test_extract_target_bash() {
        let input = serde_json::json!({"command": "cargo build --release && cargo test"});
        let target = extract_target("Bash", &Some(input));
        assert_eq!(target, Some("cargo build --release && cargo...".to_string()));
    }

    #[test]
    fn test_extract_target_short_command() {
        let input = serde_json::json!({"command": "ls -la"});
        let target = extract_target("Bash", &Some(input));
        assert_eq!(target, Some("ls -la".to_string()));
    }

    #[test]
    fn test_extract_target_multibyte_command() {
        // A multibyte char at the clip point must not panic
        let command = format!("echo {}", "é".repeat(40));
        let input = serde_json::json!({ "command": command });
        let target = extract_target("Bash", &Some(input)).unwrap();
        assert_eq!(target.chars().count(), MAX_TARGET_LEN + 3);
        assert!(target.ends_with("..."));
    }

    #[test]
    fn test_extract_target_glob() {
        let input = serde_json::json!({"pattern": "**/*.rs"});
        let target = extract_target("Glob", &Some(input));
        assert_eq!(target, Some("**/*.rs".to_string()));
    }

    #[test]
    fn test_extract_target_web_fetch() {
        let input = serde_json::json!({"url": "https://example.com/very/long/path/to/resource"});
        let target = extract_target("WebFetch", &Some(input));
        assert_eq!(target, Some("https://example.com/very/long/...".to_string()));
    }

    #[test]
    fn test_max_tools_limit() {
        let mut lines = Vec::new();
        for i in 0..30 {
            lines.push(format!(
                r#"{{"timestamp":"2024-01-15T10:00:{:02}Z","message":{{"content":[{{"type":"tool_use","id":"tool_{}","name":"Read","input":{{"file_path":"/file_{}.rs"}}}}]}}}}"#,
                i, i, i
            ));
        }
        let lines_ref: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
        let file = create_test_transcript(&lines_ref);
        let snapshot = parse_transcript(file.path());

        assert_eq!(snapshot.tools.len(), MAX_TOOLS);
        // Should keep the last 20 (indices 10-29)
        assert_eq!(snapshot.tools[0].id, "tool_10");
        assert_eq!(snapshot.tools[19].id, "tool_29");
    }

    #[test]
    fn test_max_agents_limit() {
        let mut lines = Vec::new();
        for i in 0..15 {
            lines.push(format!(
                r#"{{"timestamp":"2024-01-15T10:00:{:02}Z","message":{{"content":[{{"type":"tool_use","id":"agent_{}","name":"Task","input":{{"subagent_type":"Explore"}}}}]}}}}"#,
                i, i
            ));
        }
        let lines_ref: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
        let file = create_test_transcript(&lines_ref);
        let snapshot = parse_transcript(file.path());

        assert_eq!(snapshot.agents.len(), MAX_AGENTS);
        assert_eq!(snapshot.agents[0].id, "agent_5");
        assert_eq!(snapshot.agents[9].id, "agent_14");
    }

    #[test]
    fn test_skip_malformed_lines() {
        let lines = [
            r#"{"timestamp":"2024-01-15T10:00:00Z","message":{"content":[{"type":"tool_use","id":"tool_1","name":"Read","input":{}}]}}"#,
            r#"not valid json"#,
            "",
            r#"{"timestamp":"2024-01-15T10:00:01Z","message":{"content":[{"type":"tool_use","id":"tool_2","name":"Write","input":{}}]}}"#,
        ];
        let file = create_test_transcript(&lines);
        let snapshot = parse_transcript(file.path());

        assert_eq!(snapshot.tools.len(), 2);
    }

    #[test]
    fn test_mixed_content_blocks() {
        let lines = [
            r#"{"timestamp":"2024-01-15T10:00:00Z","message":{"content":[{"type":"text","text":"Hello"},{"type":"tool_use","id":"tool_1","name":"Read","input":{"file_path":"/test.rs"}},{"type":"text","text":"World"}]}}"#,
        ];
        let file = create_test_transcript(&lines);
        let snapshot = parse_transcript(file.path());

        assert_eq!(snapshot.tools.len(), 1);
        assert_eq!(snapshot.tools[0].name, "Read");
    }

    #[test]
    fn test_todos_with_unknown_status_dropped() {
        let lines = [
            r#"{"timestamp":"2024-01-15T10:00:00Z","message":{"content":[{"type":"tool_use","id":"todo_1","name":"TodoWrite","input":{"todos":[{"content":"ok","status":"pending"},{"content":"weird","status":"paused"}]}}]}}"#,
        ];
        let file = create_test_transcript(&lines);
        let snapshot = parse_transcript(file.path());

        assert_eq!(snapshot.todos.len(), 1);
        assert_eq!(snapshot.todos[0].content, "ok");
    }

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let ts = parse_timestamp(Some("2024-01-15T10:30:45Z"));
        let now = SystemTime::now();
        assert!(ts < now);
    }

    #[test]
    fn test_parse_timestamp_with_offset() {
        let ts = parse_timestamp(Some("2024-01-15T10:30:45+05:00"));
        let now = SystemTime::now();
        assert!(ts < now);
    }

    #[test]
    fn test_parse_timestamp_pre_epoch_clamps() {
        let ts = parse_timestamp(Some("1969-07-20T20:17:00Z"));
        assert_eq!(ts, SystemTime::UNIX_EPOCH);
    }
}
