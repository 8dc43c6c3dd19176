//! Activity tracking module
//!
//! This module provides functionality for:
//! - Building a session snapshot from a JSONL transcript
//! - Classifying the snapshot into a single activity state
//! - Shared formatting helpers (durations, truncation)

pub mod classifier;
pub mod transcript_parser;
pub mod types;

// Re-export commonly used items
pub use classifier::{classify, classify_tool_name, ActivityState, AnimationHint, Classification};
pub use transcript_parser::parse_transcript;
pub use types::{
    format_duration, truncate_string, AgentEntry, AgentStatus, ContextUsage,
    SessionSnapshot, TodoItem, TodoStatus, ToolEntry, ToolStatus,
};
