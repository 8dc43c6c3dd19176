//! Model family recognition
//!
//! Extracts a display name and context window size from a raw model id.
//! Claude model ids come in two shapes, both handled by one regex per
//! family:
//!   - `claude-{variant}-{major}[-{minor}]-{date}` (e.g., `claude-sonnet-4-5-20250929`)
//!   - `claude-{major}[-{minor}]-{variant}-{date}` (e.g., `claude-4-opus-20250514`)

use regex::Regex;
use std::sync::OnceLock;

/// Context limit assumed when nothing matches
pub const DEFAULT_CONTEXT_LIMIT: u64 = 200_000;

/// One recognized model family with version extraction
struct ModelFamily {
    regex: Regex,
    display_prefix: &'static str,
    context_limit: u64,
}

impl ModelFamily {
    /// The regex matches version numbers (1-2 digits) adjacent to the
    /// keyword, followed by a boundary that signals versions have ended:
    /// a date suffix, a text qualifier, or end of string.
    fn new(keyword: &str, display_prefix: &'static str, context_limit: u64) -> Self {
        let pattern = format!(
            r"(?:(?P<pre_major>\d{{1,2}})(?:-(?P<pre_minor>\d{{1,2}}))?-{kw}|{kw}(?:-(?P<post_major>\d{{1,2}})(?:-(?P<post_minor>\d{{1,2}}))?)?)(?:-\d{{3,}}|-[a-z]|$)",
            kw = keyword
        );
        Self {
            regex: Regex::new(&pattern).expect("model family regex should compile"),
            display_prefix,
            context_limit,
        }
    }

    /// Try to match an already-lowercased model id, returning a formatted
    /// display name like "Sonnet 4.5"
    fn match_model(&self, model_id_lower: &str) -> Option<String> {
        let caps = self.regex.captures(model_id_lower)?;

        let major = caps
            .name("post_major")
            .or_else(|| caps.name("pre_major"))
            .map(|m| m.as_str());

        let minor = caps
            .name("post_minor")
            .or_else(|| caps.name("pre_minor"))
            .map(|m| m.as_str());

        Some(match (major, minor) {
            (Some(major), Some(minor)) => {
                format!("{} {}.{}", self.display_prefix, major, minor)
            }
            (Some(major), None) => format!("{} {}", self.display_prefix, major),
            _ => self.display_prefix.to_string(),
        })
    }
}

/// Compiled once per process regardless of call count
static FAMILIES: OnceLock<Vec<ModelFamily>> = OnceLock::new();

fn families() -> &'static [ModelFamily] {
    FAMILIES.get_or_init(|| {
        vec![
            ModelFamily::new("sonnet", "Sonnet", 200_000),
            ModelFamily::new("opus", "Opus", 200_000),
            ModelFamily::new("haiku", "Haiku", 200_000),
        ]
    })
}

/// Get a display name for a model id, if the id belongs to a known family
pub fn display_name(model_id: &str) -> Option<String> {
    let lower = model_id.to_lowercase();
    families().iter().find_map(|f| f.match_model(&lower))
}

/// Get the context window size for a model id. Unknown models get the
/// default limit.
pub fn context_limit(model_id: &str) -> u64 {
    let lower = model_id.to_lowercase();
    families()
        .iter()
        .find(|f| f.match_model(&lower).is_some())
        .map(|f| f.context_limit)
        .unwrap_or(DEFAULT_CONTEXT_LIMIT)
}
