//! Configuration loading and persistence
//!
//! Config lives at `~/.claude/ccpulse/config.toml`. Loading is forgiving:
//! a missing or unreadable file yields the defaults, and pricing overrides
//! are sanitized before anything downstream sees them.

use super::types::Config;
use std::fs;
use std::path::PathBuf;

/// Result of config initialization
#[derive(Debug)]
pub enum InitResult {
    /// Config was created at the given path
    Created(PathBuf),
    /// Config already existed at the given path
    AlreadyExists(PathBuf),
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults when the file is missing or malformed
    pub fn load() -> Config {
        let config_path = Self::config_path();

        if !config_path.exists() {
            return Config::default();
        }

        match Self::load_from_path(&config_path) {
            Ok(config) => config,
            Err(_) => Config::default(),
        }
    }

    /// Load and sanitize configuration from a specific path
    pub fn load_from_path(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Config, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.sanitize();
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;
        Ok(())
    }

    /// Initialize the config directory and create a default config
    pub fn init() -> Result<InitResult, Box<dyn std::error::Error>> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            Config::default().save()?;
            Ok(InitResult::Created(config_path))
        } else {
            Ok(InitResult::AlreadyExists(config_path))
        }
    }

    /// Print configuration as TOML
    pub fn print(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        println!("{}", content);
        Ok(())
    }

    /// The default config file path (`~/.claude/ccpulse/config.toml`)
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Directory holding config and hook logs (`~/.claude/ccpulse/`)
    pub fn data_dir() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            home.join(".claude").join("ccpulse")
        } else {
            PathBuf::from(".claude/ccpulse")
        }
    }

    /// Path of the hook log for a session (`~/.claude/ccpulse/hooks/{id}.jsonl`)
    pub fn hook_log_path(session_id: &str) -> PathBuf {
        // Session ids come from the agent CLI; strip path separators so a
        // hostile id can't escape the hooks directory
        let safe: String = session_id
            .chars()
            .map(|c| if c == '/' || c == '\\' || c == '.' { '_' } else { c })
            .collect();
        Self::data_dir().join("hooks").join(format!("{}.jsonl", safe))
    }
}
