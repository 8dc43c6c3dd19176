//! ccpulse - activity-aware statusline for Claude Code
//!
//! Reads the statusline JSON payload from stdin, classifies what the
//! session is doing right now, and prints one or two lines of colored
//! status text with a running cost estimate.

use ccpulse::config::{models, Config, InitResult, InputData};
use ccpulse::core::activity::{classify, parse_transcript};
use ccpulse::core::cost::{read_hook_log, CostTracker};
use ccpulse::core::StatusLineRenderer;
use clap::{Parser, Subcommand};
use std::io::{self, Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser)]
#[command(name = "ccpulse")]
#[command(about = "Activity-aware statusline for Claude Code with running cost estimates")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a hook event (wire this to PostToolUse and UserPromptSubmit)
    Hook,
    /// Create a default config file if none exists
    Init,
    /// Print the effective configuration as TOML
    PrintConfig,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        None => render(),
        Some(Commands::Hook) => record_hook_event(),
        Some(Commands::Init) => init_config(),
        Some(Commands::PrintConfig) => Config::load().print(),
    };

    if let Err(e) = result {
        eprintln!("ccpulse: {}", e);
        std::process::exit(1);
    }
}

/// Default mode: read the poll payload from stdin and print status lines.
fn render() -> Result<(), Box<dyn std::error::Error>> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let input: InputData = serde_json::from_str(&buffer).unwrap_or_default();

    let config = Config::load();
    let now = SystemTime::now();

    let mut snapshot = parse_transcript(&input.transcript_path);
    snapshot.context_window_size = input
        .context_window_size
        .or_else(|| Some(models::context_limit(&input.model.id)));

    let classification = classify(&snapshot, now);

    let cost = input.session_id.as_deref().map(|session_id| {
        let mut tracker = CostTracker::new();
        tracker.set_model(&input.model.id);
        tracker.set_pricing(config.pricing.as_ref());
        for event in read_hook_log(Config::hook_log_path(session_id)) {
            tracker.process_event(&event);
        }
        tracker.snapshot(chrono::Local::now().date_naive())
    });

    let model_name = if !input.model.display_name.is_empty() {
        Some(input.model.display_name.clone())
    } else {
        models::display_name(&input.model.id)
    };

    // Each poll is a fresh process; drive the spinner off wall-clock seconds
    let frame = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or(0);

    let renderer = StatusLineRenderer::new(config.display);
    for line in renderer.render(
        &classification,
        &snapshot,
        model_name.as_deref(),
        cost.as_ref(),
        now,
        frame,
    ) {
        println!("{}", line);
    }

    Ok(())
}

/// Append one hook event from stdin to the session's JSONL log.
fn record_hook_event() -> Result<(), Box<dyn std::error::Error>> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let line = buffer.trim();
    if line.is_empty() {
        return Ok(());
    }

    // Validate and pull the session id, but persist the raw line so
    // fields we don't model yet survive for later versions.
    let value: serde_json::Value = serde_json::from_str(line)?;
    let session_id = value
        .get("session_id")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");

    let path = Config::hook_log_path(session_id);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{}", line)?;

    Ok(())
}

fn init_config() -> Result<(), Box<dyn std::error::Error>> {
    match Config::init()? {
        InitResult::Created(path) => println!("Created config at {}", path.display()),
        InitResult::AlreadyExists(path) => {
            println!("Config already exists at {}", path.display())
        }
    }
    Ok(())
}
