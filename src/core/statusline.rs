//! Statusline rendering
//!
//! Turns a [`Classification`] (plus optional cost snapshot) into colored
//! text lines. Pure string assembly: every decision about what is shown
//! was already made by the classifier and the cost tracker.
//!
//! Output format examples:
//! - Main line: `[icon] writing: src/main.rs (5s) | Sonnet 4.5 | $0.15`
//! - Tools line: `[check] Read x3 | [check] Grep x2`

use crate::config::{AnsiColor, DisplayConfig};
use crate::core::activity::{
    format_duration, truncate_string, ActivityState, AnimationHint, Classification,
    SessionSnapshot,
};
use crate::core::cost::CostSnapshot;
use std::collections::HashMap;
use std::time::SystemTime;

/// Completed tool marker
const COMPLETED_ICON: &str = "\u{2713}";

/// Separator between segments on one line
const SEPARATOR: &str = " | ";

/// Spinner frames per animation family
fn frames(hint: AnimationHint) -> &'static [&'static str] {
    match hint {
        AnimationHint::Scan => &["\u{25D0}", "\u{25D3}", "\u{25D1}", "\u{25D2}"],
        AnimationHint::Build => &["\u{2596}", "\u{2598}", "\u{259D}", "\u{2597}"],
        AnimationHint::Crunch => &[
            "\u{280B}", "\u{2819}", "\u{2839}", "\u{2838}", "\u{283C}", "\u{2834}", "\u{2826}",
            "\u{2827}",
        ],
        AnimationHint::Pulse => &["\u{25CF}", "\u{25C9}", "\u{25CB}", "\u{25C9}"],
        AnimationHint::Rest => &["\u{00B7}"],
    }
}

/// Apply ANSI color to text
fn apply_color(text: &str, color: Option<&AnsiColor>) -> String {
    match color {
        Some(AnsiColor::Color16 { c16 }) => {
            let code = if *c16 < 8 { 30 + c16 } else { 90 + (c16 - 8) };
            format!("\x1b[{}m{}\x1b[0m", code, text)
        }
        Some(AnsiColor::Color256 { c256 }) => {
            format!("\x1b[38;5;{}m{}\x1b[0m", c256, text)
        }
        Some(AnsiColor::Rgb { r, g, b }) => {
            format!("\x1b[38;2;{};{};{}m{}\x1b[0m", r, g, b, text)
        }
        None => text.to_string(),
    }
}

/// Format a dollar amount, widening precision for sub-cent values
fn format_cost(cost: f64) -> String {
    if cost > 0.0 && cost < 0.01 {
        format!("${:.4}", cost)
    } else {
        format!("${:.2}", cost)
    }
}

/// Statusline renderer configured by [`DisplayConfig`]
pub struct StatusLineRenderer {
    config: DisplayConfig,
}

impl StatusLineRenderer {
    pub fn new(config: DisplayConfig) -> Self {
        Self { config }
    }

    /// Render all lines for one poll: the main activity line, then the
    /// completed-tools summary when enabled and non-empty.
    ///
    /// `frame` is an invocation counter used to advance the spinner;
    /// callers without one can pass 0.
    pub fn render(
        &self,
        classification: &Classification,
        snapshot: &SessionSnapshot,
        model_name: Option<&str>,
        cost: Option<&CostSnapshot>,
        now: SystemTime,
        frame: usize,
    ) -> Vec<String> {
        let mut lines = vec![self.render_main_line(classification, model_name, cost, now, frame)];

        if self.config.show_tools_line {
            if let Some(line) = self.render_tools_line(snapshot) {
                lines.push(line);
            }
        }

        lines
    }

    /// Main line: `{icon} {label}: {detail} ({elapsed}) | {model} | {cost}`
    fn render_main_line(
        &self,
        classification: &Classification,
        model_name: Option<&str>,
        cost: Option<&CostSnapshot>,
        now: SystemTime,
        frame: usize,
    ) -> String {
        let colors = &self.config.colors;

        let state = classification.state;
        let state_color = match state {
            ActivityState::Pressure => colors.alert.as_ref(),
            ActivityState::Celebrating => colors.success.as_ref(),
            _ => colors.state.as_ref(),
        };

        let frame_set = frames(state.animation());
        let icon_glyph = if self.config.animate {
            frame_set[frame % frame_set.len()]
        } else {
            frame_set[0]
        };
        let icon = apply_color(icon_glyph, state_color);
        let label = apply_color(state.label(), state_color);
        // The configured cap applies on top of the classifier's own limit
        let detail_text = truncate_string(&classification.detail, self.config.max_detail_len);
        let detail = apply_color(&detail_text, colors.detail.as_ref());

        let mut segments = Vec::new();

        let elapsed_part = classification
            .since
            .map(|since| now.duration_since(since).unwrap_or_default())
            .map(|d| apply_color(&format!("({})", format_duration(d)), colors.dim.as_ref()))
            .map(|e| format!(" {}", e))
            .unwrap_or_default();

        segments.push(format!("{} {}: {}{}", icon, label, detail, elapsed_part));

        if let Some(name) = model_name {
            segments.push(name.to_string());
        }

        if self.config.show_cost {
            if let Some(cost) = cost {
                let mut part = format_cost(cost.total_cost);
                if cost.pricing_stale {
                    part.push_str(&apply_color(" (pricing stale)", colors.dim.as_ref()));
                }
                segments.push(part);
            }
        }

        segments.join(SEPARATOR)
    }

    /// Tools line: completed tool counts sorted by frequency, e.g.
    /// `[check] Read x3 | [check] Grep x2`. None when nothing completed.
    fn render_tools_line(&self, snapshot: &SessionSnapshot) -> Option<String> {
        let colors = &self.config.colors;

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for tool in snapshot.completed_tools() {
            *counts.entry(tool.name.as_str()).or_insert(0) += 1;
        }

        if counts.is_empty() {
            return None;
        }

        let mut stats: Vec<(&str, usize)> = counts.into_iter().collect();
        // Frequency order, name as tiebreaker for stable output
        stats.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

        let parts: Vec<String> = stats
            .into_iter()
            .map(|(name, count)| {
                let icon = apply_color(COMPLETED_ICON, colors.success.as_ref());
                let name = apply_color(name, colors.state.as_ref());
                if count > 1 {
                    let count = apply_color(&format!("x{}", count), colors.dim.as_ref());
                    format!("{} {} {}", icon, name, count)
                } else {
                    format!("{} {}", icon, name)
                }
            })
            .collect();

        Some(parts.join(SEPARATOR))
    }
}

/// Strip ANSI escape sequences from text (for testing)
#[cfg(test)]
fn strip_ansi(text: &str) -> String {
    let mut result = String::new();
    let mut in_escape = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            in_escape = true;
            if chars.peek() == Some(&'[') {
                chars.next();
            }
        } else if in_escape {
            if ch.is_alphabetic() {
                in_escape = false;
            }
        } else {
            result.push(ch);
        }
    }

    result
}
