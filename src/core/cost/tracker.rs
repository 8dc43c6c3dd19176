//! Incremental token/cost tracking
//!
//! [`CostTracker`] consumes a chronological stream of hook events and keeps
//! running token counters. Token counts are heuristic: payloads are
//! serialized to JSON text and sized at ~4 characters per token. Cost is
//! computed at read time from the cumulative counters and the currently
//! selected model's rate; there is no per-event cost ledger, so switching
//! models mid-session reprices the whole total.
//!
//! The tracker is a single-owner accumulator: one ingestion loop per
//! session, no interior synchronization. Duplicate events double count;
//! deduplication belongs to whoever delivers the events.

use super::events::{HookEvent, EVENT_POST_TOOL_USE, EVENT_USER_PROMPT_SUBMIT};
use super::pricing::{is_pricing_stale, merge_pricing, PricingOverride, PricingTable};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

/// Heuristic divisor: roughly this many serialized characters per token
const CHARS_PER_TOKEN: f64 = 4.0;

/// Read-time view of accumulated usage and its dollar estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSnapshot {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    /// True when the pricing table's last_updated date is too old to trust
    pub pricing_stale: bool,
}

/// Running token/cost accumulator for one session
#[derive(Debug, Clone)]
pub struct CostTracker {
    input_tokens: u64,
    output_tokens: u64,
    model: String,
    pricing: PricingTable,
}

impl Default for CostTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CostTracker {
    /// Create a tracker with default pricing and the sonnet-tier fallback
    /// rate selected
    pub fn new() -> Self {
        Self {
            input_tokens: 0,
            output_tokens: 0,
            model: String::new(),
            pricing: PricingTable::default(),
        }
    }

    /// Process one event. Counters only ever grow; unknown event kinds are
    /// ignored.
    pub fn process_event(&mut self, event: &HookEvent) {
        match event.kind.as_str() {
            EVENT_POST_TOOL_USE => {
                if let Some(input) = &event.tool_input {
                    self.input_tokens += estimate_tokens_json(input);
                }
                if let Some(response) = &event.tool_response {
                    self.output_tokens += estimate_tokens_json(response);
                }
            }
            EVENT_USER_PROMPT_SUBMIT => {
                if let Some(prompt) = &event.prompt {
                    self.input_tokens += estimate_tokens_text(prompt);
                }
            }
            _ => {} // Not an error: other lifecycle events carry no usage
        }
    }

    /// Compute the current snapshot. `today` is injected so staleness checks
    /// stay deterministic; reads never mutate the tracker.
    pub fn snapshot(&self, today: NaiveDate) -> CostSnapshot {
        let rates = self.pricing.rates_for(&self.model);

        let input_cost = self.input_tokens as f64 / 1_000_000.0 * rates.input;
        let output_cost = self.output_tokens as f64 / 1_000_000.0 * rates.output;

        CostSnapshot {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
            pricing_stale: is_pricing_stale(&self.pricing.last_updated, today),
        }
    }

    /// Select the model whose rates future snapshots use. Accumulated
    /// tokens are not repriced per event; cost is always read-time.
    pub fn set_model(&mut self, model_id: &str) {
        self.model = model_id.to_string();
    }

    /// Merge a pricing override into the active table
    pub fn set_pricing(&mut self, override_table: Option<&PricingOverride>) {
        let base = std::mem::take(&mut self.pricing);
        self.pricing = merge_pricing(base, override_table);
    }

    /// Zero the counters. Pricing and model selection are untouched.
    pub fn reset(&mut self) {
        self.input_tokens = 0;
        self.output_tokens = 0;
    }
}

/// Estimate tokens for a structured payload from its canonical JSON text
fn estimate_tokens_json(value: &Value) -> u64 {
    let serialized = value.to_string();
    estimate_tokens_text(&serialized)
}

/// Estimate tokens for plain text: character count over a fixed divisor,
/// rounded to nearest
fn estimate_tokens_text(text: &str) -> u64 {
    (text.chars().count() as f64 / CHARS_PER_TOKEN).round() as u64
}
