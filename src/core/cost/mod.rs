//! Cost estimation module
//!
//! This module provides functionality for:
//! - Parsing hook events from the append-only session log
//! - Accumulating heuristic token counts per session
//! - Pricing tables with merge and staleness semantics

pub mod events;
pub mod pricing;
pub mod tracker;

// Re-export commonly used items
pub use events::{read_hook_log, HookEvent, EVENT_POST_TOOL_USE, EVENT_USER_PROMPT_SUBMIT};
pub use pricing::{
    is_pricing_stale, merge_pricing, ModelRates, PricingOverride, PricingTable, RatesOverride,
    STALENESS_THRESHOLD_DAYS,
};
pub use tracker::{CostSnapshot, CostTracker};
