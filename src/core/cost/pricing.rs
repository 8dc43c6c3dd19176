//! Pricing tables for token cost estimation
//!
//! Per-model-family input/output prices in dollars per million tokens, plus
//! a last-updated date used for staleness warnings. Tables are mergeable:
//! a partial override from the config file replaces whole families, never
//! individual fields within one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A pricing table older than this many days is flagged stale
pub const STALENESS_THRESHOLD_DAYS: i64 = 90;

/// Input/output price for one model family, in dollars per million tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelRates {
    pub input: f64,
    pub output: f64,
}

/// Active pricing for the known model families
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTable {
    pub sonnet: ModelRates,
    pub opus: ModelRates,
    pub haiku: ModelRates,
    /// ISO date (YYYY-MM-DD) the rates were last verified
    pub last_updated: String,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            sonnet: ModelRates {
                input: 3.0,
                output: 15.0,
            },
            opus: ModelRates {
                input: 15.0,
                output: 75.0,
            },
            haiku: ModelRates {
                input: 0.25,
                output: 1.25,
            },
            last_updated: "2026-06-01".to_string(),
        }
    }
}

impl PricingTable {
    /// Select rates for a model identifier by fuzzy match: an id containing
    /// "opus" gets opus rates, "haiku" gets haiku rates, everything else
    /// falls back to sonnet.
    pub fn rates_for(&self, model_id: &str) -> ModelRates {
        let lower = model_id.to_lowercase();
        if lower.contains("opus") {
            self.opus
        } else if lower.contains("haiku") {
            self.haiku
        } else {
            self.sonnet
        }
    }
}

/// Partial rates as they appear in a config override. A family override is
/// applied only when both prices are present; half-specified families are
/// ignored rather than half-merged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RatesOverride {
    pub input: Option<f64>,
    pub output: Option<f64>,
}

impl RatesOverride {
    fn complete(&self) -> Option<ModelRates> {
        match (self.input, self.output) {
            (Some(input), Some(output)) => Some(ModelRates { input, output }),
            _ => None,
        }
    }
}

/// Partial pricing table from the config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingOverride {
    pub sonnet: Option<RatesOverride>,
    pub opus: Option<RatesOverride>,
    pub haiku: Option<RatesOverride>,
    pub last_updated: Option<String>,
}

/// Merge a partial override into a base table.
///
/// With no override the base is returned unchanged (moved, not rebuilt).
/// Families present and complete in the override replace the base family
/// wholesale; `last_updated` is replaced when present; everything else keeps
/// the base value.
pub fn merge_pricing(base: PricingTable, override_table: Option<&PricingOverride>) -> PricingTable {
    let ov = match override_table {
        Some(ov) => ov,
        None => return base,
    };

    let mut merged = base;

    if let Some(rates) = ov.sonnet.as_ref().and_then(RatesOverride::complete) {
        merged.sonnet = rates;
    }
    if let Some(rates) = ov.opus.as_ref().and_then(RatesOverride::complete) {
        merged.opus = rates;
    }
    if let Some(rates) = ov.haiku.as_ref().and_then(RatesOverride::complete) {
        merged.haiku = rates;
    }
    if let Some(date) = &ov.last_updated {
        merged.last_updated = date.clone();
    }

    merged
}

/// Check whether a pricing date is stale relative to `today`.
///
/// True when the date is more than [`STALENESS_THRESHOLD_DAYS`] in the past.
/// Unparsable dates are treated as stale so the warning errs toward showing.
/// Today and future dates are not stale.
pub fn is_pricing_stale(date_str: &str, today: NaiveDate) -> bool {
    let parsed = match NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => return true, // Fail safe: warn on dates we can't read
    };

    (today - parsed).num_days() > STALENESS_THRESHOLD_DAYS
}
