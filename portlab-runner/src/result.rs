//! Portfolio run result record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use portlab_core::domain::WeightSnapshot;
use portlab_core::equity::EquityPoint;
use portlab_core::error::RunWarning;

use crate::config::RunId;
use crate::metrics::{AssetMetrics, PortfolioMetrics};

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one portfolio run.
///
/// Contains:
/// - Portfolio and per-asset metrics
/// - Equity curve (display only)
/// - Weight timeline, two entries on rebalance days
/// - Rebalance dates
/// - Warnings for conditions the engine recovered from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Config hash, set when the run came from a [`crate::config::RunConfig`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,

    /// Hash of the price data, set when the runner loaded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_hash: Option<String>,

    /// True when prices were generated rather than loaded.
    #[serde(default)]
    pub synthetic: bool,

    pub tickers: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    pub portfolio_metrics: PortfolioMetrics,
    pub asset_metrics: Vec<AssetMetrics>,
    pub equity_curve: Vec<EquityPoint>,
    pub weights_timeline: Vec<WeightSnapshot>,
    pub rebalance_dates: Vec<NaiveDate>,

    #[serde(default)]
    pub warnings: Vec<RunWarning>,
}

/// Default schema version for older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl PortfolioResult {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn final_equity(&self) -> f64 {
        self.equity_curve.last().map_or(0.0, |p| p.equity)
    }

    pub fn asset(&self, ticker: &str) -> Option<&AssetMetrics> {
        self.asset_metrics.iter().find(|m| m.ticker == ticker)
    }
}
