//! Equity curve for display.
//!
//! Charting only. Metrics are computed from the return series directly so
//! that repeated compounding here never feeds back into reported figures.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One point on an equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Cumulative product of `(1 + r)` scaled by `initial_value`, paired with dates.
///
/// Extra entries on either side are ignored.
pub fn build_equity_curve(
    dates: &[NaiveDate],
    returns: &[f64],
    initial_value: f64,
) -> Vec<EquityPoint> {
    let mut equity = initial_value;
    dates
        .iter()
        .zip(returns)
        .map(|(&date, r)| {
            equity *= 1.0 + r;
            EquityPoint { date, equity }
        })
        .collect()
}
