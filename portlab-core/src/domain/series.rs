//! AssetSeries: one ticker's ordered price history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::bar::Bar;
use crate::data::DataError;

/// Ordered-by-date OHLCV history for one ticker.
///
/// Dates are strictly increasing. The constructor enforces this; the engine
/// only ever reads a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSeries {
    ticker: String,
    bars: Vec<Bar>,
}

impl AssetSeries {
    /// Build a series, rejecting out-of-order or duplicate dates.
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Result<Self, DataError> {
        let ticker = ticker.into();
        if bars.windows(2).any(|w| w[1].date <= w[0].date) {
            return Err(DataError::UnsortedDates { ticker });
        }
        Ok(Self { ticker, bars })
    }

    /// Build a close-only series from `(date, close)` pairs.
    pub fn from_closes(
        ticker: impl Into<String>,
        closes: &[(NaiveDate, f64)],
    ) -> Result<Self, DataError> {
        let bars = closes
            .iter()
            .map(|&(date, close)| Bar::from_close(date, close))
            .collect();
        Self::new(ticker, bars)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.bars.iter().map(|b| b.date)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Keep only the bars whose date is in `dates`, preserving order.
    pub fn restrict_to(&self, dates: &HashSet<NaiveDate>) -> Self {
        Self {
            ticker: self.ticker.clone(),
            bars: self
                .bars
                .iter()
                .filter(|b| dates.contains(&b.date))
                .cloned()
                .collect(),
        }
    }
}
