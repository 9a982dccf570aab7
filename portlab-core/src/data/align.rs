//! Multi-ticker time alignment.
//!
//! Given histories for several tickers, keep only the dates every ticker
//! traded on. No void bars and no forward-fill: a date missing from any
//! history is dropped from the run.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::info;

use super::error::DataError;
use crate::domain::AssetSeries;

/// Histories re-sliced onto the common trading calendar.
#[derive(Debug, Clone)]
pub struct AlignedUniverse {
    /// Sorted intersection of all tickers' dates. Never empty.
    pub calendar: Vec<NaiveDate>,
    /// Tickers in caller order.
    pub tickers: Vec<String>,
    /// One series per ticker, each with exactly `calendar.len()` bars.
    pub series: HashMap<String, AssetSeries>,
}

impl AlignedUniverse {
    /// Close prices for `ticker` on the common calendar.
    pub fn closes(&self, ticker: &str) -> Option<Vec<f64>> {
        self.series.get(ticker).map(AssetSeries::closes)
    }

    pub fn len(&self) -> usize {
        self.calendar.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendar.is_empty()
    }
}

/// Intersect the date sets of `tickers` and slice every history to it.
///
/// Fails with [`DataError::DuplicateTicker`] if a ticker is listed twice,
/// [`DataError::NoOverlap`] if the intersection is empty, and
/// [`DataError::BadClose`] if a retained close cannot be used to form a
/// return.
pub fn align_series(
    tickers: &[String],
    histories: &HashMap<String, AssetSeries>,
) -> Result<AlignedUniverse, DataError> {
    if tickers.is_empty() {
        return Err(DataError::EmptyUniverse);
    }
    let mut seen = HashSet::with_capacity(tickers.len());
    if let Some(dup) = tickers.iter().find(|t| !seen.insert(t.as_str())) {
        return Err(DataError::DuplicateTicker {
            ticker: dup.clone(),
        });
    }

    let mut common: Option<BTreeSet<NaiveDate>> = None;
    for ticker in tickers {
        let series = histories
            .get(ticker)
            .ok_or_else(|| DataError::MissingHistory {
                ticker: ticker.clone(),
            })?;
        let dates: BTreeSet<NaiveDate> = series.dates().collect();
        common = Some(match common {
            None => dates,
            Some(acc) => acc.intersection(&dates).copied().collect(),
        });
    }

    let calendar: Vec<NaiveDate> = common.unwrap_or_default().into_iter().collect();
    if calendar.is_empty() {
        return Err(DataError::NoOverlap {
            assets: tickers.len(),
        });
    }

    let keep: HashSet<NaiveDate> = calendar.iter().copied().collect();
    let mut series = HashMap::with_capacity(tickers.len());
    for ticker in tickers {
        // Presence checked in the intersection loop above.
        let Some(history) = histories.get(ticker) else {
            continue;
        };
        let sliced = history.restrict_to(&keep);
        if let Some(bad) = sliced
            .bars()
            .iter()
            .find(|b| !b.close.is_finite() || b.close <= 0.0)
        {
            return Err(DataError::BadClose {
                ticker: ticker.clone(),
                date: bad.date.to_string(),
            });
        }
        series.insert(ticker.clone(), sliced);
    }

    info!(
        assets = tickers.len(),
        dates = calendar.len(),
        "aligned assets to common calendar"
    );

    Ok(AlignedUniverse {
        calendar,
        tickers: tickers.to_vec(),
        series,
    })
}
