//! Weight vectors and the per-day weight timeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Relative tolerance for "weights sum to one".
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Mapping ticker → non-negative portfolio weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightVector(BTreeMap<String, f64>);

impl WeightVector {
    /// Pair `tickers[i]` with `weights[i]`.
    ///
    /// Extra entries on either side are ignored.
    pub fn from_slices(tickers: &[String], weights: &[f64]) -> Self {
        Self(
            tickers
                .iter()
                .zip(weights)
                .map(|(t, w)| (t.clone(), *w))
                .collect(),
        )
    }

    /// Weight of `ticker`, 0.0 if absent.
    pub fn get(&self, ticker: &str) -> f64 {
        self.0.get(ticker).copied().unwrap_or(0.0)
    }

    /// Weights in the order of `tickers`.
    pub fn to_vec(&self, tickers: &[String]) -> Vec<f64> {
        tickers.iter().map(|t| self.get(t)).collect()
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    /// True if the weights sum to 1.0 within [`WEIGHT_SUM_TOLERANCE`].
    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
    }

    /// Σ |self − other| over the union of tickers.
    pub fn turnover_to(&self, other: &WeightVector) -> f64 {
        self.union_keys(other)
            .map(|t| (self.get(t) - other.get(t)).abs())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.0.iter().map(|(t, w)| (t.as_str(), *w))
    }

    fn union_keys<'a>(&'a self, other: &'a WeightVector) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .keys()
            .chain(other.0.keys().filter(move |k| !self.0.contains_key(*k)))
            .map(String::as_str)
    }
}

impl FromIterator<(String, f64)> for WeightVector {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Weights in force on a date.
///
/// Every trading day gets one snapshot taken before the day's return is
/// applied. A rebalance day gets a second snapshot with `rebalance = true`
/// holding the reset weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSnapshot {
    pub date: NaiveDate,
    pub weights: WeightVector,
    pub rebalance: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wv(pairs: &[(&str, f64)]) -> WeightVector {
        pairs.iter().map(|(t, w)| (t.to_string(), *w)).collect()
    }

    #[test]
    fn turnover_sums_absolute_changes() {
        let drifted = wv(&[("A", 0.6), ("B", 0.4)]);
        let target = wv(&[("A", 0.5), ("B", 0.5)]);
        assert!((drifted.turnover_to(&target) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn turnover_counts_tickers_missing_on_one_side() {
        let a = wv(&[("A", 1.0)]);
        let b = wv(&[("B", 1.0)]);
        assert!((a.turnover_to(&b) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn normalized_check() {
        assert!(wv(&[("A", 0.25), ("B", 0.75)]).is_normalized());
        assert!(!wv(&[("A", 0.25), ("B", 0.7)]).is_normalized());
    }

    #[test]
    fn serializes_as_plain_map() {
        let json = serde_json::to_string(&wv(&[("A", 0.5), ("B", 0.5)])).unwrap();
        assert_eq!(json, r#"{"A":0.5,"B":0.5}"#);
    }
}
