//! Position signals: the engine's only contract with strategy rules.
//!
//! A signal series carries an explicit state for every date it covers.
//! "Flat" (the rule says stay out) and "no data yet" (the rule cannot decide,
//! e.g. during indicator warm-up) are distinct values. Both gate an asset's
//! return to zero; a date missing from the series gates to zero as well.
//! Nothing is forward-filled: a rule that wants to carry a position must emit
//! it on every date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Position state on a single date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Holding the asset.
    Long,
    /// Out of the market by decision.
    Flat,
    /// The rule has not produced a decision for this date.
    NoData,
}

impl Position {
    /// Exposure multiplier applied to the next day's return (1 or 0).
    pub fn exposure(self) -> f64 {
        match self {
            Position::Long => 1.0,
            Position::Flat | Position::NoData => 0.0,
        }
    }

    /// Map a raw 0/1 value onto a position. Anything positive is long.
    pub fn from_value(value: f64) -> Self {
        if value.is_nan() {
            Position::NoData
        } else if value > 0.0 {
            Position::Long
        } else {
            Position::Flat
        }
    }
}

/// Per-ticker position series keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSeries {
    points: BTreeMap<NaiveDate, Position>,
}

impl SignalSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same position on every given date.
    pub fn constant(dates: impl IntoIterator<Item = NaiveDate>, position: Position) -> Self {
        Self {
            points: dates.into_iter().map(|d| (d, position)).collect(),
        }
    }

    /// Build from `(date, 0/1)` pairs as produced by external rule layers.
    pub fn from_values(values: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        Self {
            points: values
                .into_iter()
                .map(|(d, v)| (d, Position::from_value(v)))
                .collect(),
        }
    }

    pub fn insert(&mut self, date: NaiveDate, position: Position) {
        self.points.insert(date, position);
    }

    /// Position recorded for `date`, if any.
    pub fn position(&self, date: NaiveDate) -> Option<Position> {
        self.points.get(&date).copied()
    }

    /// Exposure on `date`; a missing entry counts as flat.
    pub fn exposure(&self, date: NaiveDate) -> f64 {
        self.position(date).map_or(0.0, Position::exposure)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Position)> + '_ {
        self.points.iter().map(|(d, p)| (*d, *p))
    }
}
