//! Rebalance policy: decides, once per day, whether to reset to target.
//!
//! The policy is chosen once per run and evaluated as a pure function of
//! today's date, the last rebalance date, and the drifted and target
//! weights. It holds no per-day state.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Default drift threshold for [`Rebalancing::Threshold`].
pub const DEFAULT_REBALANCE_THRESHOLD: f64 = 0.05;

/// Rebalancing schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rebalancing {
    /// Buy and let drift.
    #[default]
    None,
    /// First trading day whose month differs from the last rebalance month.
    Monthly,
    /// First trading day in a new (year, quarter).
    Quarterly,
    /// Any weight more than the threshold away from target.
    Threshold,
}

impl Rebalancing {
    pub fn as_str(self) -> &'static str {
        match self {
            Rebalancing::None => "none",
            Rebalancing::Monthly => "monthly",
            Rebalancing::Quarterly => "quarterly",
            Rebalancing::Threshold => "threshold",
        }
    }
}

impl fmt::Display for Rebalancing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rebalancing {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "threshold" => Ok(Self::Threshold),
            other => Err(ConfigError::UnknownRebalancing(other.to_string())),
        }
    }
}

/// A rebalancing schedule plus its drift threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebalancePolicy {
    pub schedule: Rebalancing,
    /// Only read by [`Rebalancing::Threshold`].
    pub threshold: f64,
}

impl RebalancePolicy {
    pub fn new(schedule: Rebalancing, threshold: f64) -> Result<Self, ConfigError> {
        if schedule == Rebalancing::Threshold && !(threshold.is_finite() && threshold > 0.0) {
            return Err(ConfigError::invalid(
                "rebalance_threshold",
                format!("must be a positive finite number, got {threshold}"),
            ));
        }
        Ok(Self {
            schedule,
            threshold,
        })
    }

    pub fn none() -> Self {
        Self {
            schedule: Rebalancing::None,
            threshold: DEFAULT_REBALANCE_THRESHOLD,
        }
    }

    /// Whether to reset to target today.
    ///
    /// `current` and `target` are weights in the same ticker order.
    pub fn should_rebalance(
        &self,
        today: NaiveDate,
        last_rebalance: NaiveDate,
        current: &[f64],
        target: &[f64],
    ) -> bool {
        match self.schedule {
            Rebalancing::None => false,
            Rebalancing::Monthly => today.month() != last_rebalance.month(),
            Rebalancing::Quarterly => {
                (today.year(), quarter(today)) != (last_rebalance.year(), quarter(last_rebalance))
            }
            Rebalancing::Threshold => current
                .iter()
                .zip(target)
                .any(|(c, t)| (c - t).abs() > self.threshold),
        }
    }
}

/// Zero-based calendar quarter.
fn quarter(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3
}
