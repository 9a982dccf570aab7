//! Simulation configuration and output types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::WeightSnapshot;
use crate::error::ConfigError;
use crate::rebalance::RebalancePolicy;

/// Default transaction cost per unit of turnover (0.1%).
pub const DEFAULT_TRANSACTION_COST: f64 = 0.001;

/// Knobs for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub policy: RebalancePolicy,
    /// Fraction of portfolio value charged per unit of turnover.
    pub transaction_cost: f64,
}

impl SimulationConfig {
    pub fn new(policy: RebalancePolicy, transaction_cost: f64) -> Result<Self, ConfigError> {
        if !(transaction_cost.is_finite() && (0.0..1.0).contains(&transaction_cost)) {
            return Err(ConfigError::invalid(
                "transaction_cost",
                format!("must lie in [0, 1), got {transaction_cost}"),
            ));
        }
        Ok(Self {
            policy,
            transaction_cost,
        })
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            policy: RebalancePolicy::none(),
            transaction_cost: DEFAULT_TRANSACTION_COST,
        }
    }
}

/// One executed rebalance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceEvent {
    pub date: NaiveDate,
    /// Σ |target − drifted| across assets.
    pub turnover: f64,
    /// Portfolio value lost to the cost deduction (normalized units).
    pub cost: f64,
    /// Portfolio value just before the deduction.
    pub value_before: f64,
}

/// Everything the day loop produces.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Common calendar.
    pub dates: Vec<NaiveDate>,
    /// End-of-day portfolio value, after any rebalance cost. Starts near 1.0.
    pub values: Vec<f64>,
    /// `values[t] / values[t-1] - 1`, with an implicit opening value of 1.0.
    pub returns: Vec<f64>,
    /// Gated return series per ticker on the common calendar.
    pub asset_returns: HashMap<String, Vec<f64>>,
    /// Weight timeline (one entry per day, two on rebalance days).
    pub snapshots: Vec<WeightSnapshot>,
    /// Executed rebalances in date order.
    pub rebalances: Vec<RebalanceEvent>,
}

impl SimulationResult {
    pub fn rebalance_dates(&self) -> Vec<NaiveDate> {
        self.rebalances.iter().map(|e| e.date).collect()
    }

    /// Sum of value lost to rebalance costs, in normalized units.
    pub fn total_transaction_costs(&self) -> f64 {
        self.rebalances.iter().map(|e| e.cost).sum()
    }

    /// Mean turnover per rebalance, 0.0 with no rebalances.
    pub fn average_turnover(&self) -> f64 {
        if self.rebalances.is_empty() {
            return 0.0;
        }
        self.rebalances.iter().map(|e| e.turnover).sum::<f64>() / self.rebalances.len() as f64
    }

    pub fn final_value(&self) -> f64 {
        self.values.last().copied().unwrap_or(1.0)
    }
}
