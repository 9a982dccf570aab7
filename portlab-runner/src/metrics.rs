//! Portfolio and per-asset metrics: pure functions over return series.
//!
//! Every figure is derived from daily returns, never from the display
//! equity curve. Annualization assumes 252 periods; the risk-free rate is 0.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use portlab_core::domain::WeightVector;
use portlab_core::engine::SimulationResult;
use portlab_core::stats::{self, PERIODS_PER_YEAR};

/// Ticker × ticker correlation table.
pub type CorrelationMatrix = BTreeMap<String, BTreeMap<String, f64>>;

/// Aggregate statistics for one portfolio run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub num_rebalances: usize,
    /// Mean turnover per rebalance event.
    pub turnover: f64,
    pub diversification_ratio: f64,
    pub correlation_matrix: CorrelationMatrix,
    /// Value lost to rebalance costs, scaled by the run's initial value.
    pub total_transaction_costs: f64,
    /// Costs as a percentage of what the portfolio would hold without them.
    pub transaction_cost_impact_pct: f64,
}

/// Statistics for one asset's gated return series held alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetMetrics {
    pub ticker: String,
    /// Target weight.
    pub weight: f64,
    pub total_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    /// `total_return × weight`.
    ///
    /// A linear approximation: under drift and rebalancing the contributions
    /// do not sum to the portfolio's total return.
    pub contribution_to_return: f64,
}

impl PortfolioMetrics {
    /// Compute all portfolio metrics from a finished simulation.
    pub fn compute(
        sim: &SimulationResult,
        tickers: &[String],
        target: &WeightVector,
        initial_value: f64,
    ) -> Self {
        let returns = &sim.returns;
        let total = total_return(returns);
        let vol = volatility(returns);
        let annualized = annualized_return(total, returns.len());

        let asset_vols: Vec<(f64, f64)> = tickers
            .iter()
            .map(|t| {
                let series = sim.asset_returns.get(t).map_or(&[][..], Vec::as_slice);
                (target.get(t), volatility(series))
            })
            .collect();

        let costs = sim.total_transaction_costs();
        Self {
            total_return: total,
            annualized_return: annualized,
            volatility: vol,
            sharpe_ratio: ratio_or_zero(annualized, vol),
            max_drawdown: stats::max_drawdown(returns),
            win_rate: stats::win_rate(returns),
            num_rebalances: sim.rebalances.len(),
            turnover: sim.average_turnover(),
            diversification_ratio: diversification_ratio(&asset_vols, vol),
            correlation_matrix: correlation_matrix(tickers, &sim.asset_returns),
            total_transaction_costs: costs * initial_value,
            transaction_cost_impact_pct: cost_impact_pct(costs, sim.final_value()),
        }
    }
}

impl AssetMetrics {
    pub fn compute(ticker: &str, gated_returns: &[f64], weight: f64) -> Self {
        let total = total_return(gated_returns);
        let vol = volatility(gated_returns);
        let annual_mean = stats::mean(gated_returns) * PERIODS_PER_YEAR;
        Self {
            ticker: ticker.to_string(),
            weight,
            total_return: total,
            volatility: vol,
            sharpe_ratio: ratio_or_zero(annual_mean, vol),
            max_drawdown: stats::max_drawdown(gated_returns),
            win_rate: stats::win_rate(gated_returns),
            contribution_to_return: total * weight,
        }
    }
}

/// One [`AssetMetrics`] per ticker, in ticker order.
pub fn asset_metrics(
    sim: &SimulationResult,
    tickers: &[String],
    target: &WeightVector,
) -> Vec<AssetMetrics> {
    tickers
        .iter()
        .map(|t| {
            let series = sim.asset_returns.get(t).map_or(&[][..], Vec::as_slice);
            AssetMetrics::compute(t, series, target.get(t))
        })
        .collect()
}

// ─── Individual metric functions ────────────────────────────────────

/// Π(1 + r) − 1.
pub fn total_return(returns: &[f64]) -> f64 {
    stats::cumulative_growth(returns)
        .last()
        .map_or(0.0, |g| g - 1.0)
}

/// `(1 + total)^(252 / periods) − 1`.
///
/// Returns 0.0 for an empty series, and −1.0 once the path is wiped out.
pub fn annualized_return(total_return: f64, periods: usize) -> f64 {
    if periods == 0 {
        return 0.0;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(PERIODS_PER_YEAR / periods as f64) - 1.0
}

/// Sample standard deviation of daily returns × √252.
pub fn volatility(returns: &[f64]) -> f64 {
    stats::std_dev(returns) * PERIODS_PER_YEAR.sqrt()
}

/// Weighted sum of asset volatilities over portfolio volatility.
///
/// `assets` holds `(weight, annualized volatility)` pairs. A portfolio with
/// no volatility reports 1.0.
pub fn diversification_ratio(assets: &[(f64, f64)], portfolio_volatility: f64) -> f64 {
    if portfolio_volatility < 1e-15 {
        return 1.0;
    }
    let weighted: f64 = assets.iter().map(|(w, v)| w * v).sum();
    weighted / portfolio_volatility
}

/// Pairwise Pearson correlation of the given series.
///
/// Symmetric with a unit diagonal. A pair involving a series with no
/// variance has no defined correlation and is reported as 0.0.
pub fn correlation_matrix(
    tickers: &[String],
    series: &std::collections::HashMap<String, Vec<f64>>,
) -> CorrelationMatrix {
    let empty = Vec::new();
    let mut matrix = CorrelationMatrix::new();
    for a in tickers {
        let row = matrix.entry(a.clone()).or_default();
        for b in tickers {
            let value = if a == b {
                1.0
            } else {
                let ra = series.get(a).unwrap_or(&empty);
                let rb = series.get(b).unwrap_or(&empty);
                stats::pearson(ra, rb).unwrap_or(0.0)
            };
            row.insert(b.clone(), value);
        }
    }
    matrix
}

/// Costs as a percentage of the cost-free final value.
pub fn cost_impact_pct(total_costs: f64, final_value: f64) -> f64 {
    let gross = final_value + total_costs;
    if total_costs <= 0.0 || gross <= 0.0 {
        return 0.0;
    }
    total_costs / gross * 100.0
}

fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator < 1e-15 {
        0.0
    } else {
        numerator / denominator
    }
}
