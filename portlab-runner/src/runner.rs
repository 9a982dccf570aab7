//! Portfolio runner: wires alignment, allocation, simulation and metrics.
//!
//! Three entry points:
//! - `run_portfolio()`: pre-loaded histories and signals, no I/O. Used by batches.
//! - `run_from_config()`: loads data per a `RunConfig`, applies its signal rule, then runs.
//! - `run_single_from_config()`: one ticker through the single-asset primitive.

use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

use portlab_core::allocation::initial_weights;
use portlab_core::data::align_series;
use portlab_core::domain::{AssetSeries, SignalSeries};
use portlab_core::engine::run_simulation;
use portlab_core::equity::build_equity_curve;
use portlab_core::error::EngineError;
use portlab_core::signals::SignalRule;
use portlab_core::single::{backtest_single, SingleAssetReport};

use crate::config::{ConfigFileError, DataConfig, PortfolioConfig, RunConfig};
use crate::data_loader::{load_universe, LoadError};
use crate::metrics::{asset_metrics, PortfolioMetrics};
use crate::result::{PortfolioResult, SCHEMA_VERSION};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigFileError),
    #[error("load error: {0}")]
    Load(#[from] LoadError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("ticker '{0}' not found in loaded data")]
    TickerNotFound(String),
}

/// Everything a run reads. Shared read-only across concurrent runs.
#[derive(Debug, Clone, Default)]
pub struct PortfolioInput {
    /// Universe in caller order.
    pub tickers: Vec<String>,
    pub histories: HashMap<String, AssetSeries>,
    /// Position series per ticker. A ticker with no entry is held throughout.
    pub signals: HashMap<String, SignalSeries>,
}

impl PortfolioInput {
    /// Histories with every ticker held throughout.
    pub fn held(tickers: Vec<String>, histories: HashMap<String, AssetSeries>) -> Self {
        Self {
            tickers,
            histories,
            signals: HashMap::new(),
        }
    }

    /// Histories with `rule` applied to each ticker.
    pub fn with_rule(
        tickers: Vec<String>,
        histories: HashMap<String, AssetSeries>,
        rule: &SignalRule,
    ) -> Self {
        let signals = histories
            .iter()
            .map(|(t, s)| (t.clone(), rule.generate(s)))
            .collect();
        Self {
            tickers,
            histories,
            signals,
        }
    }
}

/// Run one portfolio simulation on pre-loaded data. No I/O.
///
/// Fatal conditions abort with no partial result; fallbacks the allocator
/// takes are reported in [`PortfolioResult::warnings`].
pub fn run_portfolio(
    input: &PortfolioInput,
    config: &PortfolioConfig,
) -> Result<PortfolioResult, EngineError> {
    config.validate()?;
    let sim_config = config.simulation_config()?;

    let universe = align_series(&input.tickers, &input.histories)?;
    let allocation = initial_weights(
        &universe,
        config.allocation_method,
        &config.custom_weight_map(),
    )?;
    let target = allocation.weights;

    let sim = run_simulation(&universe, &input.signals, &target, &sim_config);

    let portfolio_metrics =
        PortfolioMetrics::compute(&sim, &universe.tickers, &target, config.initial_value);
    let assets = asset_metrics(&sim, &universe.tickers, &target);
    let equity_curve = build_equity_curve(&sim.dates, &sim.returns, config.initial_value);

    info!(
        assets = universe.tickers.len(),
        days = sim.dates.len(),
        rebalances = sim.rebalances.len(),
        total_return = portfolio_metrics.total_return,
        "portfolio run complete"
    );

    // align_series guarantees a non-empty calendar.
    let start_date = universe.calendar[0];
    let end_date = universe.calendar[universe.calendar.len() - 1];

    Ok(PortfolioResult {
        schema_version: SCHEMA_VERSION,
        run_id: None,
        dataset_hash: None,
        synthetic: false,
        rebalance_dates: sim.rebalance_dates(),
        tickers: universe.tickers,
        start_date,
        end_date,
        portfolio_metrics,
        asset_metrics: assets,
        equity_curve,
        weights_timeline: sim.snapshots,
        warnings: allocation.warnings,
    })
}

/// Load data per `config`, apply its signal rule, and run.
pub fn run_from_config(config: &RunConfig) -> Result<PortfolioResult, RunError> {
    config.validate().map_err(ConfigFileError::from)?;
    let loaded = load_universe(&config.universe.tickers, &config.data)?;
    let input = PortfolioInput::with_rule(
        config.universe.tickers.clone(),
        loaded.histories,
        &config.signal,
    );

    let mut result = run_portfolio(&input, &config.portfolio)?;
    result.run_id = Some(config.run_id());
    result.dataset_hash = Some(loaded.dataset_hash);
    result.synthetic = loaded.synthetic;
    Ok(result)
}

/// Score `rule` on one ticker loaded per `data`.
pub fn run_single_from_config(
    ticker: &str,
    data: &DataConfig,
    rule: &SignalRule,
) -> Result<SingleAssetReport, RunError> {
    rule.validate().map_err(ConfigFileError::from)?;
    let loaded = load_universe(&[ticker.to_string()], data)?;
    let series = loaded
        .histories
        .get(ticker)
        .ok_or_else(|| RunError::TickerNotFound(ticker.to_string()))?;
    Ok(backtest_single(series, &rule.generate(series)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::generate_synthetic_series;
    use chrono::NaiveDate;
    use portlab_core::allocation::AllocationMethod;
    use portlab_core::data::DataError;
    use portlab_core::error::{ConfigError, RunWarning};
    use portlab_core::rebalance::Rebalancing;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn synthetic_input(tickers: &[&str], months: u32) -> PortfolioInput {
        let tickers: Vec<String> = tickers.iter().map(|t| t.to_string()).collect();
        let histories = tickers
            .iter()
            .map(|t| {
                let s = generate_synthetic_series(t, d(2023, 1, 1), d(2023, months, 28)).unwrap();
                (t.clone(), s)
            })
            .collect();
        PortfolioInput::held(tickers, histories)
    }

    #[test]
    fn run_portfolio_shapes_result() {
        let input = synthetic_input(&["SPY", "TLT", "GLD"], 6);
        let config = PortfolioConfig {
            rebalancing: Rebalancing::Monthly,
            ..PortfolioConfig::default()
        };
        let r = run_portfolio(&input, &config).unwrap();

        let days = r.equity_curve.len();
        assert_eq!(r.schema_version, SCHEMA_VERSION);
        assert_eq!(r.tickers, vec!["SPY", "TLT", "GLD"]);
        assert_eq!(r.asset_metrics.len(), 3);
        assert_eq!(r.weights_timeline.len(), days + r.rebalance_dates.len());
        assert_eq!(r.portfolio_metrics.num_rebalances, 5);
        assert_eq!(r.start_date, r.equity_curve[0].date);
        assert!(r.portfolio_metrics.total_transaction_costs > 0.0);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn market_cap_falls_back_with_warning() {
        let input = synthetic_input(&["SPY", "TLT"], 3);
        let config = PortfolioConfig {
            allocation_method: AllocationMethod::MarketCap,
            ..PortfolioConfig::default()
        };
        let r = run_portfolio(&input, &config).unwrap();
        assert_eq!(r.warnings, vec![RunWarning::MarketCapPlaceholder]);
        assert!(r.asset_metrics.iter().all(|m| (m.weight - 0.5).abs() < 1e-12));
    }

    #[test]
    fn invalid_cost_fails_before_alignment() {
        // Empty histories would be a data error; the config error wins.
        let input = PortfolioInput::held(vec!["A".into()], HashMap::new());
        let config = PortfolioConfig {
            transaction_cost: -0.1,
            ..PortfolioConfig::default()
        };
        let err = run_portfolio(&input, &config).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Config(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn missing_history_is_data_error() {
        let input = PortfolioInput::held(vec!["A".into()], HashMap::new());
        let err = run_portfolio(&input, &PortfolioConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::Data(DataError::MissingHistory { .. })));
    }

    #[test]
    fn run_from_sample_config_sets_provenance() {
        let mut config = RunConfig::sample();
        config.data.end = Some(d(2020, 12, 31));
        let r = run_from_config(&config).unwrap();
        assert_eq!(r.run_id.as_deref(), Some(config.run_id().as_str()));
        assert!(r.synthetic);
        assert!(r.dataset_hash.is_some());
    }

    #[test]
    fn single_from_config_runs_rule() {
        let data = DataConfig {
            dir: None,
            synthetic: true,
            start: Some(d(2022, 1, 1)),
            end: Some(d(2022, 12, 31)),
        };
        let report = run_single_from_config("SPY", &data, &SignalRule::BuyAndHold).unwrap();
        assert_eq!(report.ticker, "SPY");
        assert_eq!(report.num_trades, 1);
    }
}
