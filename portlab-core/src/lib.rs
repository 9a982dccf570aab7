//! PortLab Core: domain types, alignment, allocation, rebalancing and the
//! portfolio return simulator.
//!
//! This crate is pure computation:
//! - Domain types (bars, asset series, position signals, weight vectors)
//! - Common-calendar alignment of asset histories
//! - Initial weight allocation (equal, market-cap placeholder, inverse-vol, custom)
//! - Rebalance policy as a pure decision function
//! - Day-by-day simulator with drift, rebalancing and transaction costs
//! - Signal rules and the single-asset backtest primitive
//!
//! Nothing here performs I/O. Loading, configuration files, metrics and
//! export live in `portlab-runner`.

pub mod allocation;
pub mod data;
pub mod domain;
pub mod engine;
pub mod equity;
pub mod error;
pub mod rebalance;
pub mod signals;
pub mod single;
pub mod stats;

pub use allocation::{initial_weights, Allocation, AllocationMethod};
pub use data::{align_series, AlignedUniverse, DataError};
pub use domain::{AssetSeries, Bar, Position, SignalSeries, WeightSnapshot, WeightVector};
pub use engine::{run_simulation, SimulationConfig, SimulationResult};
pub use equity::{build_equity_curve, EquityPoint};
pub use error::{ConfigError, EngineError, RunWarning};
pub use rebalance::{RebalancePolicy, Rebalancing};
pub use signals::SignalRule;
pub use single::{backtest_single, SingleAssetReport};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything a batch worker touches is Send + Sync.
    ///
    /// Runs share aligned histories read-only across threads; if a type
    /// loses either bound the build breaks here rather than in the runner.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<AssetSeries>();
        require_sync::<AssetSeries>();
        require_send::<AlignedUniverse>();
        require_sync::<AlignedUniverse>();
        require_send::<SignalSeries>();
        require_sync::<SignalSeries>();
        require_send::<WeightVector>();
        require_sync::<WeightVector>();
        require_send::<SimulationConfig>();
        require_sync::<SimulationConfig>();
        require_send::<SimulationResult>();
        require_sync::<SimulationResult>();
        require_send::<SignalRule>();
        require_sync::<SignalRule>();
        require_send::<EngineError>();
        require_sync::<EngineError>();
        require_send::<RunWarning>();
        require_sync::<RunWarning>();
    }
}
