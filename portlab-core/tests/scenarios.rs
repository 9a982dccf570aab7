//! End-to-end simulator scenarios.
//!
//! Tests:
//! 1. Identical growth: total return independent of asset count, no costs
//! 2. Gated-out asset: threshold drift triggers costly rebalances
//! 3. All-zero custom weights fail with a config error
//! 4. Disjoint histories fail with a data error before simulation
//! 5. A single rebalance from [0.6, 0.4] to [0.5, 0.5] at 1% cost
//! 6. Optimized weighting falls back with a warning on short history

use chrono::NaiveDate;
use std::collections::HashMap;

use portlab_core::allocation::{equal_weights, initial_weights, AllocationMethod};
use portlab_core::data::{align_series, AlignedUniverse, DataError};
use portlab_core::domain::{AssetSeries, Position, SignalSeries};
use portlab_core::engine::{run_simulation, SimulationConfig};
use portlab_core::error::{ConfigError, RunWarning};
use portlab_core::rebalance::{RebalancePolicy, Rebalancing};

// ── Helpers ──────────────────────────────────────────────────────────

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap() + chrono::Duration::days(i as i64)
}

/// A close path starting at 100 that compounds `daily` for `n` dates.
fn compounding(n: usize, daily: f64) -> Vec<(NaiveDate, f64)> {
    let mut price = 100.0;
    (0..n)
        .map(|i| {
            if i > 0 {
                price *= 1.0 + daily;
            }
            (day(i), price)
        })
        .collect()
}

fn histories(paths: Vec<(&str, Vec<(NaiveDate, f64)>)>) -> (Vec<String>, HashMap<String, AssetSeries>) {
    let tickers = paths.iter().map(|(t, _)| t.to_string()).collect();
    let map = paths
        .into_iter()
        .map(|(t, p)| (t.to_string(), AssetSeries::from_closes(t, &p).unwrap()))
        .collect();
    (tickers, map)
}

fn aligned(paths: Vec<(&str, Vec<(NaiveDate, f64)>)>) -> AlignedUniverse {
    let (tickers, map) = histories(paths);
    align_series(&tickers, &map).unwrap()
}

fn config(schedule: Rebalancing, threshold: f64, cost: f64) -> SimulationConfig {
    SimulationConfig::new(RebalancePolicy::new(schedule, threshold).unwrap(), cost).unwrap()
}

// ── 1. Identical growth ──────────────────────────────────────────────

#[test]
fn identical_growth_is_independent_of_asset_count() {
    let expected = 1.0004_f64.powi(252) - 1.0;
    for n_assets in [1usize, 2, 5] {
        let names = ["A", "B", "C", "D", "E"];
        let u = aligned(
            names[..n_assets]
                .iter()
                .map(|t| (*t, compounding(253, 0.0004)))
                .collect(),
        );
        let target = equal_weights(&u.tickers);
        let r = run_simulation(&u, &HashMap::new(), &target, &config(Rebalancing::None, 0.05, 0.0));

        assert_eq!(r.returns.len(), 253);
        assert!(r.rebalances.is_empty());
        assert_eq!(r.total_transaction_costs(), 0.0);
        assert!(
            (r.final_value() - 1.0 - expected).abs() < 1e-9,
            "{n_assets} assets: {}",
            r.final_value()
        );
    }
    assert!((expected - 0.1063).abs() < 1e-3);
}

// ── 2. Gated-out asset ───────────────────────────────────────────────

#[test]
fn flat_asset_drift_triggers_threshold_rebalances() {
    let u = aligned(vec![("LIVE", compounding(60, 0.01)), ("DEAD", compounding(60, 0.01))]);
    let signals: HashMap<String, SignalSeries> = [
        ("LIVE".to_string(), SignalSeries::constant(u.calendar.clone(), Position::Long)),
        ("DEAD".to_string(), SignalSeries::constant(u.calendar.clone(), Position::Flat)),
    ]
    .into();
    let target = equal_weights(&u.tickers);
    let r = run_simulation(&u, &signals, &target, &config(Rebalancing::Threshold, 0.05, 0.001));

    assert!(!r.rebalances.is_empty());
    assert!(r.total_transaction_costs() > 0.0);
    assert!(r.asset_returns["DEAD"].iter().all(|x| *x == 0.0));
    for snap in r.snapshots.iter().filter(|s| s.rebalance) {
        assert!((snap.weights.get("LIVE") - 0.5).abs() < 1e-12);
    }
}

// ── 3. Zero custom weights ───────────────────────────────────────────

#[test]
fn all_zero_custom_weights_is_config_error() {
    let u = aligned(vec![("A", compounding(5, 0.01)), ("B", compounding(5, 0.01))]);
    let custom: HashMap<String, f64> = [("A".to_string(), 0.0), ("B".to_string(), 0.0)].into();
    let err = initial_weights(&u, AllocationMethod::Custom, &custom).unwrap_err();
    assert_eq!(err, ConfigError::ZeroCustomWeights);
}

// ── 4. Disjoint histories ────────────────────────────────────────────

#[test]
fn disjoint_histories_is_data_error() {
    let early: Vec<_> = (0..5).map(|i| (day(i), 100.0)).collect();
    let late: Vec<_> = (10..15).map(|i| (day(i), 100.0)).collect();
    let (tickers, map) = histories(vec![("A", early), ("B", late)]);
    let err = align_series(&tickers, &map).unwrap_err();
    assert_eq!(err, DataError::NoOverlap { assets: 2 });
}

// ── 5. One rebalance ─────────────────────────────────────────────────

#[test]
fn single_rebalance_deducts_turnover_cost_once() {
    // Day 1: A +20%, B −20% → drifted [0.6, 0.4], portfolio flat.
    let u = aligned(vec![
        ("A", vec![(day(0), 100.0), (day(1), 120.0)]),
        ("B", vec![(day(0), 100.0), (day(1), 80.0)]),
    ]);
    let target = equal_weights(&u.tickers);
    let r = run_simulation(&u, &HashMap::new(), &target, &config(Rebalancing::Threshold, 0.05, 0.01));

    assert_eq!(r.rebalances.len(), 1);
    let ev = &r.rebalances[0];
    assert_eq!(ev.date, day(1));
    assert!((ev.turnover - 0.2).abs() < 1e-12);
    assert!((ev.value_before - 1.0).abs() < 1e-12);
    assert!((r.final_value() - 0.998).abs() < 1e-12);

    let pre = &r.snapshots[1];
    assert!(!pre.rebalance);
    assert!((pre.weights.get("A") - 0.5).abs() < 1e-12);
    let post = &r.snapshots[2];
    assert!(post.rebalance);
    assert_eq!(post.weights, target);
}

// ── 6. Optimized fallback ────────────────────────────────────────────

#[test]
fn optimized_with_short_history_falls_back_to_equal() {
    let u = aligned(vec![("A", compounding(20, 0.01)), ("B", compounding(20, 0.02))]);
    let alloc = initial_weights(&u, AllocationMethod::Optimized, &HashMap::new()).unwrap();
    assert_eq!(alloc.weights, equal_weights(&u.tickers));
    assert_eq!(
        alloc.warnings,
        vec![RunWarning::InsufficientHistory {
            observations: 19,
            required: 30
        }]
    );
}
