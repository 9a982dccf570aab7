//! Day-by-day portfolio simulation.
//!
//! For each date on the common calendar:
//!
//! 1. Gated asset returns for the day (precomputed, signal lagged one day)
//! 2. Portfolio return from the weights in force at the start of the day
//! 3. Snapshot of those weights
//! 4. Compound portfolio value
//! 5. Drift weights by each asset's growth, renormalized to sum to one
//! 6. Ask the rebalance policy about the drifted weights
//! 7. On rebalance: charge `turnover × cost` and reset to target; otherwise
//!    carry the drifted weights forward
//!
//! The policy is also evaluated on the final date so that cost accounting
//! does not depend on where the history happens to end.

use std::collections::HashMap;
use tracing::debug;

use super::gating::gated_returns;
use super::state::{RebalanceEvent, SimulationConfig, SimulationResult};
use crate::data::AlignedUniverse;
use crate::domain::{SignalSeries, WeightSnapshot, WeightVector};

/// Run the simulation over `universe` starting from `target` weights.
///
/// `signals` maps ticker → position series. A ticker with no entry is held
/// on every date.
pub fn run_simulation(
    universe: &AlignedUniverse,
    signals: &HashMap<String, SignalSeries>,
    target: &WeightVector,
    config: &SimulationConfig,
) -> SimulationResult {
    let tickers = &universe.tickers;
    let dates = universe.calendar.clone();
    let n = dates.len();

    let per_asset: Vec<Vec<f64>> = tickers
        .iter()
        .map(|t| {
            let closes = universe.closes(t).unwrap_or_default();
            gated_returns(&closes, &dates, signals.get(t))
        })
        .collect();

    let target_w = target.to_vec(tickers);
    // Restricted to the universe so turnover never counts stray tickers.
    let target_vec = WeightVector::from_slices(tickers, &target_w);
    let mut current = target_w.clone();
    let mut last_rebalance = dates.first().copied();

    let mut value = 1.0_f64;
    let mut prev_value = 1.0_f64;
    let mut values = Vec::with_capacity(n);
    let mut returns = Vec::with_capacity(n);
    let mut snapshots = Vec::with_capacity(n + n / 16);
    let mut rebalances = Vec::new();
    let mut drifted = vec![0.0; tickers.len()];

    for (t, &date) in dates.iter().enumerate() {
        let day_returns: Vec<f64> = per_asset.iter().map(|r| r[t]).collect();

        let port_return: f64 = current
            .iter()
            .zip(&day_returns)
            .map(|(w, r)| w * r)
            .sum();

        snapshots.push(WeightSnapshot {
            date,
            weights: WeightVector::from_slices(tickers, &current),
            rebalance: false,
        });

        value *= 1.0 + port_return;

        let growth: f64 = current
            .iter()
            .zip(&day_returns)
            .map(|(w, r)| w * (1.0 + r))
            .sum();
        for ((d, w), r) in drifted.iter_mut().zip(&current).zip(&day_returns) {
            *d = if growth > 0.0 { w * (1.0 + r) / growth } else { *w };
        }

        let last = last_rebalance.unwrap_or(date);
        if config
            .policy
            .should_rebalance(date, last, &drifted, &target_w)
        {
            let turnover = WeightVector::from_slices(tickers, &drifted).turnover_to(&target_vec);
            let value_before = value;
            value *= 1.0 - turnover * config.transaction_cost;
            let cost = value_before - value;

            debug!(%date, turnover, cost, "rebalanced to target");

            current.copy_from_slice(&target_w);
            snapshots.push(WeightSnapshot {
                date,
                weights: target_vec.clone(),
                rebalance: true,
            });
            rebalances.push(RebalanceEvent {
                date,
                turnover,
                cost,
                value_before,
            });
            last_rebalance = Some(date);
        } else {
            current.copy_from_slice(&drifted);
        }

        values.push(value);
        returns.push(value / prev_value - 1.0);
        prev_value = value;
    }

    let asset_returns = tickers.iter().cloned().zip(per_asset).collect();

    SimulationResult {
        dates,
        values,
        returns,
        asset_returns,
        snapshots,
        rebalances,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::equal_weights;
    use crate::data::align_series;
    use crate::domain::{AssetSeries, Position};
    use crate::rebalance::{RebalancePolicy, Rebalancing};
    use chrono::NaiveDate;

    fn universe(paths: &[(&str, &[f64])]) -> AlignedUniverse {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let tickers: Vec<String> = paths.iter().map(|(t, _)| t.to_string()).collect();
        let histories = paths
            .iter()
            .map(|(t, closes)| {
                let pairs: Vec<(NaiveDate, f64)> = closes
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (start + chrono::Duration::days(i as i64), *c))
                    .collect();
                (t.to_string(), AssetSeries::from_closes(*t, &pairs).unwrap())
            })
            .collect();
        align_series(&tickers, &histories).unwrap()
    }

    fn config(schedule: Rebalancing, threshold: f64, cost: f64) -> SimulationConfig {
        SimulationConfig::new(RebalancePolicy::new(schedule, threshold).unwrap(), cost).unwrap()
    }

    #[test]
    fn buy_and_hold_tracks_weighted_growth() {
        let u = universe(&[("A", &[100.0, 110.0, 121.0]), ("B", &[100.0, 100.0, 100.0])]);
        let target = equal_weights(&u.tickers);
        let r = run_simulation(&u, &HashMap::new(), &target, &config(Rebalancing::None, 0.05, 0.01));

        // Half in A (+21%), half in B (flat) → +10.5% with no rebalancing.
        assert!((r.final_value() - 1.105).abs() < 1e-12);
        assert!(r.rebalances.is_empty());
        assert_eq!(r.snapshots.len(), 3);
        assert_eq!(r.returns[0], 0.0);
    }

    #[test]
    fn drifted_weights_stay_normalized() {
        let u = universe(&[("A", &[100.0, 130.0, 90.0, 95.0]), ("B", &[50.0, 49.0, 60.0, 61.0])]);
        let target = equal_weights(&u.tickers);
        let r = run_simulation(&u, &HashMap::new(), &target, &config(Rebalancing::None, 0.05, 0.0));
        for snap in &r.snapshots {
            assert!(snap.weights.is_normalized(), "{:?}", snap);
        }
        // After day 1: A = 0.5*1.3 / (0.5*1.3 + 0.5*0.98)
        let w_a = r.snapshots[2].weights.get("A");
        assert!((w_a - 0.65 / 1.14).abs() < 1e-12);
    }

    #[test]
    fn threshold_rebalance_charges_turnover_cost() {
        // Day 1: A +40%, B flat → drifted A = 0.7/1.2 ≈ 0.5833 > 0.55.
        let u = universe(&[("A", &[100.0, 140.0]), ("B", &[100.0, 100.0])]);
        let target = equal_weights(&u.tickers);
        let r = run_simulation(&u, &HashMap::new(), &target, &config(Rebalancing::Threshold, 0.05, 0.01));

        assert_eq!(r.rebalances.len(), 1);
        let ev = &r.rebalances[0];
        let drifted_a = 0.7 / 1.2;
        let expected_turnover = 2.0 * (drifted_a - 0.5);
        assert!((ev.turnover - expected_turnover).abs() < 1e-12);
        assert!((r.final_value() - 1.2 * (1.0 - expected_turnover * 0.01)).abs() < 1e-12);
        assert!((r.total_transaction_costs() - ev.cost).abs() < 1e-15);

        // Rebalance day carries two snapshots; the second is the reset.
        let last_two = &r.snapshots[r.snapshots.len() - 2..];
        assert!(!last_two[0].rebalance);
        assert!(last_two[1].rebalance);
        assert!((last_two[1].weights.get("A") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn turnover_ignores_target_entries_outside_universe() {
        let u = universe(&[("A", &[100.0, 140.0]), ("B", &[100.0, 100.0])]);
        let target: WeightVector = [
            ("A".to_string(), 0.5),
            ("B".to_string(), 0.5),
            ("GHOST".to_string(), 0.3),
        ]
        .into_iter()
        .collect();
        let r = run_simulation(&u, &HashMap::new(), &target, &config(Rebalancing::Threshold, 0.05, 0.0));

        let expected = 2.0 * (0.7 / 1.2 - 0.5);
        assert!((r.rebalances[0].turnover - expected).abs() < 1e-12);
        assert_eq!(r.snapshots.last().unwrap().weights.get("GHOST"), 0.0);
    }

    #[test]
    fn first_day_never_rebalances() {
        let u = universe(&[("A", &[100.0]), ("B", &[100.0])]);
        let target = equal_weights(&u.tickers);
        let r = run_simulation(&u, &HashMap::new(), &target, &config(Rebalancing::Monthly, 0.05, 0.01));
        assert!(r.rebalances.is_empty());
        assert_eq!(r.values, vec![1.0]);
    }

    #[test]
    fn flat_signal_gates_returns() {
        let u = universe(&[("A", &[100.0, 200.0])]);
        let target = equal_weights(&u.tickers);
        let dates = u.calendar.clone();
        let signals: HashMap<String, SignalSeries> =
            [("A".to_string(), SignalSeries::constant(dates, Position::Flat))].into();
        let r = run_simulation(&u, &signals, &target, &config(Rebalancing::None, 0.05, 0.0));
        assert_eq!(r.final_value(), 1.0);
        assert_eq!(r.asset_returns["A"], vec![0.0, 0.0]);
    }
}
