//! Strategy-gated returns.
//!
//! An asset's gated return on day t is its close-to-close return times the
//! position held at the end of day t−1. A position taken on day t−1 earns
//! day t's move; nothing is known about day t when the position is set.

use chrono::NaiveDate;

use crate::domain::SignalSeries;

/// Gated returns on `calendar`. The first element is always 0.
///
/// `None` for `signal` means the caller supplied no rule for this asset,
/// which is treated as holding it throughout.
pub fn gated_returns(
    closes: &[f64],
    calendar: &[NaiveDate],
    signal: Option<&SignalSeries>,
) -> Vec<f64> {
    let n = closes.len().min(calendar.len());
    let mut out = Vec::with_capacity(n);
    if n == 0 {
        return out;
    }
    out.push(0.0);
    for t in 1..n {
        let raw = closes[t] / closes[t - 1] - 1.0;
        let exposure = signal.map_or(1.0, |s| s.exposure(calendar[t - 1]));
        out.push(raw * exposure);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Position;

    fn cal(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect()
    }

    #[test]
    fn signal_is_lagged_one_day() {
        let calendar = cal(3);
        let closes = [100.0, 110.0, 121.0];
        // Long only on day 1: earns day 2's return, not day 1's.
        let mut s = SignalSeries::new();
        s.insert(calendar[0], Position::Flat);
        s.insert(calendar[1], Position::Long);
        s.insert(calendar[2], Position::Flat);

        let r = gated_returns(&closes, &calendar, Some(&s));
        assert_eq!(r[0], 0.0);
        assert_eq!(r[1], 0.0);
        assert!((r[2] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn missing_rule_holds_throughout() {
        let calendar = cal(2);
        let r = gated_returns(&[100.0, 105.0], &calendar, None);
        assert!((r[1] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn missing_date_in_rule_is_flat() {
        let calendar = cal(2);
        let s = SignalSeries::constant([calendar[1]], Position::Long);
        let r = gated_returns(&[100.0, 105.0], &calendar, Some(&s));
        assert_eq!(r[1], 0.0);
    }

    #[test]
    fn empty_input() {
        assert!(gated_returns(&[], &[], None).is_empty());
    }
}
