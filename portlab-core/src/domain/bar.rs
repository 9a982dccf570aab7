//! Bar: the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar for a single ticker.
///
/// Only `close` feeds the simulation; the other fields are carried so that a
/// history can be handed back to callers (charting, export) unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Prices are finite and positive, and `[low, high]` spans both open
    /// and close. Loaded rows that fail this never reach the engine.
    pub fn is_valid(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite() && *p > 0.0)
            && self.low <= self.open.min(self.close)
            && self.high >= self.open.max(self.close)
    }

    /// Bar with every price set to `close`. Handy for close-only histories.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn range_spanning_open_and_close_is_valid() {
        assert!(bar(100.0, 105.0, 98.0, 103.0).is_valid());
    }

    #[test]
    fn close_outside_range_is_invalid() {
        assert!(!bar(100.0, 101.0, 99.0, 102.0).is_valid());
        assert!(!bar(100.0, 101.0, 99.0, 98.0).is_valid());
    }

    #[test]
    fn non_positive_or_nan_price_is_invalid() {
        assert!(!bar(100.0, 105.0, 98.0, f64::NAN).is_valid());
        assert!(!bar(0.0, 0.0, 0.0, 0.0).is_valid());
    }

    #[test]
    fn close_only_bar_is_valid() {
        let b = Bar::from_close(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 50.0);
        assert!(b.is_valid());
        assert_eq!(b.open, 50.0);
    }
}
