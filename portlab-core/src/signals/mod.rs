//! Signal rules: closed set of per-asset position rules.
//!
//! Every rule maps one asset's history to a [`SignalSeries`] with an entry
//! on every date of that history. Rules never see portfolio state; the
//! engine's only contract with them is "a 0/1 position per date".

pub mod sma;

use serde::{Deserialize, Serialize};

use crate::domain::{AssetSeries, Position, SignalSeries};
use crate::error::ConfigError;

/// Position rule applied independently to each asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalRule {
    /// Long on every date.
    #[default]
    BuyAndHold,
    /// Flat on every date.
    Flat,
    /// Long while SMA(short) is above SMA(long), flat otherwise.
    /// `NoData` until the long average exists.
    SmaCross {
        short_window: usize,
        long_window: usize,
    },
    /// Long while close is above the close `lookback` bars earlier.
    /// `NoData` for the first `lookback` bars.
    Momentum { lookback: usize },
}

impl SignalRule {
    /// The classic 50/200 golden-cross rule.
    pub fn sma_cross_default() -> Self {
        SignalRule::SmaCross {
            short_window: 50,
            long_window: 200,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SignalRule::BuyAndHold => "buy_and_hold",
            SignalRule::Flat => "flat",
            SignalRule::SmaCross { .. } => "sma_cross",
            SignalRule::Momentum { .. } => "momentum",
        }
    }

    /// Reject parameter combinations that cannot produce a signal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            SignalRule::SmaCross {
                short_window,
                long_window,
            } => {
                if short_window == 0 {
                    return Err(ConfigError::invalid("short_window", "must be >= 1"));
                }
                if long_window <= short_window {
                    return Err(ConfigError::invalid(
                        "long_window",
                        format!("must be > short_window ({short_window}), got {long_window}"),
                    ));
                }
                Ok(())
            }
            SignalRule::Momentum { lookback } if lookback == 0 => {
                Err(ConfigError::invalid("lookback", "must be >= 1"))
            }
            _ => Ok(()),
        }
    }

    /// Produce the position series for one asset.
    pub fn generate(&self, series: &AssetSeries) -> SignalSeries {
        let dates: Vec<_> = series.dates().collect();
        match *self {
            SignalRule::BuyAndHold => SignalSeries::constant(dates, Position::Long),
            SignalRule::Flat => SignalSeries::constant(dates, Position::Flat),
            SignalRule::SmaCross {
                short_window,
                long_window,
            } => {
                let closes = series.closes();
                let fast = sma::sma(&closes, short_window);
                let slow = sma::sma(&closes, long_window);
                let mut out = SignalSeries::new();
                for (i, date) in dates.into_iter().enumerate() {
                    let position = if fast[i].is_nan() || slow[i].is_nan() {
                        Position::NoData
                    } else if fast[i] > slow[i] {
                        Position::Long
                    } else {
                        Position::Flat
                    };
                    out.insert(date, position);
                }
                out
            }
            SignalRule::Momentum { lookback } => {
                let closes = series.closes();
                let mut out = SignalSeries::new();
                for (i, date) in dates.into_iter().enumerate() {
                    let position = if i < lookback {
                        Position::NoData
                    } else if closes[i] > closes[i - lookback] {
                        Position::Long
                    } else {
                        Position::Flat
                    };
                    out.insert(date, position);
                }
                out
            }
        }
    }
}
