//! Single-asset backtest primitive.
//!
//! Uses the same lagged gating as the portfolio simulator, so a rule scored
//! here and the same rule inside a portfolio see identical asset returns.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{AssetSeries, SignalSeries};
use crate::engine::gated_returns;
use crate::stats::{self, PERIODS_PER_YEAR};

/// Direction of a position change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// A position change on `date`, at that day's close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub date: NaiveDate,
    pub price: f64,
    pub side: TradeSide,
}

/// Summary of one rule on one asset. Fractions, not percentages.
///
/// `max_drawdown` is measured on a growth path that starts at 1.0 before the
/// first measured return, so a loss on the very first measured day is already
/// a drawdown rather than a lower starting peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleAssetReport {
    pub ticker: String,
    pub total_return: f64,
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub num_trades: usize,
    pub trade_signals: Vec<TradeSignal>,
}

/// Score `signal` on `series`.
///
/// Returns are measured from the second bar on; the first bar has no prior
/// close. `sharpe_ratio` is `sqrt(252) × mean / std` of the gated daily
/// returns, or 0 when they have no dispersion.
pub fn backtest_single(series: &AssetSeries, signal: &SignalSeries) -> SingleAssetReport {
    let dates: Vec<NaiveDate> = series.dates().collect();
    let closes = series.closes();

    let gated = gated_returns(&closes, &dates, Some(signal));
    let returns = gated.get(1..).unwrap_or(&[]);

    let total_return = stats::cumulative_growth(returns)
        .last()
        .map_or(0.0, |g| g - 1.0);

    let sd = stats::std_dev(returns);
    let sharpe_ratio = if sd > 0.0 {
        PERIODS_PER_YEAR.sqrt() * stats::mean(returns) / sd
    } else {
        0.0
    };

    let trade_signals = trade_signals(&dates, &closes, signal);

    SingleAssetReport {
        ticker: series.ticker().to_string(),
        total_return,
        win_rate: stats::win_rate(returns),
        max_drawdown: stats::max_drawdown(returns),
        sharpe_ratio,
        num_trades: trade_signals.len(),
        trade_signals,
    }
}

/// Every change in exposure between consecutive dates.
///
/// The opening position is taken from flat, so a rule that is long on the
/// first date records a buy there.
fn trade_signals(dates: &[NaiveDate], closes: &[f64], signal: &SignalSeries) -> Vec<TradeSignal> {
    let mut out = Vec::new();
    let mut prev = 0.0;
    for (&date, &price) in dates.iter().zip(closes) {
        let exposure = signal.exposure(date);
        if exposure != prev {
            let side = if exposure > prev {
                TradeSide::Buy
            } else {
                TradeSide::Sell
            };
            out.push(TradeSignal { date, price, side });
        }
        prev = exposure;
    }
    out
}
