//! Weight initializer: the target weight vector for a run.
//!
//! The vector computed here is the target for the whole run: every rebalance
//! restores exactly this vector, whatever triggered it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::data::AlignedUniverse;
use crate::domain::WeightVector;
use crate::error::{ConfigError, RunWarning};
use crate::stats::{simple_returns, std_dev};

/// Minimum number of return observations for inverse-volatility weights.
pub const MIN_OPTIMIZATION_OBSERVATIONS: usize = 30;

/// How the starting target weights are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMethod {
    /// 1/N per ticker.
    #[default]
    Equal,
    /// Placeholder: no market-cap feed exists, so this falls back to
    /// `Equal` and records [`RunWarning::MarketCapPlaceholder`].
    MarketCap,
    /// Inverse-volatility weights over the full aligned history.
    Optimized,
    /// Caller-supplied raw weights, normalized to sum to one.
    Custom,
}

impl AllocationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            AllocationMethod::Equal => "equal",
            AllocationMethod::MarketCap => "market_cap",
            AllocationMethod::Optimized => "optimized",
            AllocationMethod::Custom => "custom",
        }
    }
}

impl fmt::Display for AllocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(Self::Equal),
            "market_cap" => Ok(Self::MarketCap),
            "optimized" => Ok(Self::Optimized),
            "custom" => Ok(Self::Custom),
            other => Err(ConfigError::UnknownAllocation(other.to_string())),
        }
    }
}

/// Target weights plus any fallback the initializer had to take.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub weights: WeightVector,
    pub warnings: Vec<RunWarning>,
}

impl Allocation {
    fn clean(weights: WeightVector) -> Self {
        Self {
            weights,
            warnings: Vec::new(),
        }
    }

    fn equal_with_warning(tickers: &[String], warning: RunWarning) -> Self {
        warn!("{warning}");
        Self {
            weights: equal_weights(tickers),
            warnings: vec![warning],
        }
    }
}

/// Compute the target weights for `universe` under `method`.
///
/// `custom` is only consulted for [`AllocationMethod::Custom`].
pub fn initial_weights(
    universe: &AlignedUniverse,
    method: AllocationMethod,
    custom: &HashMap<String, f64>,
) -> Result<Allocation, ConfigError> {
    let tickers = &universe.tickers;
    match method {
        AllocationMethod::Equal => Ok(Allocation::clean(equal_weights(tickers))),
        AllocationMethod::Custom => custom_weights(tickers, custom).map(Allocation::clean),
        AllocationMethod::MarketCap => Ok(Allocation::equal_with_warning(
            tickers,
            RunWarning::MarketCapPlaceholder,
        )),
        AllocationMethod::Optimized => Ok(inverse_volatility_weights(universe)),
    }
}

/// 1/N for each ticker.
pub fn equal_weights(tickers: &[String]) -> WeightVector {
    let w = 1.0 / tickers.len() as f64;
    tickers.iter().map(|t| (t.clone(), w)).collect()
}

/// Normalize caller weights by their sum over the universe.
///
/// Tickers absent from `raw` get weight 0; entries for tickers outside the
/// universe are ignored.
pub fn custom_weights(
    tickers: &[String],
    raw: &HashMap<String, f64>,
) -> Result<WeightVector, ConfigError> {
    for (ticker, w) in raw {
        if !w.is_finite() || *w < 0.0 {
            return Err(ConfigError::invalid(
                format!("custom_weights.{ticker}"),
                format!("must be a finite non-negative number, got {w}"),
            ));
        }
        if !tickers.contains(ticker) {
            warn!(ticker = %ticker, "custom weight for ticker outside the universe ignored");
        }
    }

    let values: Vec<f64> = tickers
        .iter()
        .map(|t| raw.get(t).copied().unwrap_or(0.0))
        .collect();
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return Err(ConfigError::ZeroCustomWeights);
    }
    let normalized: Vec<f64> = values.iter().map(|w| w / total).collect();
    Ok(WeightVector::from_slices(tickers, &normalized))
}

/// Weight each asset by 1/σ of its simple close-to-close returns.
fn inverse_volatility_weights(universe: &AlignedUniverse) -> Allocation {
    let tickers = &universe.tickers;
    let observations = universe.len().saturating_sub(1);
    if observations < MIN_OPTIMIZATION_OBSERVATIONS {
        return Allocation::equal_with_warning(
            tickers,
            RunWarning::InsufficientHistory {
                observations,
                required: MIN_OPTIMIZATION_OBSERVATIONS,
            },
        );
    }

    let mut inverse = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let closes = universe.closes(ticker).unwrap_or_default();
        let vol = std_dev(&simple_returns(&closes));
        if !vol.is_finite() || vol <= 0.0 {
            return Allocation::equal_with_warning(
                tickers,
                RunWarning::ZeroVolatility {
                    ticker: ticker.clone(),
                },
            );
        }
        inverse.push(1.0 / vol);
    }

    let total: f64 = inverse.iter().sum();
    let weights: Vec<f64> = inverse.iter().map(|iv| iv / total).collect();
    Allocation::clean(WeightVector::from_slices(tickers, &weights))
}
