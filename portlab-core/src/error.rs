//! Engine errors and advisory warnings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::DataError;

/// Invalid run configuration. Fatal; surfaced to the caller unmodified.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("custom allocation weights sum to zero")]
    ZeroCustomWeights,

    #[error("unknown allocation method '{0}' (expected equal, market_cap, optimized, custom)")]
    UnknownAllocation(String),

    #[error("unknown rebalancing policy '{0}' (expected none, monthly, quarterly, threshold)")]
    UnknownRebalancing(String),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl ConfigError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Any fatal condition that aborts a simulation run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// A non-fatal condition the engine recovered from locally.
///
/// Warnings ride along on the result so callers see them even without a
/// tracing subscriber installed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunWarning {
    /// `market_cap` allocation has no market-cap feed; equal weights were used.
    MarketCapPlaceholder,
    /// Too few return observations for `optimized` weighting; equal weights were used.
    InsufficientHistory { observations: usize, required: usize },
    /// An asset had zero return volatility, so inverse-volatility weights are
    /// undefined; equal weights were used.
    ZeroVolatility { ticker: String },
}

impl std::fmt::Display for RunWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunWarning::MarketCapPlaceholder => {
                write!(f, "market-cap weighting not available, using equal weights")
            }
            RunWarning::InsufficientHistory {
                observations,
                required,
            } => write!(
                f,
                "insufficient history for optimized weights ({observations} < {required} returns), using equal weights"
            ),
            RunWarning::ZeroVolatility { ticker } => write!(
                f,
                "'{ticker}' has zero volatility, using equal weights"
            ),
        }
    }
}
