//! Serializable run configuration.
//!
//! A run is described by a TOML file:
//!
//! ```toml
//! [universe]
//! tickers = ["SPY", "TLT", "GLD"]
//!
//! [data]
//! dir = "data"            # <TICKER>.csv files
//!
//! [portfolio]
//! allocation_method = "optimized"
//! rebalancing = "threshold"
//! rebalance_threshold = 0.05
//! transaction_cost = 0.001
//!
//! [signal]
//! type = "sma_cross"
//! short_window = 50
//! long_window = 200
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

use portlab_core::allocation::AllocationMethod;
use portlab_core::engine::{SimulationConfig, DEFAULT_TRANSACTION_COST};
use portlab_core::error::ConfigError;
use portlab_core::rebalance::{RebalancePolicy, Rebalancing, DEFAULT_REBALANCE_THRESHOLD};
use portlab_core::signals::SignalRule;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

/// Errors from reading a config file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}

/// Portfolio construction and rebalancing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    #[serde(default)]
    pub allocation_method: AllocationMethod,

    /// Raw weights for `custom` allocation; normalized by their sum.
    #[serde(default)]
    pub custom_weights: BTreeMap<String, f64>,

    #[serde(default)]
    pub rebalancing: Rebalancing,

    /// Maximum per-asset drift before a `threshold` rebalance.
    #[serde(default = "default_threshold")]
    pub rebalance_threshold: f64,

    /// Fraction of value charged per unit of turnover.
    #[serde(default = "default_transaction_cost")]
    pub transaction_cost: f64,

    /// Scale of the reported equity curve and absolute cost figures.
    #[serde(default = "default_initial_value")]
    pub initial_value: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_REBALANCE_THRESHOLD
}

fn default_transaction_cost() -> f64 {
    DEFAULT_TRANSACTION_COST
}

fn default_initial_value() -> f64 {
    1.0
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            allocation_method: AllocationMethod::Equal,
            custom_weights: BTreeMap::new(),
            rebalancing: Rebalancing::None,
            rebalance_threshold: DEFAULT_REBALANCE_THRESHOLD,
            transaction_cost: DEFAULT_TRANSACTION_COST,
            initial_value: 1.0,
        }
    }
}

impl PortfolioConfig {
    /// Build from the string forms used by external callers.
    ///
    /// Unknown method or schedule names surface as [`ConfigError`].
    pub fn from_names(allocation_method: &str, rebalancing: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            allocation_method: allocation_method.parse()?,
            rebalancing: rebalancing.parse()?,
            ..Self::default()
        })
    }

    /// Check every numeric knob. Called before any data is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation_config()?;
        if !(self.initial_value.is_finite() && self.initial_value > 0.0) {
            return Err(ConfigError::invalid(
                "initial_value",
                format!("must be a positive finite number, got {}", self.initial_value),
            ));
        }
        for (ticker, w) in &self.custom_weights {
            if !w.is_finite() || *w < 0.0 {
                return Err(ConfigError::invalid(
                    format!("custom_weights.{ticker}"),
                    format!("must be a finite non-negative number, got {w}"),
                ));
            }
        }
        Ok(())
    }

    /// Rebalance policy and cost rate for the simulator.
    pub fn simulation_config(&self) -> Result<SimulationConfig, ConfigError> {
        let policy = RebalancePolicy::new(self.rebalancing, self.rebalance_threshold)?;
        SimulationConfig::new(policy, self.transaction_cost)
    }

    /// Custom weights in the shape the allocator takes.
    pub fn custom_weight_map(&self) -> HashMap<String, f64> {
        self.custom_weights
            .iter()
            .map(|(t, w)| (t.clone(), *w))
            .collect()
    }
}

/// Which tickers take part in the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseConfig {
    pub tickers: Vec<String>,
}

/// Where price histories come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding `<TICKER>.csv` files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Generate deterministic synthetic prices instead of reading files.
    #[serde(default)]
    pub synthetic: bool,

    /// Inclusive date window. Required for synthetic data; trims loaded files otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

/// Serializable configuration for one portfolio run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub universe: UniverseConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub portfolio: PortfolioConfig,

    /// Rule applied to every ticker.
    #[serde(default)]
    pub signal: SignalRule,
}

impl RunConfig {
    /// Parse and validate a TOML config string.
    pub fn from_toml(s: &str) -> Result<Self, ConfigFileError> {
        let config: RunConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let tickers = &self.universe.tickers;
        if tickers.is_empty() {
            return Err(ConfigError::invalid("universe.tickers", "must not be empty"));
        }
        let mut seen = HashSet::new();
        for t in tickers {
            if t.trim().is_empty() {
                return Err(ConfigError::invalid("universe.tickers", "empty ticker symbol"));
            }
            if !seen.insert(t.as_str()) {
                return Err(ConfigError::invalid(
                    "universe.tickers",
                    format!("duplicate ticker '{t}'"),
                ));
            }
        }

        if let (Some(start), Some(end)) = (self.data.start, self.data.end) {
            if start > end {
                return Err(ConfigError::invalid(
                    "data.start",
                    format!("{start} is after data.end {end}"),
                ));
            }
        }
        if self.data.synthetic && (self.data.start.is_none() || self.data.end.is_none()) {
            return Err(ConfigError::invalid(
                "data",
                "synthetic data needs both start and end",
            ));
        }
        if !self.data.synthetic && self.data.dir.is_none() {
            return Err(ConfigError::invalid(
                "data",
                "set either dir or synthetic = true",
            ));
        }

        self.portfolio.validate()?;
        self.signal.validate()
    }

    /// Deterministic hash of the configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        // Plain data with ordered maps; serialization cannot fail here.
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }

    /// A runnable example: three synthetic assets, SMA-cross, monthly rebalancing.
    pub fn sample() -> Self {
        Self {
            universe: UniverseConfig {
                tickers: vec!["SPY".into(), "TLT".into(), "GLD".into()],
            },
            data: DataConfig {
                dir: None,
                synthetic: true,
                start: NaiveDate::from_ymd_opt(2019, 1, 1),
                end: NaiveDate::from_ymd_opt(2023, 12, 31),
            },
            portfolio: PortfolioConfig {
                allocation_method: AllocationMethod::Optimized,
                rebalancing: Rebalancing::Monthly,
                ..PortfolioConfig::default()
            },
            signal: SignalRule::sma_cross_default(),
        }
    }
}
