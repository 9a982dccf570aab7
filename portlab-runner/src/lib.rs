//! PortLab Runner: configuration, orchestration, metrics and export.
//!
//! This crate builds on `portlab-core` to provide:
//! - TOML run configuration with a content-addressed run ID
//! - CSV price loading and deterministic synthetic prices
//! - `run_portfolio`: alignment → allocation → simulation → metrics → equity curve
//! - Portfolio and per-asset metrics
//! - Parallel batches of independent runs on a bounded rayon pool
//! - JSON, CSV and Markdown export

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod result;
pub mod runner;

pub use batch::{run_batch, run_batch_with_progress, BatchError, BatchJob};
pub use config::{ConfigFileError, DataConfig, PortfolioConfig, RunConfig, RunId, UniverseConfig};
pub use data_loader::{
    generate_synthetic_series, load_csv_series, load_universe, LoadError, LoadedData,
};
pub use metrics::{AssetMetrics, CorrelationMatrix, PortfolioMetrics};
pub use result::{PortfolioResult, SCHEMA_VERSION};
pub use runner::{
    run_from_config, run_portfolio, run_single_from_config, PortfolioInput, RunError,
};
