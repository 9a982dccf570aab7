//! Portfolio simulation engine: gated returns, drift, and rebalancing.
//!
//! The engine consumes an aligned universe, per-ticker position signals, and
//! a target weight vector, then walks the common calendar once. It does no
//! I/O and keeps no state between runs, so independent runs can be executed
//! concurrently over shared read-only inputs.

pub mod gating;
pub mod simulator;
pub mod state;

pub use gating::gated_returns;
pub use simulator::run_simulation;
pub use state::{RebalanceEvent, SimulationConfig, SimulationResult, DEFAULT_TRANSACTION_COST};
