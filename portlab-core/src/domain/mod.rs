//! Domain types for PortLab

pub mod bar;
pub mod series;
pub mod signal;
pub mod weights;

pub use bar::Bar;
pub use series::AssetSeries;
pub use signal::{Position, SignalSeries};
pub use weights::{WeightSnapshot, WeightVector, WEIGHT_SUM_TOLERANCE};
