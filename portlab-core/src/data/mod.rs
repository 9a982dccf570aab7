//! Price-history alignment

pub mod align;
pub mod error;

pub use align::{align_series, AlignedUniverse};
pub use error::DataError;
