//! Structured data errors.

use thiserror::Error;

/// Problems with the supplied price histories. Fatal to a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("no tickers supplied")]
    EmptyUniverse,

    #[error("ticker '{ticker}' listed more than once")]
    DuplicateTicker { ticker: String },

    #[error("no price history supplied for '{ticker}'")]
    MissingHistory { ticker: String },

    #[error("dates for '{ticker}' are not strictly increasing")]
    UnsortedDates { ticker: String },

    #[error("no overlapping trading history across {assets} assets")]
    NoOverlap { assets: usize },

    #[error("non-finite or non-positive close for '{ticker}' on {date}")]
    BadClose { ticker: String, date: String },
}
