//! Price loading for the runner.
//!
//! Two sources, chosen by [`DataConfig`]:
//! 1. `dir` → one `<TICKER>.csv` per ticker
//! 2. `synthetic = true` → deterministic random walk per ticker
//!
//! Synthetic data is for demos and tests. Results built on it are tagged.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use portlab_core::data::DataError;
use portlab_core::domain::{AssetSeries, Bar};

use crate::config::DataConfig;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("no rows for '{ticker}' in {path}")]
    Empty { ticker: String, path: PathBuf },

    #[error("invalid OHLC prices for '{ticker}' on {date}")]
    InvalidBar { ticker: String, date: NaiveDate },

    #[error("duplicate date {date} for '{ticker}'")]
    DuplicateDate { ticker: String, date: NaiveDate },

    #[error("no data source configured (set data.dir or data.synthetic)")]
    NoSource,

    #[error("synthetic data needs both start and end dates")]
    MissingWindow,

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Histories for a universe plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub histories: HashMap<String, AssetSeries>,
    /// BLAKE3 over every loaded bar, ticker-sorted.
    pub dataset_hash: String,
    pub synthetic: bool,
}

/// One CSV row. Column names match either lower-case or Yahoo-style headers.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

/// Read `date,open,high,low,close,volume` rows for `ticker`.
///
/// A header row is required and extra columns are ignored. Rows are sorted
/// by date; a repeated date or a row whose OHLC prices are inconsistent is
/// an error.
pub fn load_csv_series(path: &Path, ticker: &str) -> Result<AssetSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut bars = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        let row = row.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let bar = Bar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.max(0.0) as u64,
        };
        if !bar.is_valid() {
            return Err(LoadError::InvalidBar {
                ticker: ticker.to_string(),
                date: bar.date,
            });
        }
        bars.push(bar);
    }

    if bars.is_empty() {
        return Err(LoadError::Empty {
            ticker: ticker.to_string(),
            path: path.to_path_buf(),
        });
    }

    bars.sort_by_key(|b| b.date);
    if let Some(w) = bars.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(LoadError::DuplicateDate {
            ticker: ticker.to_string(),
            date: w[0].date,
        });
    }

    debug!(ticker, rows = bars.len(), path = %path.display(), "loaded CSV");
    Ok(AssetSeries::new(ticker, bars)?)
}

/// Deterministic weekday random walk for `ticker` over `[start, end]`.
///
/// Seeded from the BLAKE3 hash of the ticker, so the same ticker always
/// produces the same path.
pub fn generate_synthetic_series(
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<AssetSeries, DataError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(ticker.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    // Per-ticker drift and scale so synthetic assets are not interchangeable.
    let drift: f64 = rng.gen_range(-0.0002..0.0008);
    let scale: f64 = rng.gen_range(0.005..0.02);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return = drift + rng.gen_range(-1.0_f64..1.0) * scale;
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(Bar {
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    AssetSeries::new(ticker, bars)
}

/// Load every ticker according to `config`, trimmed to its date window.
pub fn load_universe(tickers: &[String], config: &DataConfig) -> Result<LoadedData, LoadError> {
    let mut histories = HashMap::with_capacity(tickers.len());

    if config.synthetic {
        let (start, end) = match (config.start, config.end) {
            (Some(s), Some(e)) => (s, e),
            _ => return Err(LoadError::MissingWindow),
        };
        for ticker in tickers {
            histories.insert(ticker.clone(), generate_synthetic_series(ticker, start, end)?);
        }
    } else {
        let dir = config.dir.as_ref().ok_or(LoadError::NoSource)?;
        for ticker in tickers {
            let path = dir.join(format!("{ticker}.csv"));
            let series = load_csv_series(&path, ticker)?;
            histories.insert(ticker.clone(), trim_window(&series, config.start, config.end)?);
        }
    }

    let dataset_hash = compute_dataset_hash(&histories);
    info!(
        tickers = tickers.len(),
        synthetic = config.synthetic,
        dataset_hash = %&dataset_hash[..12],
        "loaded price histories"
    );

    Ok(LoadedData {
        histories,
        dataset_hash,
        synthetic: config.synthetic,
    })
}

fn trim_window(
    series: &AssetSeries,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<AssetSeries, DataError> {
    if start.is_none() && end.is_none() {
        return Ok(series.clone());
    }
    let bars = series
        .bars()
        .iter()
        .filter(|b| start.map_or(true, |s| b.date >= s) && end.map_or(true, |e| b.date <= e))
        .cloned()
        .collect();
    AssetSeries::new(series.ticker(), bars)
}

/// BLAKE3 over every bar of every history, in sorted ticker order.
pub fn compute_dataset_hash(histories: &HashMap<String, AssetSeries>) -> String {
    let mut hasher = blake3::Hasher::new();

    let mut tickers: Vec<&String> = histories.keys().collect();
    tickers.sort();

    for ticker in tickers {
        hasher.update(ticker.as_bytes());
        if let Some(series) = histories.get(ticker) {
            for bar in series.bars() {
                hasher.update(bar.date.to_string().as_bytes());
                hasher.update(&bar.open.to_le_bytes());
                hasher.update(&bar.high.to_le_bytes());
                hasher.update(&bar.low.to_le_bytes());
                hasher.update(&bar.close.to_le_bytes());
                hasher.update(&bar.volume.to_le_bytes());
            }
        }
    }

    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    // ── CSV ──

    #[test]
    fn csv_sorts_rows_and_ignores_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "SPY.csv",
            "date,open,high,low,close,volume,adj_close\n\
             2024-01-03,2,2,2,2,100,2\n\
             2024-01-02,1,1,1,1,100,1\n",
        );
        let s = load_csv_series(&path, "SPY").unwrap();
        assert_eq!(s.ticker(), "SPY");
        assert_eq!(s.closes(), vec![1.0, 2.0]);
        assert_eq!(s.dates().next(), Some(d(2024, 1, 2)));
    }

    #[test]
    fn csv_accepts_capitalized_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "QQQ.csv",
            "Date,Open,High,Low,Close,Adj Close,Volume\n2024-01-02,1,1.5,1,1.5,1.5,10\n",
        );
        let s = load_csv_series(&path, "QQQ").unwrap();
        assert_eq!(s.closes(), vec![1.5]);
    }

    #[test]
    fn csv_rejects_duplicate_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "X.csv",
            "date,open,high,low,close,volume\n2024-01-02,1,1,1,1,1\n2024-01-02,1,1,1,1,1\n",
        );
        let err = load_csv_series(&path, "X").unwrap_err();
        assert!(matches!(err, LoadError::DuplicateDate { .. }));
    }

    #[test]
    fn csv_rejects_close_above_high() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "BAD.csv",
            "date,open,high,low,close,volume\n2024-01-02,10,11,9,10,1\n2024-01-03,10,11,9,12,1\n",
        );
        let err = load_csv_series(&path, "BAD").unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidBar { ref ticker, date } if ticker == "BAD" && date == d(2024, 1, 3)
        ));
    }

    #[test]
    fn csv_rejects_zero_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "ZERO.csv",
            "date,open,high,low,close,volume\n2024-01-02,0,0,0,0,1\n",
        );
        assert!(matches!(
            load_csv_series(&path, "ZERO"),
            Err(LoadError::InvalidBar { .. })
        ));
    }

    #[test]
    fn synthetic_bars_are_valid() {
        let s = generate_synthetic_series("GLD", d(2024, 1, 1), d(2024, 6, 30)).unwrap();
        assert!(s.bars().iter().all(Bar::is_valid));
    }

    #[test]
    fn csv_missing_file_is_io_error() {
        let err = load_csv_series(Path::new("/nonexistent/none.csv"), "NONE").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn csv_header_only_is_empty_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "E.csv", "date,open,high,low,close,volume\n");
        assert!(matches!(
            load_csv_series(&path, "E"),
            Err(LoadError::Empty { .. })
        ));
    }

    // ── Synthetic ──

    #[test]
    fn synthetic_is_deterministic_and_skips_weekends() {
        let a = generate_synthetic_series("SPY", d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        let b = generate_synthetic_series("SPY", d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 23);
        assert!(a.dates().all(|dt| dt.weekday().number_from_monday() <= 5));
        assert!(a.bars().iter().all(|bar| bar.close > 0.0));
    }

    #[test]
    fn synthetic_differs_by_ticker() {
        let a = generate_synthetic_series("SPY", d(2024, 1, 1), d(2024, 3, 1)).unwrap();
        let b = generate_synthetic_series("TLT", d(2024, 1, 1), d(2024, 3, 1)).unwrap();
        assert_ne!(a.closes(), b.closes());
    }

    // ── Universe ──

    #[test]
    fn load_universe_trims_to_window() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "A.csv",
            "date,open,high,low,close,volume\n\
             2024-01-02,1,1,1,1,1\n2024-01-03,1,2,1,2,1\n2024-01-04,2,3,2,3,1\n",
        );
        let config = DataConfig {
            dir: Some(dir.path().to_path_buf()),
            synthetic: false,
            start: Some(d(2024, 1, 3)),
            end: None,
        };
        let loaded = load_universe(&["A".to_string()], &config).unwrap();
        assert_eq!(loaded.histories["A"].closes(), vec![2.0, 3.0]);
        assert!(!loaded.synthetic);
        assert_eq!(loaded.dataset_hash.len(), 64);
    }

    #[test]
    fn dataset_hash_is_order_independent() {
        let a = generate_synthetic_series("A", d(2024, 1, 1), d(2024, 1, 10)).unwrap();
        let b = generate_synthetic_series("B", d(2024, 1, 1), d(2024, 1, 10)).unwrap();
        let mut m1 = HashMap::new();
        m1.insert("A".to_string(), a.clone());
        m1.insert("B".to_string(), b.clone());
        let mut m2 = HashMap::new();
        m2.insert("B".to_string(), b);
        m2.insert("A".to_string(), a);
        assert_eq!(compute_dataset_hash(&m1), compute_dataset_hash(&m2));
    }
}
