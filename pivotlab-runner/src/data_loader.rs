//! Candle loading for the runner.
//!
//! Reads intraday OHLCV candles from CSV (`date,open,high,low,close,volume`,
//! with RFC 3339 timestamps carrying their UTC offset) and canonicalizes
//! them: sorted by timestamp, duplicate timestamps dropped keeping the
//! first occurrence.
//!
//! Synthetic candles are a developer-only debug mode. Results produced on
//! synthetic data are tagged as such.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Weekday};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use pivotlab_core::{Candle, SessionClock};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: invalid timestamp '{value}': {reason}")]
    Timestamp {
        row: usize,
        value: String,
        reason: String,
    },
    #[error("no candles in {0}")]
    Empty(PathBuf),
}

/// Candles plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedCandles {
    pub candles: Vec<Candle>,
    /// BLAKE3 over the canonical candles.
    pub dataset_hash: String,
    pub has_synthetic: bool,
    /// Rows dropped by canonicalization (duplicate timestamps).
    pub duplicates_dropped: usize,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "timestamp", alias = "datetime")]
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

fn parse_timestamp(row: usize, value: &str) -> Result<DateTime<FixedOffset>, LoadError> {
    let trimmed = value.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%:z"))
        .map_err(|e| LoadError::Timestamp {
            row,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Parse candles from any CSV reader. Row numbers in errors are 1-based
/// data rows (header excluded).
pub fn read_candles<R: std::io::Read>(reader: R) -> Result<Vec<Candle>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut candles = Vec::new();
    for (i, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = record?;
        candles.push(Candle {
            timestamp: parse_timestamp(i + 1, &row.date)?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    Ok(candles)
}

/// Load and canonicalize candles from a CSV file.
pub fn load_candles_csv(path: &Path) -> Result<LoadedCandles, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = read_candles(file)?;
    if raw.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    let raw_len = raw.len();
    let candles = canonicalize(raw);
    let duplicates_dropped = raw_len - candles.len();
    if duplicates_dropped > 0 {
        warn!(
            path = %path.display(),
            duplicates_dropped,
            "dropped candles with duplicate timestamps"
        );
    }
    debug!(path = %path.display(), candles = candles.len(), "loaded candles");
    Ok(LoadedCandles {
        dataset_hash: dataset_hash(&candles),
        candles,
        has_synthetic: false,
        duplicates_dropped,
    })
}

/// Sort by timestamp (stable) and keep the first candle of each timestamp.
pub fn canonicalize(mut candles: Vec<Candle>) -> Vec<Candle> {
    candles.sort_by_key(|c| c.timestamp);
    candles.dedup_by(|later, earlier| later.timestamp == earlier.timestamp);
    candles
}

/// Deterministic BLAKE3 hash over candle data.
///
/// Timestamps are hashed as UTC instants so the same series exported with a
/// different offset hashes identically.
pub fn dataset_hash(candles: &[Candle]) -> String {
    let mut hasher = blake3::Hasher::new();
    for c in candles {
        hasher.update(&c.timestamp.timestamp().to_le_bytes());
        hasher.update(&c.open.to_le_bytes());
        hasher.update(&c.high.to_le_bytes());
        hasher.update(&c.low.to_le_bytes());
        hasher.update(&c.close.to_le_bytes());
        hasher.update(&c.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Synthetic 5-minute sessions (09:15 to 15:25 local) on weekdays from
/// `start`, seeded from `seed` so identical inputs give identical candles.
pub fn generate_synthetic_candles(
    start: NaiveDate,
    days: usize,
    seed: &str,
    clock: &SessionClock,
) -> Vec<Candle> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed_bytes = blake3::hash(seed.as_bytes());
    let mut rng = StdRng::from_seed(*seed_bytes.as_bytes());

    let session_open = NaiveTime::from_hms_opt(9, 15, 0).expect("valid time literal");
    let mut candles = Vec::with_capacity(days * 75);
    let mut price = 20_000.0_f64;
    let mut date = start;
    let mut produced = 0;

    while produced < days {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            date += Duration::days(1);
            continue;
        }
        let Some(open_ts) = clock.at(date, session_open) else {
            date += Duration::days(1);
            continue;
        };
        // Overnight gap.
        price *= 1.0 + rng.gen_range(-0.004..0.004);
        // Per-day drift so some sessions trend through the pivots.
        let drift: f64 = rng.gen_range(-3.0..3.0);
        for slot in 0..75 {
            let open = price;
            let close = (open + drift + rng.gen_range(-12.0..12.0)).max(1.0);
            let high = open.max(close) + rng.gen_range(0.0..8.0);
            let low = (open.min(close) - rng.gen_range(0.0..8.0)).max(0.5);
            candles.push(Candle {
                timestamp: open_ts + Duration::minutes(5 * slot),
                open,
                high,
                low,
                close,
                volume: rng.gen_range(5_000.0..50_000.0),
            });
            price = close;
        }
        produced += 1;
        date += Duration::days(1);
    }

    candles
}

/// Wrap synthetic candles with provenance.
pub fn synthetic_dataset(
    start: NaiveDate,
    days: usize,
    seed: &str,
    clock: &SessionClock,
) -> LoadedCandles {
    let candles = generate_synthetic_candles(start, days, seed, clock);
    LoadedCandles {
        dataset_hash: dataset_hash(&candles),
        candles,
        has_synthetic: true,
        duplicates_dropped: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
date,open,high,low,close,volume
2024-01-02T09:20:00+05:30,101,103,100,102,10
2024-01-02T09:15:00+05:30,100,102,99,101,20
2024-01-02T09:20:00+05:30,999,999,999,999,99
";

    #[test]
    fn read_then_canonicalize() {
        let raw = read_candles(CSV.as_bytes()).unwrap();
        assert_eq!(raw.len(), 3);
        let candles = canonicalize(raw);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, 100.0);
        // First occurrence of the duplicate wins.
        assert_eq!(candles[1].open, 101.0);
    }

    #[test]
    fn bad_timestamp_reports_row() {
        let csv = "date,open,high,low,close,volume\n2024-01-02 09:15,1,1,1,1,1\n";
        match read_candles(csv.as_bytes()) {
            Err(LoadError::Timestamp { row, .. }) => assert_eq!(row, 1),
            other => panic!("expected timestamp error, got {other:?}"),
        }
    }

    #[test]
    fn missing_volume_defaults_to_zero() {
        let csv = "date,open,high,low,close\n2024-01-02T09:15:00+05:30,1,2,0.5,1.5\n";
        let candles = read_candles(csv.as_bytes()).unwrap();
        assert_eq!(candles[0].volume, 0.0);
    }

    #[test]
    fn dataset_hash_ignores_offset_representation() {
        let a = read_candles(CSV.as_bytes()).unwrap();
        let mut b = a.clone();
        let utc = FixedOffset::east_opt(0).unwrap();
        for c in &mut b {
            c.timestamp = c.timestamp.with_timezone(&utc);
        }
        assert_eq!(dataset_hash(&a), dataset_hash(&b));
        b[0].close += 1.0;
        assert_ne!(dataset_hash(&a), dataset_hash(&b));
    }

    #[test]
    fn synthetic_is_deterministic_and_weekday_only() {
        let clock = SessionClock::default();
        // 2024-01-05 is a Friday.
        let start = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let a = generate_synthetic_candles(start, 3, "seed", &clock);
        let b = generate_synthetic_candles(start, 3, "seed", &clock);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3 * 75);
        for c in &a {
            assert!(c.is_sane());
            let day = clock.trading_date(&c.timestamp).weekday();
            assert!(!matches!(day, Weekday::Sat | Weekday::Sun));
        }
        let last = clock.time_of_day(&a[74].timestamp);
        assert_eq!(last, NaiveTime::from_hms_opt(15, 25, 0).unwrap());
        assert_ne!(a, generate_synthetic_candles(start, 3, "other", &clock));
    }
}
