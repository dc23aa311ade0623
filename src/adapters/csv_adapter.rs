//! CSV file data adapter.
//!
//! Prices live in `{base}/{SYMBOL}.csv` (`date,open,high,low,close,volume`),
//! model predictions in `{base}/{SYMBOL}_{model}.csv` (`date,signal`, where
//! an empty signal cell means the model made no prediction that day).

use crate::domain::error::VoteTraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::ModelSignal;
use crate::ports::data_port::DataPort;
use crate::ports::signal_port::SignalPort;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn price_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn signal_path(&self, symbol: &str, model: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, model))
    }
}

fn data_error(reason: String) -> VoteTraderError {
    VoteTraderError::Data { reason }
}

fn open_reader(path: &Path) -> Result<csv::Reader<fs::File>, VoteTraderError> {
    csv::Reader::from_path(path)
        .map_err(|e| data_error(format!("failed to read {}: {}", path.display(), e)))
}

fn parse_date(record: &csv::StringRecord, line: usize) -> Result<NaiveDate, VoteTraderError> {
    let raw = record
        .get(0)
        .ok_or_else(|| data_error(format!("line {}: missing date column", line)))?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| data_error(format!("line {}: invalid date {:?}: {}", line, raw, e)))
}

fn parse_field<T>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<T, VoteTraderError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| data_error(format!("line {}: missing {} column", line, name)))?
        .trim()
        .parse()
        .map_err(|e| data_error(format!("line {}: invalid {} value: {}", line, name, e)))
}

/// `0`/`1` (integer or float spelling), or empty for a missing prediction.
fn parse_signal_cell(raw: &str, line: usize) -> Result<Option<bool>, VoteTraderError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v == 0.0 => Ok(Some(false)),
        Ok(v) if v == 1.0 => Ok(Some(true)),
        _ => Err(data_error(format!(
            "line {}: signal must be 0, 1 or empty, got {:?}",
            line, raw
        ))),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, VoteTraderError> {
        let path = self.price_path(symbol);
        let mut rdr = open_reader(&path)?;
        let mut bars = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            // header is line 1
            let line = i + 2;
            let record = result.map_err(|e| data_error(format!("CSV parse error: {}", e)))?;

            let date = parse_date(&record, line)?;
            if date < start_date || date > end_date {
                continue;
            }

            bars.push(OhlcvBar {
                date,
                open: parse_field(&record, 1, "open", line)?,
                high: parse_field(&record, 2, "high", line)?,
                low: parse_field(&record, 3, "low", line)?,
                close: parse_field(&record, 4, "close", line)?,
                volume: parse_field(&record, 5, "volume", line)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, VoteTraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            data_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut stems = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| data_error(format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            if let Some(stem) = name.to_string_lossy().strip_suffix(".csv") {
                if !stem.is_empty() {
                    stems.insert(stem.to_string());
                }
            }
        }

        // `{SYMBOL}_{model}` is a signal file only when `{SYMBOL}.csv` exists,
        // so tickers such as `BRK_B` are still listed.
        let symbols = stems
            .iter()
            .filter(|stem| {
                !stem
                    .match_indices('_')
                    .any(|(i, _)| stems.contains(&stem[..i]))
            })
            .cloned()
            .collect();
        Ok(symbols)
    }
}

impl SignalPort for CsvAdapter {
    fn fetch_signal(&self, symbol: &str, model: &str) -> Result<ModelSignal, VoteTraderError> {
        let path = self.signal_path(symbol, model);
        let mut rdr = open_reader(&path)?;
        let mut signal = ModelSignal::new(model);

        for (i, result) in rdr.records().enumerate() {
            let line = i + 2;
            let record = result.map_err(|e| data_error(format!("CSV parse error: {}", e)))?;

            let date = parse_date(&record, line)?;
            let cell = record.get(1).unwrap_or("");
            if let Some(value) = parse_signal_cell(cell, line)? {
                if signal.values.insert(date, value).is_some() {
                    return Err(data_error(format!(
                        "{}: duplicate date {}",
                        path.display(),
                        date
                    )));
                }
            }
        }

        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        fs::write(
            path.join("AAPL.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-16,105.0,115.0,100.0,110.0,60000\n\
             2024-01-15,100.0,110.0,90.0,105.0,50000\n\
             2024-01-17,110.0,120.0,105.0,115.0,55000\n",
        )
        .unwrap();
        fs::write(path.join("MSFT.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(
            path.join("AAPL_lstm.csv"),
            "date,signal\n2024-01-15,1\n2024-01-16,\n2024-01-17,0.0\n",
        )
        .unwrap();
        fs::write(path.join("AAPL_bad.csv"), "date,signal\n2024-01-15,2\n").unwrap();
        fs::write(
            path.join("AAPL_dup.csv"),
            "date,signal\n2024-01-15,1\n2024-01-15,0\n",
        )
        .unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_ohlcv_sorted() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_ohlcv("AAPL", date(1), date(31)).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, date(15));
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[2].date, date(17));
    }

    #[test]
    fn fetch_ohlcv_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_ohlcv("AAPL", date(16), date(16)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, date(16));
    }

    #[test]
    fn fetch_ohlcv_missing_file_is_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let result = adapter.fetch_ohlcv("NVDA", date(1), date(31));
        assert!(matches!(result, Err(VoteTraderError::Data { .. })));
    }

    #[test]
    fn fetch_ohlcv_rejects_bad_volume() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("BAD.csv"),
            "date,open,high,low,close,volume\n2024-01-15,1,1,1,1,-5\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path);
        assert!(adapter.fetch_ohlcv("BAD", date(1), date(31)).is_err());
    }

    #[test]
    fn fetch_signal_keeps_missing_cells_missing() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let signal = adapter.fetch_signal("AAPL", "lstm").unwrap();
        assert_eq!(signal.name, "lstm");
        assert_eq!(signal.len(), 2);
        assert_eq!(signal.get(date(15)), Some(true));
        assert_eq!(signal.get(date(16)), None);
        assert_eq!(signal.get(date(17)), Some(false));
    }

    #[test]
    fn fetch_signal_rejects_non_binary() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(matches!(
            adapter.fetch_signal("AAPL", "bad"),
            Err(VoteTraderError::Data { .. })
        ));
    }

    #[test]
    fn fetch_signal_rejects_duplicate_dates() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(adapter.fetch_signal("AAPL", "dup").is_err());
    }

    #[test]
    fn list_symbols_skips_signal_files() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn list_symbols_keeps_underscore_tickers() {
        let (_dir, path) = setup_test_data();
        fs::write(path.join("BRK_B.csv"), "date,open,high,low,close,volume
").unwrap();
        fs::write(path.join("BRK_B_lstm.csv"), "date,signal
").unwrap();
        let adapter = CsvAdapter::new(path);
        assert_eq!(
            adapter.list_symbols().unwrap(),
            vec!["AAPL", "BRK_B", "MSFT"]
        );
    }
}
