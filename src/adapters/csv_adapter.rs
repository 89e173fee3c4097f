//! CSV file data adapter.
//!
//! One file per symbol, `<base>/<SYMBOL>.csv`, with a header row and columns
//! `date,open,high,low,close,volume`.

use crate::domain::bar::{Bar, Ohlcv};
use crate::domain::error::EngineError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize, name: &str) -> Result<&'r str, EngineError> {
    record.get(idx).map(str::trim).ok_or_else(|| EngineError::Data {
        reason: format!("missing {} column", name),
    })
}

fn number(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, EngineError> {
    field(record, idx, name)?
        .parse()
        .map_err(|e| EngineError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar<Ohlcv>>, EngineError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| EngineError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| EngineError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date = NaiveDate::parse_from_str(field(&record, 0, "date")?, "%Y-%m-%d")
                .map_err(|e| EngineError::Data {
                    reason: format!("invalid date format: {}", e),
                })?;

            if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
                continue;
            }

            bars.push(Bar::new(
                date,
                Ohlcv {
                    open: number(&record, 1, "open")?,
                    high: number(&record, 2, "high")?,
                    low: number(&record, 3, "low")?,
                    close: number(&record, 4, "close")?,
                    volume: number(&record, 5, "volume")?,
                },
            ));
        }

        bars.sort_by_key(|b| b.date);
        tracing::debug!(symbol, bars = bars.len(), path = %path.display(), "loaded bars");
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, EngineError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| EngineError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| EngineError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            if let Some(symbol) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        // rows deliberately out of order
        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("SPY.csv"), csv_content).unwrap();
        fs::write(path.join("QQQ.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "ignored").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_bars_returns_sorted_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("SPY", None, None).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, date(2024, 1, 15));
        assert_eq!(bars[0].value.open, 100.0);
        assert_eq!(bars[0].value.high, 110.0);
        assert_eq!(bars[0].value.low, 90.0);
        assert_eq!(bars[0].value.close, 105.0);
        assert_eq!(bars[0].value.volume, 50000.0);
        assert_eq!(bars[2].date, date(2024, 1, 17));
    }

    #[test]
    fn fetch_bars_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let day = date(2024, 1, 16);
        let bars = adapter.fetch_bars("SPY", Some(day), Some(day)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, day);

        let bars = adapter.fetch_bars("SPY", Some(day), None).unwrap();
        assert_eq!(bars.len(), 2);
    }

    #[test]
    fn fetch_bars_errors_for_missing_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(matches!(
            adapter.fetch_bars("XYZ", None, None),
            Err(EngineError::Data { .. })
        ));
    }

    #[test]
    fn fetch_bars_rejects_bad_numbers() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("BAD.csv"),
            "date,open,high,low,close,volume\n2024-01-15,1,2,x,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path);
        let err = adapter.fetch_bars("BAD", None, None).unwrap_err();
        assert!(err.to_string().contains("invalid low value"));
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["QQQ", "SPY"]);
    }
}
