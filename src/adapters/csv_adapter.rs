//! CSV directory data source.
//!
//! One file per security, named `{CODE}.csv`, with the header
//! `date,open,high,low,close,volume` and ISO dates.

use crate::domain::error::SectraderError;
use crate::domain::ohlcv::OhlcvBar;
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

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }
}

fn data_err(reason: impl Into<String>) -> SectraderError {
    SectraderError::Data {
        reason: reason.into(),
    }
}

fn column<'r>(record: &'r csv::StringRecord, idx: usize, name: &str, line: u64) -> Result<&'r str, SectraderError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| data_err(format!("line {}: missing {} column", line, name)))
}

fn number(record: &csv::StringRecord, idx: usize, name: &str, line: u64) -> Result<f64, SectraderError> {
    let raw = column(record, idx, name, line)?;
    raw.parse()
        .map_err(|_| data_err(format!("line {}: invalid {} value '{}'", line, name, raw)))
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SectraderError> {
        let path = self.csv_path(code);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_err(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| data_err(format!("CSV parse error in {}: {}", path.display(), e)))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let date_str = column(&record, 0, "date", line)?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|e| data_err(format!("line {}: invalid date '{}': {}", line, date_str, e)))?;

            if date < start_date || date > end_date {
                continue;
            }

            bars.push(OhlcvBar {
                date,
                open: number(&record, 1, "open", line)?,
                high: number(&record, 2, "high", line)?,
                low: number(&record, 3, "low", line)?,
                close: number(&record, 4, "close", line)?,
                volume: number(&record, 5, "volume", line)?.round() as i64,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}
