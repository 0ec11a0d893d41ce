//! Key-value store for previously fetched price history.

use crate::domain::error::SectraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;

pub trait StorePort {
    fn get(&self, code: &str) -> Option<&[OhlcvBar]>;

    fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Fetches `code` from `source`, remembers it and returns the bars.
    fn put(
        &mut self,
        code: &str,
        source: &dyn DataPort,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SectraderError>;

    /// Stored bars for `code`, optionally narrowed to a date range.
    fn load(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, SectraderError> {
        let bars = self.get(code).ok_or_else(|| SectraderError::NotInStore {
            code: code.to_string(),
        })?;
        Ok(bars
            .iter()
            .filter(|b| start_date.is_none_or(|s| b.date >= s))
            .filter(|b| end_date.is_none_or(|e| b.date <= e))
            .cloned()
            .collect())
    }
}
