//! In-memory price history store.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::error::SectraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use crate::ports::store_port::StorePort;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<OhlcvBar>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores bars directly, replacing anything held for `code`.
    pub fn insert(&mut self, code: impl Into<String>, mut bars: Vec<OhlcvBar>) {
        bars.sort_by_key(|b| b.date);
        self.entries.insert(code.into(), bars);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StorePort for MemoryStore {
    fn get(&self, code: &str) -> Option<&[OhlcvBar]> {
        self.entries.get(code).map(Vec::as_slice)
    }

    fn put(
        &mut self,
        code: &str,
        source: &dyn DataPort,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SectraderError> {
        let bars = source.fetch_ohlcv(code, start_date, end_date)?;
        self.insert(code, bars.clone());
        Ok(bars)
    }
}
