//! Security universe: code lists and assembling their price history.

use crate::domain::error::SectraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_series::PriceSeries;
use crate::ports::data_port::DataPort;
use crate::ports::store_port::StorePort;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

/// Bars for `code`, or an empty list when the source fails.
pub fn fetch_or_empty(
    source: &dyn DataPort,
    code: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Vec<OhlcvBar> {
    match source.fetch_ohlcv(code, start_date, end_date) {
        Ok(bars) => bars,
        Err(e) => {
            warn!(code, error = %e, "price fetch failed, treating as empty");
            Vec::new()
        }
    }
}

/// Loads every code and aligns them on their common dates.
///
/// Codes already in `store` are read from it; the rest come from `source`
/// and are remembered in `store` when one is given. A code without any bars
/// in range is a [`SectraderError::NoData`].
pub fn load_price_series(
    source: &dyn DataPort,
    mut store: Option<&mut dyn StorePort>,
    codes: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<PriceSeries, SectraderError> {
    let mut columns = Vec::with_capacity(codes.len());

    for code in codes {
        let bars = match store.as_deref_mut() {
            Some(store) if store.contains(code) => {
                debug!(code = code.as_str(), "reading from store");
                store.load(code, Some(start_date), Some(end_date))?
            }
            Some(store) => match store.put(code, source, start_date, end_date) {
                Ok(bars) => bars,
                Err(e) => {
                    warn!(code = code.as_str(), error = %e, "price fetch failed, treating as empty");
                    Vec::new()
                }
            },
            None => fetch_or_empty(source, code, start_date, end_date),
        };

        if bars.is_empty() {
            return Err(SectraderError::NoData { code: code.clone() });
        }
        info!(code = code.as_str(), bars = bars.len(), "loaded price history");
        columns.push((code.clone(), bars));
    }

    let series = PriceSeries::join(columns)?;
    if codes.len() > 1 {
        info!(rows = series.len(), "joined securities on common dates");
    }
    Ok(series)
}
