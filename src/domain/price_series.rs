//! Date-aligned OHLCV table for one or more securities.
//!
//! Every security column holds exactly one bar per row date. Securities are
//! kept in lexicographic order, which is also the order the simulation visits
//! them within a day.

use crate::domain::error::SectraderError;
use crate::domain::ohlcv::{OhlcvBar, PriceField};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<OhlcvBar>>,
}

impl PriceSeries {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(code: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, SectraderError> {
        Self::join(vec![(code.into(), bars)])
    }

    /// Aligns several securities on the dates they all share.
    pub fn join(securities: Vec<(String, Vec<OhlcvBar>)>) -> Result<Self, SectraderError> {
        let mut common: Option<BTreeSet<NaiveDate>> = None;
        for (code, bars) in &securities {
            check_ordered(bars)?;
            let dates: BTreeSet<NaiveDate> = bars.iter().map(|b| b.date).collect();
            common = Some(match common {
                None => dates,
                Some(acc) => acc.intersection(&dates).copied().collect(),
            });
            if code.trim().is_empty() {
                return Err(SectraderError::shape("empty security identifier"));
            }
        }
        let common = common.unwrap_or_default();

        let mut columns = BTreeMap::new();
        for (code, bars) in securities {
            let aligned: Vec<OhlcvBar> = bars
                .into_iter()
                .filter(|b| common.contains(&b.date))
                .collect();
            if columns.insert(code.clone(), aligned).is_some() {
                return Err(SectraderError::shape(format!(
                    "security {} appears more than once",
                    code
                )));
            }
        }

        Ok(Self {
            dates: common.into_iter().collect(),
            columns,
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn securities(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn security_count(&self) -> usize {
        self.columns.len()
    }

    pub fn bars(&self, code: &str) -> Option<&[OhlcvBar]> {
        self.columns.get(code).map(Vec::as_slice)
    }

    pub fn values(&self, code: &str, field: PriceField) -> Result<Vec<f64>, SectraderError> {
        let bars = self
            .bars(code)
            .ok_or_else(|| SectraderError::shape(format!("unknown security {}", code)))?;
        Ok(bars.iter().map(|b| b.value(field)).collect())
    }

    /// The identifier of the only security in the series.
    pub fn single_security(&self) -> Result<&str, SectraderError> {
        let mut codes = self.securities();
        match (codes.next(), codes.next()) {
            (Some(code), None) => Ok(code),
            (None, _) => Err(SectraderError::shape("series contains no security")),
            (Some(_), Some(_)) => Err(SectraderError::shape(format!(
                "expected exactly one security, found {}",
                self.security_count()
            ))),
        }
    }

    /// Simple period returns of a single-security series. The first row has no
    /// prior value and yields `None`.
    pub fn returns(&self, field: PriceField) -> Result<Vec<(NaiveDate, Option<f64>)>, SectraderError> {
        let code = self.single_security()?;
        let values = self.values(code, field)?;
        Ok(self
            .dates
            .iter()
            .enumerate()
            .map(|(i, &date)| {
                let ret = (i > 0).then(|| (values[i] - values[i - 1]) / values[i - 1]);
                (date, ret)
            })
            .collect())
    }

    /// Rows whose date falls inside the optional inclusive bounds.
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let keep = |d: &NaiveDate| start.is_none_or(|s| *d >= s) && end.is_none_or(|e| *d <= e);
        Self {
            dates: self.dates.iter().copied().filter(|d| keep(d)).collect(),
            columns: self
                .columns
                .iter()
                .map(|(code, bars)| {
                    let kept = bars.iter().filter(|b| keep(&b.date)).cloned().collect();
                    (code.clone(), kept)
                })
                .collect(),
        }
    }
}

fn check_ordered(bars: &[OhlcvBar]) -> Result<(), SectraderError> {
    for pair in bars.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(SectraderError::UnorderedDates {
                previous: pair[0].date,
                next: pair[1].date,
            });
        }
    }
    Ok(())
}
