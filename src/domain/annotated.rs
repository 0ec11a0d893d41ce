//! Indicator annotation pipeline.
//!
//! [`AnnotatedSeries`] wraps a [`PriceSeries`] and collects indicator
//! columns one stage at a time. Stages only add columns; a second stage of
//! the same kind is rejected. [`AnnotatedSeries::finalize`] resolves signals
//! and drops every row where any configured indicator is still warming up,
//! producing an immutable [`AnnotatedFrame`].

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::domain::error::SectraderError;
use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::ma_crossover::calculate_ma_crossover;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::ohlcv::{OhlcvBar, PriceField};
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::{bollinger_signal, crossover_signal, Signal};
use crate::domain::strategy::IndicatorConfig;

type Columns = BTreeMap<String, IndicatorSeries>;

#[derive(Debug, Clone)]
pub struct AnnotatedSeries {
    base: PriceSeries,
    field: PriceField,
    ma: Option<Columns>,
    bollinger: Option<Columns>,
    rsi: Option<Columns>,
}

impl AnnotatedSeries {
    pub fn new(base: PriceSeries, field: PriceField) -> Self {
        AnnotatedSeries {
            base,
            field,
            ma: None,
            bollinger: None,
            rsi: None,
        }
    }

    pub fn base(&self) -> &PriceSeries {
        &self.base
    }

    pub fn with_ma_crossover(mut self, short: usize, long: usize) -> Result<Self, SectraderError> {
        if self.ma.is_some() {
            return Err(SectraderError::shape("moving-average crossover already annotated"));
        }
        let field = self.field;
        self.ma = Some(self.compute(|bars| calculate_ma_crossover(bars, field, short, long)));
        Ok(self)
    }

    pub fn with_bollinger(mut self, period: usize, stddev_mult: f64) -> Result<Self, SectraderError> {
        if self.bollinger.is_some() {
            return Err(SectraderError::shape("Bollinger bands already annotated"));
        }
        let field = self.field;
        self.bollinger = Some(self.compute(|bars| calculate_bollinger(bars, field, period, stddev_mult)));
        Ok(self)
    }

    pub fn with_rsi(mut self, period: usize) -> Result<Self, SectraderError> {
        if self.rsi.is_some() {
            return Err(SectraderError::shape("RSI already annotated"));
        }
        let field = self.field;
        self.rsi = Some(self.compute(|bars| calculate_rsi(bars, field, period)));
        Ok(self)
    }

    pub fn with_indicator(self, indicator: &IndicatorConfig) -> Result<Self, SectraderError> {
        match *indicator {
            IndicatorConfig::MaCrossover { short, long } => self.with_ma_crossover(short, long),
            IndicatorConfig::Bollinger {
                period,
                stddev_mult,
            } => self.with_bollinger(period, stddev_mult),
        }
    }

    fn compute(&self, calc: impl Fn(&[OhlcvBar]) -> IndicatorSeries) -> Columns {
        self.base
            .securities()
            .filter_map(|code| self.base.bars(code).map(|bars| (code.to_string(), calc(bars))))
            .collect()
    }

    pub fn finalize(self) -> AnnotatedFrame {
        let securities: Vec<String> = self.base.securities().map(str::to_string).collect();
        let mut rows = Vec::new();

        'rows: for (i, &date) in self.base.dates().iter().enumerate() {
            let mut entries = BTreeMap::new();
            for code in &securities {
                let Some(bar) = self.base.bars(code).and_then(|bars| bars.get(i)) else {
                    continue 'rows;
                };
                let price = bar.value(self.field);

                let ma = match point_at(&self.ma, code, i) {
                    Lookup::Absent => None,
                    Lookup::Warming => continue 'rows,
                    Lookup::Ready(point) => match point.value {
                        IndicatorValue::MaCrossover {
                            short,
                            long,
                            diff,
                            crossover,
                        } => Some(MaState {
                            short,
                            long,
                            diff,
                            crossover,
                            signal: crossover_signal(crossover, diff),
                        }),
                        _ => None,
                    },
                };

                let bollinger = match point_at(&self.bollinger, code, i) {
                    Lookup::Absent => None,
                    Lookup::Warming => continue 'rows,
                    Lookup::Ready(point) => match point.value {
                        IndicatorValue::Bollinger {
                            upper,
                            middle,
                            lower,
                        } => Some(BollingerState {
                            mean: middle,
                            high: upper,
                            low: lower,
                            signal: bollinger_signal(price, lower, upper),
                        }),
                        _ => None,
                    },
                };

                let rsi = match point_at(&self.rsi, code, i) {
                    Lookup::Absent => None,
                    Lookup::Warming => continue 'rows,
                    Lookup::Ready(point) => point.value.simple(),
                };

                entries.insert(
                    code.clone(),
                    SecurityState {
                        bar: bar.clone(),
                        price,
                        ma,
                        bollinger,
                        rsi,
                    },
                );
            }
            rows.push(AnnotatedRow { date, entries });
        }

        AnnotatedFrame {
            field: self.field,
            securities,
            rows,
        }
    }
}

enum Lookup<'a> {
    Absent,
    Warming,
    Ready(&'a IndicatorPoint),
}

fn point_at<'a>(columns: &'a Option<Columns>, code: &str, i: usize) -> Lookup<'a> {
    let Some(columns) = columns else {
        return Lookup::Absent;
    };
    match columns.get(code).and_then(|s| s.values.get(i)) {
        Some(point) if point.valid => Lookup::Ready(point),
        _ => Lookup::Warming,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaState {
    pub short: f64,
    pub long: f64,
    pub diff: f64,
    pub crossover: bool,
    pub signal: Signal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerState {
    pub mean: f64,
    pub high: f64,
    pub low: f64,
    pub signal: Signal,
}

/// Derived values for one security on one day. `price` is the configured
/// price field; trades execute at `bar.close`.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityState {
    pub bar: OhlcvBar,
    pub price: f64,
    pub ma: Option<MaState>,
    pub bollinger: Option<BollingerState>,
    pub rsi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRow {
    pub date: NaiveDate,
    pub entries: BTreeMap<String, SecurityState>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedFrame {
    field: PriceField,
    securities: Vec<String>,
    rows: Vec<AnnotatedRow>,
}

impl AnnotatedFrame {
    pub fn field(&self) -> PriceField {
        self.field
    }

    pub fn securities(&self) -> &[String] {
        &self.securities
    }

    pub fn rows(&self) -> &[AnnotatedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
