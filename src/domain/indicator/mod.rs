//! Technical indicator implementations.
//!
//! Every calculator returns an [`IndicatorSeries`] with one point per input
//! bar. Points inside the warmup window are marked invalid; the annotation
//! pipeline drops those rows when it finalizes.

pub mod bollinger;
pub mod ma_crossover;
pub mod rsi;
pub mod sma;
pub mod stddev;

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    MaCrossover {
        short: f64,
        long: f64,
        diff: f64,
        crossover: bool,
    },
}

impl IndicatorValue {
    pub fn simple(&self) -> Option<f64> {
        match self {
            IndicatorValue::Simple(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    MaCrossover { short: usize, long: usize },
    Bollinger { period: usize, stddev_mult: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}
