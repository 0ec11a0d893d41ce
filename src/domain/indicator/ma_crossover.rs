//! Moving-average crossover indicator.
//!
//! Computes a short and a long simple moving average and their difference
//! `diff = short - long`. A crossover is flagged on the day the sign of
//! `diff` (-1, 0 or +1) differs from the previous day's sign. The first day
//! with a defined `diff` has no predecessor and is never a crossover.
//!
//! Warmup: a point is valid once both averages are defined.

use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::{OhlcvBar, PriceField};

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Crossover flags for a sequence of differences.
pub fn detect_crossovers(diffs: &[f64]) -> Vec<bool> {
    let mut flags = Vec::with_capacity(diffs.len());
    for (i, &diff) in diffs.iter().enumerate() {
        flags.push(i > 0 && sign(diff) != sign(diffs[i - 1]));
    }
    flags
}

pub fn calculate_ma_crossover(
    bars: &[OhlcvBar],
    field: PriceField,
    short: usize,
    long: usize,
) -> IndicatorSeries {
    let short_ma = calculate_sma(bars, field, short);
    let long_ma = calculate_sma(bars, field, long);

    let averages: Vec<Option<(f64, f64)>> = short_ma
        .values
        .iter()
        .zip(&long_ma.values)
        .map(|(s, l)| match (s.value.simple(), l.value.simple()) {
            (Some(short), Some(long)) if s.valid && l.valid => Some((short, long)),
            _ => None,
        })
        .collect();

    let diffs: Vec<f64> = averages.iter().flatten().map(|(s, l)| s - l).collect();
    let mut flags = detect_crossovers(&diffs).into_iter();

    let values = bars
        .iter()
        .zip(averages)
        .map(|(bar, avg)| match avg {
            Some((short, long)) => IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::MaCrossover {
                    short,
                    long,
                    diff: short - long,
                    crossover: flags.next().unwrap_or(false),
                },
            },
            None => IndicatorPoint {
                date: bar.date,
                valid: false,
                value: IndicatorValue::MaCrossover {
                    short: 0.0,
                    long: 0.0,
                    diff: 0.0,
                    crossover: false,
                },
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::MaCrossover { short, long },
        values,
    }
}
