//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is the sample standard deviation (divides by N-1) and the
//! multiplier is used as given.
//! Warmup: first (period-1) bars are invalid; a period below 2 never
//! produces a valid point.

use crate::domain::indicator::stddev::mean_and_sample_std;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::{OhlcvBar, PriceField};

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    field: PriceField,
    period: usize,
    stddev_mult: f64,
) -> IndicatorSeries {
    let prices: Vec<f64> = bars.iter().map(|b| b.value(field)).collect();
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let valid = period >= 2 && i + 1 >= period;

        let (upper, middle, lower) = if valid {
            let (middle, stddev) = mean_and_sample_std(&prices[i + 1 - period..=i]);
            (
                middle + stddev_mult * stddev,
                middle,
                middle - stddev_mult * stddev,
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult,
        },
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    fn bands(series: &IndicatorSeries, i: usize) -> (f64, f64, f64) {
        match series.values[i].value {
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => (upper, middle, lower),
            _ => panic!("Expected Bollinger value"),
        }
    }

    #[test]
    fn bollinger_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_bollinger(&bars, PriceField::Close, 3, 2.0);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[3].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn bollinger_constant_values() {
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0]);
        let series = calculate_bollinger(&bars, PriceField::Close, 3, 2.0);

        let (upper, middle, lower) = bands(&series, 3);
        assert!((middle - 100.0).abs() < f64::EPSILON);
        assert!((upper - 100.0).abs() < f64::EPSILON);
        assert!((lower - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bollinger_basic_calculation() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_bollinger(&bars, PriceField::Close, 3, 2.0);

        // mean 20, sample stddev sqrt(200 / 2) = 10
        let (upper, middle, lower) = bands(&series, 2);
        assert!((middle - 20.0).abs() < 1e-10);
        assert!((upper - 40.0).abs() < 1e-10);
        assert!((lower - 0.0).abs() < 1e-10);
    }

    #[test]
    fn bollinger_multiplier_variations() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_bollinger(&bars, PriceField::Close, 3, 1.5);

        let (upper, _, lower) = bands(&series, 2);
        assert!((upper - 35.0).abs() < 1e-10);
        assert!((lower - 5.0).abs() < 1e-10);
    }

    #[test]
    fn bollinger_period_one_never_valid() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_bollinger(&bars, PriceField::Close, 1, 2.0);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn bollinger_indicator_type() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_bollinger(&bars, PriceField::Close, 20, 2.0);

        assert_eq!(
            series.indicator_type,
            IndicatorType::Bollinger {
                period: 20,
                stddev_mult: 2.0
            }
        );
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn bollinger_fractional_multiplier_is_exact() {
        let bars = make_bars(&[10.0, 10.0, 10.0, 11.0]);
        let series = calculate_bollinger(&bars, PriceField::Close, 4, 1.499);

        // mean 10.25, sample stddev 0.5
        let (upper, middle, lower) = bands(&series, 3);
        assert!((middle - 10.25).abs() < 1e-10);
        assert!((upper - 10.9995).abs() < 1e-10);
        assert!((lower - 9.5005).abs() < 1e-10);
    }

    #[test]
    fn bollinger_symmetry() {
        let bars = make_bars(&[10.0, 14.0, 9.0, 30.0]);
        let series = calculate_bollinger(&bars, PriceField::Close, 3, 2.0);

        let (upper, middle, lower) = bands(&series, 3);
        assert!(((upper - middle) - (middle - lower)).abs() < 1e-10);
    }
}
