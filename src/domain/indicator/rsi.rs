//! RSI (Relative Strength Index) over a rolling window.
//!
//! Each point looks at the `n` most recent values (so `n - 1` successive
//! differences). Gains and losses are averaged over the differences of their
//! own sign, not over the whole window:
//!
//! - avg_gain = mean of positive differences
//! - avg_loss = -(mean of negative differences)
//! - RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//!
//! A window without any movement is neutral (50); without losses 100;
//! without gains 0.
//!
//! Warmup: first (n-1) bars are invalid; n < 2 never produces a valid point.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::{OhlcvBar, PriceField};

pub const NEUTRAL_RSI: f64 = 50.0;

/// RSI of a single window of values.
pub fn window_rsi(window: &[f64]) -> f64 {
    let mut gain_sum = 0.0;
    let mut gain_count = 0usize;
    let mut loss_sum = 0.0;
    let mut loss_count = 0usize;

    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gain_sum += change;
            gain_count += 1;
        } else if change < 0.0 {
            loss_sum += change;
            loss_count += 1;
        }
    }

    match (gain_count, loss_count) {
        (0, 0) => NEUTRAL_RSI,
        (_, 0) => 100.0,
        (0, _) => 0.0,
        _ => {
            let avg_gain = gain_sum / gain_count as f64;
            let avg_loss = -loss_sum / loss_count as f64;
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        }
    }
}

pub fn calculate_rsi(bars: &[OhlcvBar], field: PriceField, period: usize) -> IndicatorSeries {
    let prices: Vec<f64> = bars.iter().map(|b| b.value(field)).collect();
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let valid = period >= 2 && i + 1 >= period;
        let rsi = if valid {
            window_rsi(&prices[i + 1 - period..=i])
        } else {
            0.0
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: IndicatorValue::Simple(rsi),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}
