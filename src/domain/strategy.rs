//! Indicator selection for a simulation run.

use std::fmt;

use crate::domain::error::SectraderError;

/// One indicator the simulation trades on. At most one of each kind is
/// active in a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorConfig {
    MaCrossover { short: usize, long: usize },
    Bollinger { period: usize, stddev_mult: f64 },
}

impl IndicatorConfig {
    /// Moving-average crossover from a list of lookbacks. Exactly two
    /// positive lengths are accepted.
    pub fn ma_crossover(lengths: &[usize]) -> Result<Self, SectraderError> {
        match *lengths {
            [short, long] if short > 0 && long > 0 => {
                Ok(IndicatorConfig::MaCrossover { short, long })
            }
            [_, _] => Err(SectraderError::invalid(
                "indicators",
                "ma_crossovers",
                "moving-average lengths must be positive",
            )),
            _ => Err(SectraderError::invalid(
                "indicators",
                "ma_crossovers",
                format!("expected exactly two lengths, got {}", lengths.len()),
            )),
        }
    }

    pub fn bollinger(period: usize, stddev_mult: f64) -> Result<Self, SectraderError> {
        if period < 2 {
            return Err(SectraderError::invalid(
                "indicators",
                "bollinger_len",
                "must be at least 2",
            ));
        }
        if !stddev_mult.is_finite() || stddev_mult < 0.0 {
            return Err(SectraderError::invalid(
                "indicators",
                "bollinger_std",
                "must be a non-negative number",
            ));
        }
        Ok(IndicatorConfig::Bollinger {
            period,
            stddev_mult,
        })
    }

    /// Rows needed before this indicator produces its first value.
    pub fn warmup(&self) -> usize {
        match *self {
            IndicatorConfig::MaCrossover { short, long } => short.max(long),
            IndicatorConfig::Bollinger { period, .. } => period,
        }
    }

    fn same_kind(&self, other: &IndicatorConfig) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for IndicatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            IndicatorConfig::MaCrossover { short, long } => {
                write!(f, "MA crossover ({}/{})", short, long)
            }
            IndicatorConfig::Bollinger {
                period,
                stddev_mult,
            } => write!(f, "Bollinger ({}, {})", period, stddev_mult),
        }
    }
}

/// Rejects a selection holding two indicators of the same kind.
pub fn check_unique(indicators: &[IndicatorConfig]) -> Result<(), SectraderError> {
    for (i, ind) in indicators.iter().enumerate() {
        if indicators[..i].iter().any(|prev| prev.same_kind(ind)) {
            let key = match ind {
                IndicatorConfig::MaCrossover { .. } => "ma_crossovers",
                IndicatorConfig::Bollinger { .. } => "bollinger_len",
            };
            return Err(SectraderError::invalid(
                "indicators",
                key,
                "indicator configured more than once",
            ));
        }
    }
    Ok(())
}
