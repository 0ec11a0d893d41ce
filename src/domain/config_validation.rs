//! Reading and validating run configuration.
//!
//! Every reader returns a typed value or a `Config*` error naming the
//! section and key at fault. [`load_backtest_config`] composes them into a
//! [`BacktestConfig`]; [`validate_backtest_config`] runs the same checks
//! without keeping the result.

use crate::domain::backtest::{BacktestConfig, EntryPriceMode, SimulationConfig, DEFAULT_INITIAL_CASH};
use crate::domain::error::SectraderError;
use crate::domain::ohlcv::PriceField;
use crate::domain::strategy::IndicatorConfig;
use crate::domain::universe::parse_codes;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::path::PathBuf;

const BACKTEST: &str = "backtest";
const INDICATORS: &str = "indicators";
const DATA: &str = "data";

/// Indicator keys the loader understands. Anything else under
/// `[indicators]` is ignored.
const INDICATOR_KEYS: [&str; 4] = ["ma_crossovers", "bollinger_len", "bollinger_std", "rsi_period"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SectraderError> {
    load_backtest_config(config).map(|_| ())
}

pub fn load_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SectraderError> {
    let codes = read_codes(config)?;
    let (start_date, end_date) = read_dates(config)?;

    Ok(BacktestConfig {
        codes,
        start_date,
        end_date,
        data_directory: config.get_string(DATA, "directory").map(PathBuf::from),
        verbose: config.get_bool(BACKTEST, "verbose", true),
        simulation: read_simulation_config(config)?,
    })
}

pub fn read_simulation_config(config: &dyn ConfigPort) -> Result<SimulationConfig, SectraderError> {
    Ok(SimulationConfig {
        initial_cash: read_initial_cash(config)?,
        price_field: read_price_field(config)?,
        indicators: read_indicators(config)?,
        entry_price_mode: read_entry_price_mode(config)?,
        rsi_period: read_rsi_period(config)?,
    })
}

fn read_initial_cash(config: &dyn ConfigPort) -> Result<f64, SectraderError> {
    let Some(raw) = config.get_string(BACKTEST, "initial_cash") else {
        return Ok(DEFAULT_INITIAL_CASH);
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(SectraderError::invalid(
            BACKTEST,
            "initial_cash",
            "initial_cash must be a positive number",
        )),
    }
}

fn read_price_field(config: &dyn ConfigPort) -> Result<PriceField, SectraderError> {
    match config.get_string(BACKTEST, "price_field") {
        None => Ok(PriceField::default()),
        Some(raw) => raw
            .parse()
            .map_err(|reason: String| SectraderError::invalid(BACKTEST, "price_field", reason)),
    }
}

fn read_entry_price_mode(config: &dyn ConfigPort) -> Result<EntryPriceMode, SectraderError> {
    match config.get_string(BACKTEST, "entry_price_mode") {
        None => Ok(EntryPriceMode::default()),
        Some(raw) => raw
            .parse()
            .map_err(|reason: String| SectraderError::invalid(BACKTEST, "entry_price_mode", reason)),
    }
}

pub fn read_codes(config: &dyn ConfigPort) -> Result<Vec<String>, SectraderError> {
    let raw = config
        .get_string(BACKTEST, "codes")
        .ok_or_else(|| SectraderError::ConfigMissing {
            section: BACKTEST.to_string(),
            key: "codes".to_string(),
        })?;
    parse_codes(&raw).map_err(|e| SectraderError::invalid(BACKTEST, "codes", e.to_string()))
}

pub fn read_dates(config: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), SectraderError> {
    let start_date = parse_date(config.get_string(BACKTEST, "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string(BACKTEST, "end_date").as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(SectraderError::invalid(
            BACKTEST,
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok((start_date, end_date))
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SectraderError> {
    match value {
        None => Err(SectraderError::ConfigMissing {
            section: BACKTEST.to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            SectraderError::invalid(
                BACKTEST,
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

/// Comma-separated list of positive integers.
fn parse_lengths(raw: &str, key: &str) -> Result<Vec<usize>, SectraderError> {
    raw.split(',')
        .map(|token| {
            token.trim().parse::<usize>().map_err(|_| {
                SectraderError::invalid(INDICATORS, key, format!("'{}' is not a whole number", token.trim()))
            })
        })
        .collect()
}

fn parse_usize(config: &dyn ConfigPort, key: &str) -> Result<Option<usize>, SectraderError> {
    config
        .get_string(INDICATORS, key)
        .map(|raw| {
            raw.trim()
                .parse::<usize>()
                .map_err(|_| SectraderError::invalid(INDICATORS, key, "must be a whole number"))
        })
        .transpose()
}

pub fn read_indicators(config: &dyn ConfigPort) -> Result<Vec<IndicatorConfig>, SectraderError> {
    if !INDICATOR_KEYS.iter().any(|key| config.has_key(INDICATORS, key)) {
        return Ok(SimulationConfig::default().indicators);
    }

    let mut indicators = Vec::new();

    if let Some(raw) = config.get_string(INDICATORS, "ma_crossovers") {
        let lengths = parse_lengths(&raw, "ma_crossovers")?;
        indicators.push(IndicatorConfig::ma_crossover(&lengths)?);
    }

    let bollinger_len = parse_usize(config, "bollinger_len")?;
    let bollinger_std = config
        .get_string(INDICATORS, "bollinger_std")
        .map(|raw| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| SectraderError::invalid(INDICATORS, "bollinger_std", "must be a number"))
        })
        .transpose()?;

    match (bollinger_len, bollinger_std) {
        (Some(period), Some(mult)) => indicators.push(IndicatorConfig::bollinger(period, mult)?),
        (Some(_), None) | (None, Some(_)) => {
            tracing::warn!("bollinger_len and bollinger_std must both be set; Bollinger bands disabled");
        }
        (None, None) => {}
    }

    Ok(indicators)
}

fn read_rsi_period(config: &dyn ConfigPort) -> Result<Option<usize>, SectraderError> {
    match parse_usize(config, "rsi_period")? {
        Some(period) if period < 2 => Err(SectraderError::invalid(
            INDICATORS,
            "rsi_period",
            "must be at least 2",
        )),
        other => Ok(other),
    }
}
