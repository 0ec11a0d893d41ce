#![allow(dead_code)]

use chrono::NaiveDate;
use sectrader::domain::backtest::{BacktestConfig, SimulationConfig};
use sectrader::domain::error::SectraderError;
pub use sectrader::domain::ohlcv::OhlcvBar;
use sectrader::domain::strategy::IndicatorConfig;
use sectrader::ports::data_port::DataPort;
use std::cell::Cell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub fetches: Cell<usize>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            fetches: Cell::new(0),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SectraderError> {
        self.fetches.set(self.fetches.get() + 1);
        if let Some(reason) = self.errors.get(code) {
            return Err(SectraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

/// One bar per calendar day from `start_date` with the given closes.
pub fn bars_from_closes(start_date: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        })
        .collect()
}

/// Closes of the known crossover scenario: one buy at 9, one sell at 11.
pub const CROSSOVER_CLOSES: [f64; 6] = [10.0, 10.0, 12.0, 8.0, 9.0, 11.0];

pub fn crossover_config(cash: f64) -> SimulationConfig {
    SimulationConfig {
        initial_cash: cash,
        indicators: vec![IndicatorConfig::MaCrossover { short: 3, long: 2 }],
        ..SimulationConfig::default()
    }
}

pub fn sample_config(codes: &[&str]) -> BacktestConfig {
    BacktestConfig {
        codes: codes.iter().map(|c| c.to_string()).collect(),
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        data_directory: None,
        verbose: false,
        simulation: crossover_config(100.0),
    }
}
