//! Backtest run configuration and the simulation event loop.
//!
//! The loop walks an [`AnnotatedFrame`] one date at a time and, within a
//! date, one security at a time in lexicographic order. Each configured
//! indicator is checked independently, so a moving-average exit and a
//! Bollinger entry can both happen for the same security on the same day.
//! Trades always execute at the day's close.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

use crate::domain::annotated::{AnnotatedFrame, AnnotatedSeries, SecurityState};
use crate::domain::error::SectraderError;
use crate::domain::ohlcv::PriceField;
use crate::domain::portfolio::Portfolio;
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::SignalKind;
use crate::domain::strategy::{check_unique, IndicatorConfig};
use crate::domain::transaction::Transaction;
use crate::ports::trade_observer::{TradeEvent, TradeObserver};

pub const DEFAULT_INITIAL_CASH: f64 = 10_000.0;

/// How purchase prices gate later trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryPriceMode {
    /// Entry price kept per security. Buys need more cash than the price
    /// being paid and every exit needs a profit over the entry.
    #[default]
    PerSecurity,
    /// One purchase price shared by all securities, starting at zero.
    /// Buys need more cash than the last purchase price; Bollinger exits
    /// ignore it.
    Shared,
}

impl EntryPriceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryPriceMode::PerSecurity => "per_security",
            EntryPriceMode::Shared => "shared",
        }
    }
}

impl fmt::Display for EntryPriceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryPriceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_security" | "per-security" => Ok(EntryPriceMode::PerSecurity),
            "shared" => Ok(EntryPriceMode::Shared),
            other => Err(format!(
                "unknown entry price mode '{}', expected per_security or shared",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub initial_cash: f64,
    pub price_field: PriceField,
    pub indicators: Vec<IndicatorConfig>,
    pub entry_price_mode: EntryPriceMode,
    /// Annotated for inspection only; never gates a trade.
    pub rsi_period: Option<usize>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            initial_cash: DEFAULT_INITIAL_CASH,
            price_field: PriceField::Close,
            indicators: vec![IndicatorConfig::MaCrossover { short: 5, long: 10 }],
            entry_price_mode: EntryPriceMode::PerSecurity,
            rsi_period: None,
        }
    }
}

/// Everything a `backtest` run reads from its configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub codes: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub data_directory: Option<PathBuf>,
    pub verbose: bool,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub portfolio: Portfolio,
    pub frame: AnnotatedFrame,
}

impl SimulationResult {
    /// Cash plus holdings valued at the final row's closes.
    pub fn final_value(&self) -> Result<f64, SectraderError> {
        let Some(last) = self.frame.rows().last() else {
            return Ok(self.portfolio.cash());
        };
        let prices: HashMap<String, f64> = last
            .entries
            .iter()
            .map(|(code, state)| (code.clone(), state.bar.close))
            .collect();
        self.portfolio.total_value(&prices)
    }
}

/// Annotates `series` with the configured indicators and replays the
/// resulting signals against a fresh portfolio.
pub fn run_simulation(
    series: &PriceSeries,
    config: &SimulationConfig,
    observer: &mut dyn TradeObserver,
) -> Result<SimulationResult, SectraderError> {
    if !config.initial_cash.is_finite() || config.initial_cash <= 0.0 {
        return Err(SectraderError::invalid(
            "backtest",
            "initial_cash",
            "must be a positive number",
        ));
    }
    check_unique(&config.indicators)?;

    let mut annotated = AnnotatedSeries::new(series.clone(), config.price_field);
    for indicator in &config.indicators {
        annotated = annotated.with_indicator(indicator)?;
    }
    if let Some(period) = config.rsi_period {
        annotated = annotated.with_rsi(period)?;
    }
    let frame = annotated.finalize();

    info!(
        rows = frame.len(),
        securities = frame.securities().len(),
        mode = %config.entry_price_mode,
        "starting simulation"
    );

    let mut sim = Simulation::new(config);
    for row in frame.rows() {
        for (security, state) in &row.entries {
            sim.step(row.date, security, state, observer)?;
        }
    }

    info!(
        trades = sim.portfolio.transactions().len(),
        cash = sim.portfolio.cash(),
        "simulation finished"
    );

    Ok(SimulationResult {
        portfolio: sim.portfolio,
        frame,
    })
}

struct Simulation {
    portfolio: Portfolio,
    mode: EntryPriceMode,
    trade_ma: bool,
    trade_bollinger: bool,
    entry_prices: BTreeMap<String, f64>,
    shared_entry: f64,
}

impl Simulation {
    fn new(config: &SimulationConfig) -> Self {
        let indicators = &config.indicators;
        Simulation {
            portfolio: Portfolio::new(config.initial_cash),
            mode: config.entry_price_mode,
            trade_ma: indicators
                .iter()
                .any(|i| matches!(i, IndicatorConfig::MaCrossover { .. })),
            trade_bollinger: indicators
                .iter()
                .any(|i| matches!(i, IndicatorConfig::Bollinger { .. })),
            entry_prices: BTreeMap::new(),
            shared_entry: 0.0,
        }
    }

    fn held(&self, security: &str) -> bool {
        self.entry_prices.contains_key(security)
    }

    /// Cash must exceed this before a buy is attempted.
    fn buy_threshold(&self, close: f64) -> f64 {
        match self.mode {
            EntryPriceMode::PerSecurity => close,
            EntryPriceMode::Shared => self.shared_entry,
        }
    }

    fn entry_price(&self, security: &str) -> f64 {
        match self.mode {
            EntryPriceMode::PerSecurity => self.entry_prices.get(security).copied().unwrap_or(0.0),
            EntryPriceMode::Shared => self.shared_entry,
        }
    }

    fn step(
        &mut self,
        date: NaiveDate,
        security: &str,
        state: &SecurityState,
        observer: &mut dyn TradeObserver,
    ) -> Result<(), SectraderError> {
        let close = state.bar.close;

        if let Some(ma) = state.ma.filter(|m| self.trade_ma && m.crossover) {
            if !self.held(security)
                && ma.diff > 0.0
                && self.portfolio.cash() > self.buy_threshold(close)
            {
                self.buy(date, security, close, SignalKind::MaCrossover, observer)?;
            } else if self.held(security) && ma.diff < 0.0 && close > self.entry_price(security) {
                self.sell(date, security, close, SignalKind::MaCrossover, observer)?;
            }
        }

        if let Some(bands) = state.bollinger.filter(|_| self.trade_bollinger) {
            let value = state.price;
            if !self.held(security)
                && value < bands.low
                && self.portfolio.cash() > self.buy_threshold(close)
            {
                self.buy(date, security, close, SignalKind::Bollinger, observer)?;
            } else if self.held(security) && value > bands.high && self.bollinger_exit_ok(security, value) {
                self.sell(date, security, close, SignalKind::Bollinger, observer)?;
            }
        }

        Ok(())
    }

    fn bollinger_exit_ok(&self, security: &str, value: f64) -> bool {
        match self.mode {
            EntryPriceMode::PerSecurity => value > self.entry_price(security),
            EntryPriceMode::Shared => true,
        }
    }

    fn buy(
        &mut self,
        date: NaiveDate,
        security: &str,
        close: f64,
        trigger: SignalKind,
        observer: &mut dyn TradeObserver,
    ) -> Result<(), SectraderError> {
        let transaction = self.portfolio.buy_max(security, close, date)?.clone();
        self.entry_prices.insert(security.to_string(), close);
        self.shared_entry = close;
        debug!(%date, security, %trigger, quantity = transaction.quantity, price = close, "buy");
        notify(observer, transaction, trigger);
        Ok(())
    }

    fn sell(
        &mut self,
        date: NaiveDate,
        security: &str,
        close: f64,
        trigger: SignalKind,
        observer: &mut dyn TradeObserver,
    ) -> Result<(), SectraderError> {
        let transaction = self.portfolio.sell_all(security, close, date)?.clone();
        self.entry_prices.remove(security);
        debug!(%date, security, %trigger, quantity = transaction.quantity, price = close, "sell");
        notify(observer, transaction, trigger);
        Ok(())
    }
}

fn notify(observer: &mut dyn TradeObserver, transaction: Transaction, trigger: SignalKind) {
    let cash_before = transaction.cash_before();
    observer.on_trade(&TradeEvent {
        transaction,
        cash_before,
        trigger,
    });
}
