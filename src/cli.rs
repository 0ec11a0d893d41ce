//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_store::MemoryStore;
use crate::adapters::observers::{NarratingObserver, TracingObserver};
use crate::domain::annotated::AnnotatedSeries;
use crate::domain::backtest::{run_simulation, BacktestConfig, SimulationResult};
use crate::domain::config_validation::load_backtest_config;
use crate::domain::error::SectraderError;
use crate::domain::ohlcv::PriceField;
use crate::domain::portfolio::Portfolio;
use crate::domain::signal::{signal_events, SignalEvent, SignalFilter};
use crate::domain::universe::load_price_series;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;
use crate::ports::store_port::StorePort;
use crate::ports::trade_observer::TradeObserver;

#[derive(Parser, Debug)]
#[command(name = "sectrader", about = "Indicator-driven security backtester")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Price data directory, overriding [data] directory
        #[arg(long)]
        data: Option<PathBuf>,
        /// Write the transaction ledger as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Suppress per-trade narration
        #[arg(short, long)]
        quiet: bool,
    },
    /// List buy/sell signals for one security
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        code: String,
        #[arg(long)]
        buy: bool,
        #[arg(long)]
        sell: bool,
    },
    /// Print the RSI series for one security
    Rsi {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        code: String,
        #[arg(long, default_value_t = 14)]
        period: usize,
        #[arg(long, default_value_t = PriceField::Close)]
        field: PriceField,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            data,
            output,
            quiet,
        } => run_backtest(&config, data.as_deref(), output.as_deref(), quiet),
        Command::Signals {
            config,
            data,
            code,
            buy,
            sell,
        } => run_signals(&config, data.as_deref(), &code, signal_filter(buy, sell)),
        Command::Rsi {
            data,
            code,
            period,
            field,
            start,
            end,
        } => run_rsi(&data, &code, period, field, start, end),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Neither flag means both directions.
pub fn signal_filter(buy: bool, sell: bool) -> SignalFilter {
    if !buy && !sell {
        SignalFilter::ALL
    } else {
        SignalFilter { buy, sell }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SectraderError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// The `--data` override wins over the configured directory.
pub fn resolve_data_dir(
    data_override: Option<&Path>,
    config: &BacktestConfig,
) -> Result<PathBuf, SectraderError> {
    data_override
        .map(Path::to_path_buf)
        .or_else(|| config.data_directory.clone())
        .ok_or_else(|| SectraderError::ConfigMissing {
            section: "data".to_string(),
            key: "directory".to_string(),
        })
}

/// Loads every configured code and runs the simulation. Codes already in
/// `store` are not fetched from `source` again.
pub fn run_backtest_pipeline(
    source: &dyn DataPort,
    store: &mut dyn StorePort,
    config: &BacktestConfig,
    observer: &mut dyn TradeObserver,
) -> Result<SimulationResult, SectraderError> {
    let series = load_price_series(
        source,
        Some(store),
        &config.codes,
        config.start_date,
        config.end_date,
    )?;
    info!(
        codes = config.codes.len(),
        rows = series.len(),
        "price history loaded"
    );
    run_simulation(&series, &config.simulation, observer)
}

fn run_backtest(
    config_path: &Path,
    data_override: Option<&Path>,
    output_path: Option<&Path>,
    quiet: bool,
) -> Result<(), SectraderError> {
    let adapter = load_config(config_path)?;
    let config = load_backtest_config(&adapter)?;
    let source = CsvAdapter::new(resolve_data_dir(data_override, &config)?);

    eprintln!(
        "Backtesting {} from {} to {}",
        config.codes.join(", "),
        config.start_date,
        config.end_date
    );
    for indicator in &config.simulation.indicators {
        eprintln!("  indicator: {}", indicator);
    }

    let mut store = MemoryStore::new();
    let result = if config.verbose && !quiet {
        let stdout = io::stdout();
        let mut narrator = NarratingObserver::new(stdout.lock());
        run_backtest_pipeline(&source, &mut store, &config, &mut narrator)?
    } else {
        run_backtest_pipeline(&source, &mut store, &config, &mut TracingObserver)?
    };

    print_summary(&result)?;

    if let Some(output) = output_path {
        CsvReportAdapter::new().write(&result.portfolio, output)?;
        eprintln!("\nLedger written to: {}", output.display());
    }
    Ok(())
}

pub fn print_summary(result: &SimulationResult) -> Result<(), SectraderError> {
    let portfolio: &Portfolio = &result.portfolio;
    let final_value = result.final_value()?;
    let initial = portfolio.initial_cash();

    eprintln!("\n=== Results ===");
    eprintln!("Rows simulated:   {}", result.frame.len());
    eprintln!("Initial cash:     {:.2}", initial);
    eprintln!("Final cash:       {:.2}", portfolio.cash());
    eprintln!("Final value:      {:.2}", final_value);
    eprintln!("Total return:     {:.2}%", (final_value / initial - 1.0) * 100.0);
    eprintln!("Last sell cash:   {:.2}", portfolio.last_sell_cash());
    eprintln!("Transactions:     {}", portfolio.transactions().len());
    if let Some(interval) = portfolio.average_transaction_interval() {
        eprintln!(
            "Avg trade gap:    {:.1} days",
            interval.num_seconds() as f64 / 86_400.0
        );
    }
    if !portfolio.holdings().is_empty() {
        eprintln!("Holdings:");
        for (security, shares) in portfolio.holdings() {
            eprintln!("  {}: {}", security, shares);
        }
    }
    Ok(())
}

fn run_signals(
    config_path: &Path,
    data_override: Option<&Path>,
    code: &str,
    filter: SignalFilter,
) -> Result<(), SectraderError> {
    let adapter = load_config(config_path)?;
    let config = load_backtest_config(&adapter)?;
    let source = CsvAdapter::new(resolve_data_dir(data_override, &config)?);

    let events = list_signals(&source, &config, code, filter)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "date,security,indicator,signal,price")?;
    for e in &events {
        writeln!(out, "{},{},{},{},{:.4}", e.date, e.security, e.kind, e.signal, e.price)?;
    }
    eprintln!("{} signals", events.len());
    Ok(())
}

/// Signal events for one security under the configured indicators.
pub fn list_signals(
    source: &dyn DataPort,
    config: &BacktestConfig,
    code: &str,
    filter: SignalFilter,
) -> Result<Vec<SignalEvent>, SectraderError> {
    let code = code.trim().to_uppercase();
    let series = load_price_series(
        source,
        None,
        std::slice::from_ref(&code),
        config.start_date,
        config.end_date,
    )?;

    let mut annotated = AnnotatedSeries::new(series, config.simulation.price_field);
    for indicator in &config.simulation.indicators {
        annotated = annotated.with_indicator(indicator)?;
    }
    signal_events(&annotated.finalize(), &code, filter)
}

/// `(date, rsi)` rows for one security once the window is filled.
pub fn rsi_table(
    source: &dyn DataPort,
    code: &str,
    period: usize,
    field: PriceField,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(NaiveDate, f64)>, SectraderError> {
    let code = code.trim().to_uppercase();
    let series = load_price_series(source, None, std::slice::from_ref(&code), start, end)?;
    let frame = AnnotatedSeries::new(series, field).with_rsi(period)?.finalize();

    Ok(frame
        .rows()
        .iter()
        .filter_map(|row| row.entries.get(&code).and_then(|s| s.rsi).map(|rsi| (row.date, rsi)))
        .collect())
}

fn run_rsi(
    data: &Path,
    code: &str,
    period: usize,
    field: PriceField,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), SectraderError> {
    let source = CsvAdapter::new(data.to_path_buf());
    let rows = rsi_table(
        &source,
        code,
        period,
        field,
        start.unwrap_or(NaiveDate::MIN),
        end.unwrap_or(NaiveDate::MAX),
    )?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "date,rsi")?;
    for (date, rsi) in &rows {
        writeln!(out, "{},{:.2}", date, rsi)?;
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), SectraderError> {
    let adapter = load_config(config_path)?;
    let config = load_backtest_config(&adapter)?;
    let sim = &config.simulation;

    eprintln!("Config validated successfully");
    eprintln!("\nUniverse:");
    eprintln!("  codes: {}", config.codes.join(", "));
    eprintln!("  range: {} to {}", config.start_date, config.end_date);
    if let Some(dir) = &config.data_directory {
        eprintln!("  data:  {}", dir.display());
    }
    eprintln!("\nSimulation:");
    eprintln!("  initial cash:     {:.2}", sim.initial_cash);
    eprintln!("  price field:      {}", sim.price_field);
    eprintln!("  entry price mode: {}", sim.entry_price_mode);
    if sim.indicators.is_empty() {
        eprintln!("  indicators:       none (no trades will be made)");
    }
    for indicator in &sim.indicators {
        eprintln!("  indicator:        {}", indicator);
    }
    if let Some(period) = sim.rsi_period {
        eprintln!("  rsi period:       {} (diagnostic)", period);
    }
    Ok(())
}
