//! End-to-end tests for the load → annotate → simulate pipeline.

mod common;

use common::*;
use sectrader::adapters::csv_report_adapter::CsvReportAdapter;
use sectrader::adapters::memory_store::MemoryStore;
use sectrader::cli::{list_signals, rsi_table, run_backtest_pipeline};
use sectrader::domain::backtest::{run_simulation, EntryPriceMode, SimulationConfig, SimulationResult};
use sectrader::domain::error::SectraderError;
use sectrader::domain::ohlcv::PriceField;
use sectrader::domain::price_series::PriceSeries;
use sectrader::domain::signal::{Signal, SignalFilter, SignalKind};
use sectrader::domain::strategy::IndicatorConfig;
use sectrader::domain::transaction::TradeKind;
use sectrader::domain::universe::load_price_series;
use sectrader::ports::report_port::ReportPort;
use sectrader::ports::store_port::StorePort;
use sectrader::ports::trade_observer::TradeEvent;

mod pipeline {
    use super::*;

    #[test]
    fn crossover_scenario_through_data_port() {
        let source = MockDataPort::new().with_bars("AAA", bars_from_closes("2024-01-01", &CROSSOVER_CLOSES));
        let config = sample_config(&["AAA"]);
        let mut events: Vec<TradeEvent> = Vec::new();

        let result = run_backtest_pipeline(&source, &mut MemoryStore::new(), &config, &mut events).unwrap();
        let log = result.portfolio.transactions();

        assert_eq!(log.len(), 2);
        assert_eq!(log[0].kind, TradeKind::Buy);
        assert_eq!(log[0].date, date(2024, 1, 5));
        assert_eq!(log[0].quantity, 11);
        assert!((log[0].price - 9.0).abs() < f64::EPSILON);
        assert!((log[0].cash_after - 1.0).abs() < 1e-9);

        assert_eq!(log[1].kind, TradeKind::Sell);
        assert_eq!(log[1].date, date(2024, 1, 6));
        assert_eq!(log[1].quantity, 11);
        assert!((log[1].price - 11.0).abs() < f64::EPSILON);

        assert!((result.portfolio.cash() - 122.0).abs() < 1e-9);
        assert!((result.portfolio.last_sell_cash() - 122.0).abs() < 1e-9);
        assert!((result.final_value().unwrap() - 122.0).abs() < 1e-9);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].transaction, log[0]);
        assert!((events[1].cash_before - 1.0).abs() < 1e-9);
    }

    #[test]
    fn securities_join_on_common_dates() {
        let mut flat = bars_from_closes("2023-12-31", &[5.0; 7]);
        flat.retain(|b| b.date != date(2024, 1, 3));
        let source = MockDataPort::new()
            .with_bars("AAA", bars_from_closes("2024-01-01", &CROSSOVER_CLOSES))
            .with_bars("BBB", flat);

        let series = load_price_series(
            &source,
            None,
            &["AAA".to_string(), "BBB".to_string()],
            date(2024, 1, 1),
            date(2024, 12, 31),
        )
        .unwrap();

        assert_eq!(series.len(), 5);
        assert!(!series.dates().contains(&date(2024, 1, 3)));
        assert_eq!(series.securities().collect::<Vec<_>>(), vec!["AAA", "BBB"]);
    }

    #[test]
    fn flat_security_never_trades() {
        let source = MockDataPort::new()
            .with_bars("AAA", bars_from_closes("2024-01-01", &CROSSOVER_CLOSES))
            .with_bars("BBB", bars_from_closes("2024-01-01", &[5.0; 6]));
        let config = sample_config(&["BBB", "AAA"]);

        let result = run_backtest_pipeline(&source, &mut MemoryStore::new(), &config, &mut ()).unwrap();
        assert!(result.portfolio.transactions().iter().all(|t| t.security == "AAA"));
        assert!((result.portfolio.cash() - 122.0).abs() < 1e-9);
    }

    #[test]
    fn failing_source_is_no_data() {
        let source = MockDataPort::new()
            .with_bars("AAA", bars_from_closes("2024-01-01", &CROSSOVER_CLOSES))
            .with_error("BBB", "connection refused");

        let config = sample_config(&["AAA", "BBB"]);
        let err = run_backtest_pipeline(&source, &mut MemoryStore::new(), &config, &mut ()).unwrap_err();
        assert!(matches!(err, SectraderError::NoData { ref code } if code == "BBB"));
        assert_eq!(err.exit_status(), 5);
    }

    #[test]
    fn date_range_truncates_run() {
        let source = MockDataPort::new().with_bars("AAA", bars_from_closes("2024-01-01", &CROSSOVER_CLOSES));
        let mut config = sample_config(&["AAA"]);
        config.end_date = date(2024, 1, 5);

        let result = run_backtest_pipeline(&source, &mut MemoryStore::new(), &config, &mut ()).unwrap();
        assert_eq!(result.portfolio.transactions().len(), 1);
        assert_eq!(result.portfolio.shares("AAA"), 11);
        assert!((result.final_value().unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn store_serves_repeat_loads() {
        let source = MockDataPort::new().with_bars("AAA", bars_from_closes("2024-01-01", &CROSSOVER_CLOSES));
        let mut store = MemoryStore::new();
        let codes = vec!["AAA".to_string()];

        load_price_series(&source, Some(&mut store), &codes, date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        load_price_series(&source, Some(&mut store), &codes, date(2024, 1, 1), date(2024, 1, 31)).unwrap();

        assert_eq!(source.fetches.get(), 1);
        assert_eq!(store.load("AAA", None, None).unwrap().len(), 6);
    }

    #[test]
    fn pipeline_reuses_store_across_runs() {
        let source = MockDataPort::new().with_bars("AAA", bars_from_closes("2024-01-01", &CROSSOVER_CLOSES));
        let config = sample_config(&["AAA"]);
        let mut store = MemoryStore::new();

        let first = run_backtest_pipeline(&source, &mut store, &config, &mut ()).unwrap();
        let second = run_backtest_pipeline(&source, &mut store, &config, &mut ()).unwrap();

        assert_eq!(source.fetches.get(), 1);
        assert_eq!(first.portfolio.transactions(), second.portfolio.transactions());
    }
}

mod modes {
    use super::*;

    #[test]
    fn shared_and_per_security_agree_on_single_security() {
        let series = PriceSeries::single("AAA", bars_from_closes("2024-01-01", &CROSSOVER_CLOSES)).unwrap();

        let per_security = run_simulation(&series, &crossover_config(100.0), &mut ()).unwrap();
        let shared = run_simulation(
            &series,
            &SimulationConfig {
                entry_price_mode: EntryPriceMode::Shared,
                ..crossover_config(100.0)
            },
            &mut (),
        )
        .unwrap();

        assert_eq!(per_security.portfolio.transactions(), shared.portfolio.transactions());
    }

    fn two_securities() -> PriceSeries {
        PriceSeries::join(vec![
            ("AAA".to_string(), bars_from_closes("2024-01-01", &CROSSOVER_CLOSES)),
            (
                "BBB".to_string(),
                bars_from_closes("2024-01-01", &[5.0, 5.0, 6.0, 4.0, 4.5, 5.5]),
            ),
        ])
        .unwrap()
    }

    fn trades(result: &SimulationResult) -> Vec<(&str, TradeKind, u64)> {
        result
            .portfolio
            .transactions()
            .iter()
            .map(|t| (t.security.as_str(), t.kind, t.quantity))
            .collect()
    }

    #[test]
    fn shared_entry_price_gates_other_securities() {
        let series = two_securities();

        // AAA buys 11 @ 9 leaving 6; BBB crosses the same day at 4.5
        let per_security = run_simulation(&series, &crossover_config(105.0), &mut ()).unwrap();
        assert_eq!(
            trades(&per_security),
            vec![
                ("AAA", TradeKind::Buy, 11),
                ("BBB", TradeKind::Buy, 1),
                ("AAA", TradeKind::Sell, 11),
                ("BBB", TradeKind::Sell, 1),
            ]
        );
        assert!((per_security.portfolio.cash() - 128.0).abs() < 1e-9);

        // 6 left is not above AAA's 9, so BBB is never bought
        let shared = run_simulation(
            &series,
            &SimulationConfig {
                entry_price_mode: EntryPriceMode::Shared,
                ..crossover_config(105.0)
            },
            &mut (),
        )
        .unwrap();
        assert_eq!(
            trades(&shared),
            vec![("AAA", TradeKind::Buy, 11), ("AAA", TradeKind::Sell, 11)]
        );
        assert!((shared.portfolio.cash() - 127.0).abs() < 1e-9);
    }

    #[test]
    fn ma_exit_and_bollinger_entry_on_one_day() {
        let closes = [16.0, 13.0, 7.0, 17.0, 16.0, 11.0, 16.0, 6.0];
        let series = PriceSeries::single("AAA", bars_from_closes("2024-01-01", &closes)).unwrap();
        let config = SimulationConfig {
            initial_cash: 100.0,
            indicators: vec![
                IndicatorConfig::MaCrossover { short: 2, long: 3 },
                IndicatorConfig::Bollinger {
                    period: 3,
                    stddev_mult: 1.0,
                },
            ],
            ..SimulationConfig::default()
        };

        let mut events: Vec<TradeEvent> = Vec::new();
        let result = run_simulation(&series, &config, &mut events).unwrap();

        let fired: Vec<_> = events
            .iter()
            .map(|e| (e.transaction.date, e.transaction.kind, e.trigger))
            .collect();
        assert_eq!(
            fired,
            vec![
                (date(2024, 1, 3), TradeKind::Buy, SignalKind::Bollinger),
                (date(2024, 1, 6), TradeKind::Sell, SignalKind::MaCrossover),
                (date(2024, 1, 6), TradeKind::Buy, SignalKind::Bollinger),
            ]
        );
        assert_eq!(result.portfolio.shares("AAA"), 14);
        assert!((result.portfolio.cash() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn shared_mode_buys_and_sells_on_one_day() {
        // Bollinger exits ignore the entry price when it is shared
        let closes = [20.0, 4.0, 10.0, 5.0, 17.0, 16.0, 17.0];
        let series = PriceSeries::single("AAA", bars_from_closes("2024-01-01", &closes)).unwrap();
        let config = SimulationConfig {
            initial_cash: 100.0,
            indicators: vec![
                IndicatorConfig::MaCrossover { short: 3, long: 2 },
                IndicatorConfig::Bollinger {
                    period: 3,
                    stddev_mult: 0.5,
                },
            ],
            entry_price_mode: EntryPriceMode::Shared,
            ..SimulationConfig::default()
        };

        let mut events: Vec<TradeEvent> = Vec::new();
        let result = run_simulation(&series, &config, &mut events).unwrap();

        let fired: Vec<_> = events
            .iter()
            .map(|e| (e.transaction.date, e.transaction.kind, e.trigger))
            .collect();
        assert_eq!(
            fired,
            vec![
                (date(2024, 1, 7), TradeKind::Buy, SignalKind::MaCrossover),
                (date(2024, 1, 7), TradeKind::Sell, SignalKind::Bollinger),
            ]
        );
        assert!((result.portfolio.cash() - 100.0).abs() < 1e-9);
        assert!(result.portfolio.holdings().is_empty());
    }

    #[test]
    fn both_indicators_keep_cash_non_negative() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 50.0 + 10.0 * ((i as f64) * 0.4).sin() + (i % 7) as f64)
            .collect();
        let series = PriceSeries::single("AAA", bars_from_closes("2024-01-01", &closes)).unwrap();
        let config = SimulationConfig {
            initial_cash: 1_000.0,
            indicators: vec![
                IndicatorConfig::MaCrossover { short: 3, long: 8 },
                IndicatorConfig::Bollinger {
                    period: 10,
                    stddev_mult: 1.5,
                },
            ],
            rsi_period: Some(14),
            ..SimulationConfig::default()
        };

        let mut events: Vec<TradeEvent> = Vec::new();
        let result = run_simulation(&series, &config, &mut events).unwrap();

        assert_eq!(events.len(), result.portfolio.transactions().len());
        for t in result.portfolio.transactions() {
            assert!(t.cash_after >= 0.0);
        }
        // buys and sells alternate for a single security
        for pair in result.portfolio.transactions().windows(2) {
            assert_ne!(pair[0].kind, pair[1].kind);
        }
        assert_eq!(result.frame.len(), 60 - 14 + 1);
    }
}

mod reporting {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn ledger_written_after_run() {
        let series = PriceSeries::single("AAA", bars_from_closes("2024-01-01", &CROSSOVER_CLOSES)).unwrap();
        let result = run_simulation(&series, &crossover_config(100.0), &mut ()).unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        CsvReportAdapter::new().write(&result.portfolio, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2024-01-05,AAA,Buy,9.0000,11,"));
        assert!(lines[2].ends_with(",122.0000"));
    }

    #[test]
    fn signal_listing() {
        let source = MockDataPort::new().with_bars("AAA", bars_from_closes("2024-01-01", &CROSSOVER_CLOSES));
        let config = sample_config(&["AAA"]);

        let events = list_signals(&source, &config, "aaa", SignalFilter::ALL).unwrap();
        let signals: Vec<Signal> = events.iter().map(|e| e.signal).collect();
        assert_eq!(signals, vec![Signal::Sell, Signal::Buy, Signal::Sell]);
        assert!(events.iter().all(|e| e.kind == SignalKind::MaCrossover));

        let sells = list_signals(
            &source,
            &config,
            "AAA",
            SignalFilter {
                buy: false,
                sell: true,
            },
        )
        .unwrap();
        assert_eq!(sells.len(), 2);
    }

    #[test]
    fn rsi_of_rising_prices() {
        let closes: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let source = MockDataPort::new().with_bars("AAA", bars_from_closes("2024-01-01", &closes));

        let rows = rsi_table(&source, "AAA", 5, PriceField::Close, date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].0, date(2024, 1, 5));
        assert!(rows.iter().all(|(_, rsi)| (*rsi - 100.0).abs() < f64::EPSILON));
    }
}
