//! sectrader: indicator-driven backtesting of equity securities.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].
//!
//! A run flows price history through indicator annotation
//! ([`domain::annotated`]) into the simulation loop ([`domain::backtest`]),
//! which trades a cash-and-shares [`domain::portfolio::Portfolio`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
