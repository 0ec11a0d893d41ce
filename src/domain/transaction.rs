//! Executed trades recorded in the portfolio ledger.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeKind {
    Buy,
    Sell,
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeKind::Buy => f.write_str("Buy"),
            TradeKind::Sell => f.write_str("Sell"),
        }
    }
}

/// One executed trade. `amount` is the notional (`price * quantity`) and
/// `cash_after` the portfolio cash once the trade settled.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub security: String,
    pub kind: TradeKind,
    pub price: f64,
    pub quantity: u64,
    pub amount: f64,
    pub cash_after: f64,
}

impl Transaction {
    /// Cash held immediately before this trade.
    pub fn cash_before(&self) -> f64 {
        match self.kind {
            TradeKind::Buy => self.cash_after + self.amount,
            TradeKind::Sell => self.cash_after - self.amount,
        }
    }
}
