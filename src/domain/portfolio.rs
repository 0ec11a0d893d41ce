//! Cash and share ledger.
//!
//! Every accepted trade updates cash, holdings and the transaction log
//! together; a rejected trade leaves all three untouched. Holdings only list
//! securities with a non-zero share count.

use chrono::{NaiveDate, TimeDelta};
use std::collections::{BTreeMap, HashMap};

use super::error::SectraderError;
use super::transaction::{TradeKind, Transaction};

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    initial_cash: f64,
    cash: f64,
    holdings: BTreeMap<String, u64>,
    transactions: Vec<Transaction>,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Portfolio {
            initial_cash,
            cash: initial_cash,
            holdings: BTreeMap::new(),
            transactions: Vec::new(),
        }
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn shares(&self, security: &str) -> u64 {
        self.holdings.get(security).copied().unwrap_or(0)
    }

    pub fn holdings(&self) -> &BTreeMap<String, u64> {
        &self.holdings
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn buy(
        &mut self,
        security: &str,
        quantity: u64,
        price: f64,
        date: NaiveDate,
    ) -> Result<&Transaction, SectraderError> {
        check_trade(security, quantity, price)?;

        let cost = quantity as f64 * price;
        if cost > self.cash {
            return Err(SectraderError::InsufficientFunds {
                security: security.to_string(),
                quantity,
                price,
                cash: self.cash,
            });
        }

        self.cash -= cost;
        *self.holdings.entry(security.to_string()).or_insert(0) += quantity;
        Ok(self.record(date, security, TradeKind::Buy, price, quantity, cost))
    }

    /// Buys the largest whole number of shares the current cash covers.
    pub fn buy_max(
        &mut self,
        security: &str,
        price: f64,
        date: NaiveDate,
    ) -> Result<&Transaction, SectraderError> {
        check_trade(security, 1, price)?;

        let mut quantity = (self.cash / price).floor().max(0.0) as u64;
        // guard against the division rounding up to the next whole share
        while quantity > 0 && quantity as f64 * price > self.cash {
            quantity -= 1;
        }

        if quantity == 0 {
            return Err(SectraderError::InsufficientFunds {
                security: security.to_string(),
                quantity: 1,
                price,
                cash: self.cash,
            });
        }

        self.buy(security, quantity, price, date)
    }

    pub fn sell(
        &mut self,
        security: &str,
        quantity: u64,
        price: f64,
        date: NaiveDate,
    ) -> Result<&Transaction, SectraderError> {
        check_trade(security, quantity, price)?;

        let held = self.shares(security);
        if quantity > held {
            return Err(SectraderError::OverSell {
                security: security.to_string(),
                requested: quantity,
                held,
            });
        }

        let proceeds = quantity as f64 * price;
        self.cash += proceeds;
        if quantity == held {
            self.holdings.remove(security);
        } else {
            self.holdings.insert(security.to_string(), held - quantity);
        }
        Ok(self.record(date, security, TradeKind::Sell, price, quantity, proceeds))
    }

    pub fn sell_all(
        &mut self,
        security: &str,
        price: f64,
        date: NaiveDate,
    ) -> Result<&Transaction, SectraderError> {
        let held = self.shares(security);
        if held == 0 {
            return Err(SectraderError::OverSell {
                security: security.to_string(),
                requested: 0,
                held,
            });
        }
        self.sell(security, held, price, date)
    }

    /// Cash after the most recent sale, or the starting cash when nothing
    /// has been sold yet.
    pub fn last_sell_cash(&self) -> f64 {
        self.transactions
            .iter()
            .rev()
            .find(|t| t.kind == TradeKind::Sell)
            .map(|t| t.cash_after)
            .unwrap_or(self.initial_cash)
    }

    /// Mean gap between consecutive transactions.
    pub fn average_transaction_interval(&self) -> Option<TimeDelta> {
        if self.transactions.len() < 2 {
            return None;
        }
        let gaps: Vec<i64> = self
            .transactions
            .windows(2)
            .map(|pair| (pair[1].date - pair[0].date).num_seconds())
            .collect();
        let mean = gaps.iter().sum::<i64>() / gaps.len() as i64;
        Some(TimeDelta::seconds(mean))
    }

    /// Cash plus holdings valued at the given prices.
    pub fn total_value(&self, prices: &HashMap<String, f64>) -> Result<f64, SectraderError> {
        let mut value = self.cash;
        for (security, &quantity) in &self.holdings {
            let price = prices.get(security).ok_or_else(|| SectraderError::NoData {
                code: security.clone(),
            })?;
            value += quantity as f64 * price;
        }
        Ok(value)
    }

    fn record(
        &mut self,
        date: NaiveDate,
        security: &str,
        kind: TradeKind,
        price: f64,
        quantity: u64,
        amount: f64,
    ) -> &Transaction {
        self.transactions.push(Transaction {
            date,
            security: security.to_string(),
            kind,
            price,
            quantity,
            amount,
            cash_after: self.cash,
        });
        &self.transactions[self.transactions.len() - 1]
    }
}

fn check_trade(security: &str, quantity: u64, price: f64) -> Result<(), SectraderError> {
    let reason = if quantity == 0 {
        "quantity must be positive"
    } else if !price.is_finite() || price <= 0.0 {
        "price must be a positive number"
    } else {
        return Ok(());
    };
    Err(SectraderError::InvalidTrade {
        security: security.to_string(),
        reason: reason.to_string(),
    })
}
