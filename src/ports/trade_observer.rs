//! Hook for reacting to trades as the simulation executes them.

use crate::domain::signal::SignalKind;
use crate::domain::transaction::Transaction;

#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub transaction: Transaction,
    pub cash_before: f64,
    pub trigger: SignalKind,
}

pub trait TradeObserver {
    fn on_trade(&mut self, event: &TradeEvent);
}

/// Discards every event.
impl TradeObserver for () {
    fn on_trade(&mut self, _event: &TradeEvent) {}
}

/// Collects events in execution order.
impl TradeObserver for Vec<TradeEvent> {
    fn on_trade(&mut self, event: &TradeEvent) {
        self.push(event.clone());
    }
}
