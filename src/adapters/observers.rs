//! Trade observers: human narration and structured log events.

use std::io::Write;

use tracing::info;

use crate::domain::transaction::TradeKind;
use crate::ports::trade_observer::{TradeEvent, TradeObserver};

/// Writes a short paragraph per trade to `out`.
pub struct NarratingObserver<W: Write> {
    out: W,
}

impl<W: Write> NarratingObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TradeObserver for NarratingObserver<W> {
    fn on_trade(&mut self, event: &TradeEvent) {
        let t = &event.transaction;
        let verb = match t.kind {
            TradeKind::Buy => "Bought",
            TradeKind::Sell => "Sold",
        };
        let _ = writeln!(
            self.out,
            "{} {} shares of {} at {:.4} ({})\n\tStart cash: {:.4}\n\tRemaining cash: {:.4}\n\tDate: {}",
            verb, t.quantity, t.security, t.price, event.trigger, event.cash_before, t.cash_after, t.date
        );
    }
}

/// Emits one `info` event per trade.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl TradeObserver for TracingObserver {
    fn on_trade(&mut self, event: &TradeEvent) {
        let t = &event.transaction;
        info!(
            date = %t.date,
            security = t.security.as_str(),
            kind = %t.kind,
            trigger = %event.trigger,
            quantity = t.quantity,
            price = t.price,
            cash_before = event.cash_before,
            cash_after = t.cash_after,
            "trade executed"
        );
    }
}
