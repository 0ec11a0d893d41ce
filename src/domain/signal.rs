//! Discrete trading signals derived from indicator values.

use chrono::NaiveDate;
use std::fmt;

use crate::domain::annotated::AnnotatedFrame;
use crate::domain::error::SectraderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    NotApplicable,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => f.write_str("Buy"),
            Signal::Sell => f.write_str("Sell"),
            Signal::NotApplicable => f.write_str("N/A"),
        }
    }
}

/// Indicator family a signal came from. Families never merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalKind {
    MaCrossover,
    Bollinger,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::MaCrossover => f.write_str("ma_crossover"),
            SignalKind::Bollinger => f.write_str("bollinger"),
        }
    }
}

/// Buy when the short average is above the long one on a crossover day,
/// Sell on any other crossover, N/A otherwise.
pub fn crossover_signal(crossover: bool, diff: f64) -> Signal {
    if !crossover {
        Signal::NotApplicable
    } else if diff > 0.0 {
        Signal::Buy
    } else {
        Signal::Sell
    }
}

/// Strict band breach: a value sitting exactly on a band is N/A.
pub fn bollinger_signal(value: f64, lower: f64, upper: f64) -> Signal {
    if value < lower {
        Signal::Buy
    } else if value > upper {
        Signal::Sell
    } else {
        Signal::NotApplicable
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalEvent {
    pub date: NaiveDate,
    pub security: String,
    pub kind: SignalKind,
    pub signal: Signal,
    pub price: f64,
}

/// Which directions [`signal_events`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalFilter {
    pub buy: bool,
    pub sell: bool,
}

impl SignalFilter {
    pub const ALL: SignalFilter = SignalFilter {
        buy: true,
        sell: true,
    };

    fn accepts(&self, signal: Signal) -> bool {
        match signal {
            Signal::Buy => self.buy,
            Signal::Sell => self.sell,
            Signal::NotApplicable => false,
        }
    }
}

/// Buy/sell events of every configured indicator for one security, in
/// date order.
pub fn signal_events(
    frame: &AnnotatedFrame,
    security: &str,
    filter: SignalFilter,
) -> Result<Vec<SignalEvent>, SectraderError> {
    if !frame.securities().iter().any(|s| s == security) {
        return Err(SectraderError::shape(format!(
            "security {} is not in the frame",
            security
        )));
    }

    let mut events = Vec::new();
    for row in frame.rows() {
        let Some(state) = row.entries.get(security) else {
            continue;
        };
        let candidates = [
            state.ma.as_ref().map(|m| (SignalKind::MaCrossover, m.signal)),
            state.bollinger.as_ref().map(|b| (SignalKind::Bollinger, b.signal)),
        ];
        for (kind, signal) in candidates.into_iter().flatten() {
            if filter.accepts(signal) {
                events.push(SignalEvent {
                    date: row.date,
                    security: security.to_string(),
                    kind,
                    signal,
                    price: state.price,
                });
            }
        }
    }

    events.sort_by(|a, b| a.date.cmp(&b.date).then(a.kind.cmp(&b.kind)));
    events.dedup();
    Ok(events)
}
