//! Trade event reporting port trait.

use chrono::NaiveDateTime;

use crate::domain::error::TraderError;
use crate::domain::position::Side;
use crate::domain::stats::TradingStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Entry,
    Exit,
}

/// Structured entry/exit notification. Presentation is up to the reporter.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub kind: EventKind,
    pub symbol: String,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub indicator: f64,
    pub reason: String,
    pub pnl: Option<f64>,
    pub pnl_pct: Option<f64>,
    pub timestamp: NaiveDateTime,
}

/// Port for delivering trade events.
pub trait ReportPort {
    fn publish(&mut self, event: &TradeEvent) -> Result<(), TraderError>;

    /// Called once when the engine stops. Default implementation does nothing.
    fn finish(&mut self, _stats: &TradingStats) -> Result<(), TraderError> {
        Ok(())
    }
}

impl<T: ReportPort> ReportPort for Option<T> {
    fn publish(&mut self, event: &TradeEvent) -> Result<(), TraderError> {
        match self {
            Some(inner) => inner.publish(event),
            None => Ok(()),
        }
    }

    fn finish(&mut self, stats: &TradingStats) -> Result<(), TraderError> {
        match self {
            Some(inner) => inner.finish(stats),
            None => Ok(()),
        }
    }
}

/// Both reporters see every event; the first error is returned after both ran.
impl<A: ReportPort, B: ReportPort> ReportPort for (A, B) {
    fn publish(&mut self, event: &TradeEvent) -> Result<(), TraderError> {
        let first = self.0.publish(event);
        let second = self.1.publish(event);
        first.and(second)
    }

    fn finish(&mut self, stats: &TradingStats) -> Result<(), TraderError> {
        let first = self.0.finish(stats);
        let second = self.1.finish(stats);
        first.and(second)
    }
}
