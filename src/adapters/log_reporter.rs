//! Reporter that writes trade events to the `tracing` log.

use tracing::info;

use crate::domain::error::TraderError;
use crate::domain::stats::TradingStats;
use crate::ports::report_port::{EventKind, ReportPort, TradeEvent};

#[derive(Debug, Default)]
pub struct LogReporter {
    pub events: usize,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportPort for LogReporter {
    fn publish(&mut self, event: &TradeEvent) -> Result<(), TraderError> {
        self.events += 1;
        match event.kind {
            EventKind::Entry => info!(
                target: "rsitrader::report",
                symbol = %event.symbol,
                side = %event.side,
                price = event.price,
                quantity = event.quantity,
                rsi = event.indicator,
                at = %event.timestamp,
                "ENTRY {}",
                event.reason
            ),
            EventKind::Exit => info!(
                target: "rsitrader::report",
                symbol = %event.symbol,
                side = %event.side,
                price = event.price,
                quantity = event.quantity,
                rsi = event.indicator,
                pnl = event.pnl.unwrap_or_default(),
                pnl_pct = event.pnl_pct.unwrap_or_default(),
                at = %event.timestamp,
                "EXIT {}",
                event.reason
            ),
        }
        Ok(())
    }

    fn finish(&mut self, stats: &TradingStats) -> Result<(), TraderError> {
        info!(
            target: "rsitrader::report",
            trades = stats.total_trades,
            wins = stats.winning_trades,
            losses = stats.losing_trades,
            win_rate = stats.win_rate,
            total_pnl = stats.total_pnl,
            return_pct = stats.total_return_pct,
            "session summary"
        );
        Ok(())
    }
}
