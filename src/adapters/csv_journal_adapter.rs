//! CSV trade journal: one row per entry or exit event.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::domain::error::TraderError;
use crate::domain::stats::TradingStats;
use crate::ports::report_port::{EventKind, ReportPort, TradeEvent};

pub const JOURNAL_HEADER: [&str; 10] = [
    "timestamp",
    "kind",
    "symbol",
    "side",
    "price",
    "quantity",
    "rsi",
    "pnl",
    "pnl_pct",
    "reason",
];

pub struct CsvJournalAdapter {
    writer: Writer<File>,
}

impl CsvJournalAdapter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, TraderError> {
        let mut writer = Writer::from_path(path)?;
        writer.write_record(JOURNAL_HEADER)?;
        Ok(Self { writer })
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_default()
}

impl ReportPort for CsvJournalAdapter {
    fn publish(&mut self, event: &TradeEvent) -> Result<(), TraderError> {
        let kind = match event.kind {
            EventKind::Entry => "ENTRY",
            EventKind::Exit => "EXIT",
        };
        self.writer.write_record([
            event.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            kind.to_string(),
            event.symbol.clone(),
            event.side.to_string(),
            format!("{:.4}", event.price),
            format!("{:.6}", event.quantity),
            format!("{:.2}", event.indicator),
            optional(event.pnl),
            optional(event.pnl_pct),
            event.reason.clone(),
        ])?;
        Ok(())
    }

    fn finish(&mut self, _stats: &TradingStats) -> Result<(), TraderError> {
        self.writer.flush()?;
        Ok(())
    }
}
