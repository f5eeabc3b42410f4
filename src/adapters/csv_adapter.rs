//! CSV candle file market data adapter.
//!
//! Expected columns: `timestamp,open,high,low,close,volume[,is_closed]`.
//! The timestamp is either epoch milliseconds or `YYYY-MM-DD HH:MM:SS`
//! (a `T` separator is accepted too). Rows without `is_closed` are treated
//! as closed candles.

use crate::domain::error::TraderError;
use crate::domain::tick::Tick;
use crate::ports::market_data_port::MarketDataPort;
use chrono::{DateTime, NaiveDateTime};
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

fn field<'a>(record: &'a StringRecord, index: usize, name: &str) -> Result<&'a str, TraderError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| TraderError::Data {
            reason: format!("missing {} column", name),
        })
}

fn number(record: &StringRecord, index: usize, name: &str) -> Result<f64, TraderError> {
    field(record, index, name)?
        .parse()
        .map_err(|e| TraderError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, TraderError> {
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| TraderError::Data {
                reason: format!("timestamp {} out of range", millis),
            });
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| TraderError::Data {
            reason: format!("invalid timestamp '{}'", raw),
        })
}

fn parse_closed(raw: Option<&str>) -> Result<bool, TraderError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(true),
        Some(v) => match v.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(TraderError::Data {
                reason: format!("invalid is_closed value '{}'", other),
            }),
        },
    }
}

impl MarketDataPort for CsvAdapter {
    fn load_ticks(&self, symbol: &str) -> Result<Vec<Tick>, TraderError> {
        let content = fs::read_to_string(&self.path).map_err(|e| TraderError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut ticks = Vec::new();

        for result in rdr.records() {
            let record = result?;
            ticks.push(Tick {
                symbol: symbol.to_string(),
                timestamp: parse_timestamp(field(&record, 0, "timestamp")?)?,
                open: number(&record, 1, "open")?,
                high: number(&record, 2, "high")?,
                low: number(&record, 3, "low")?,
                close: number(&record, 4, "close")?,
                volume: number(&record, 5, "volume")?,
                is_closed: parse_closed(record.get(6))?,
            });
        }

        ticks.sort_by_key(|t| t.timestamp);
        Ok(ticks)
    }
}
