#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rsitrader::domain::config::EngineConfig;
use rsitrader::domain::engine::Engine;
use rsitrader::domain::entry::EntrySignal;
use rsitrader::domain::error::TraderError;
use rsitrader::domain::position::Side;
use rsitrader::domain::stats::TradingStats;
use rsitrader::domain::tick::Tick;
use rsitrader::ports::execution_port::{ExecutionGateway, Fill};
use rsitrader::ports::report_port::{ReportPort, TradeEvent};

pub const SYMBOL: &str = "ETHUSDT";

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayCall {
    pub opening: bool,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
    pub reduce_only: bool,
}

/// Fills every order at the requested price unless a failure is queued.
#[derive(Debug, Default)]
pub struct MockGateway {
    pub calls: Vec<GatewayCall>,
    pub fail_opens: usize,
    pub fail_closes: usize,
    pub fee: f64,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_opens(mut self, count: usize) -> Self {
        self.fail_opens = count;
        self
    }

    pub fn failing_closes(mut self, count: usize) -> Self {
        self.fail_closes = count;
        self
    }
}

impl ExecutionGateway for MockGateway {
    fn open(&mut self, side: Side, quantity: f64, price: f64) -> Result<Fill, TraderError> {
        self.calls.push(GatewayCall {
            opening: true,
            side,
            quantity,
            price,
            reduce_only: false,
        });
        if self.fail_opens > 0 {
            self.fail_opens -= 1;
            return Err(TraderError::ExecutionFailed {
                reason: "mock open rejected".to_string(),
            });
        }
        Ok(Fill {
            price,
            quantity,
            fee: self.fee,
        })
    }

    fn close(
        &mut self,
        side: Side,
        quantity: f64,
        price: f64,
        reduce_only: bool,
    ) -> Result<Fill, TraderError> {
        self.calls.push(GatewayCall {
            opening: false,
            side,
            quantity,
            price,
            reduce_only,
        });
        if self.fail_closes > 0 {
            self.fail_closes -= 1;
            return Err(TraderError::ExecutionFailed {
                reason: "mock close timed out".to_string(),
            });
        }
        Ok(Fill {
            price,
            quantity,
            fee: self.fee,
        })
    }
}

#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<TradeEvent>,
    pub finished: Option<TradingStats>,
}

impl ReportPort for RecordingReporter {
    fn publish(&mut self, event: &TradeEvent) -> Result<(), TraderError> {
        self.events.push(event.clone());
        Ok(())
    }

    fn finish(&mut self, stats: &TradingStats) -> Result<(), TraderError> {
        self.finished = Some(stats.clone());
        Ok(())
    }
}

pub type TestEngine = Engine<MockGateway, RecordingReporter>;

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn at(minute: i64) -> NaiveDateTime {
    start() + Duration::minutes(minute)
}

pub fn tick(minute: i64, close: f64) -> Tick {
    Tick {
        symbol: SYMBOL.to_string(),
        timestamp: at(minute),
        open: close,
        high: close,
        low: close,
        close,
        volume: 10.0,
        is_closed: true,
    }
}

pub fn engine_with(config: EngineConfig, gateway: MockGateway) -> TestEngine {
    Engine::new(config, gateway, RecordingReporter::default())
}

pub fn engine() -> TestEngine {
    engine_with(EngineConfig::default(), MockGateway::new())
}

pub fn long_signal(minute: i64, price: f64, indicator: f64) -> EntrySignal {
    EntrySignal {
        side: Side::Long,
        price,
        indicator,
        reason: "manual".to_string(),
        timestamp: at(minute),
    }
}

/// Closes after warm-up that drive RSI(14) to zero and bounce it back,
/// producing a long entry on the last one.
///
/// With 15 flat closes at 2000 first, the entry fires at 1975.
pub const OVERSOLD_BOUNCE: [f64; 4] = [1990.0, 1980.0, 1970.0, 1975.0];

/// Feed 14 flat closes and one ready tick at 2000 (minute 0).
pub fn warm_flat(engine: &mut TestEngine) {
    engine.warm_up(&[2000.0; 14]);
    engine.on_tick(&tick(0, 2000.0));
}
