//! Per-tick orchestration of indicator, signals, risk and execution.
//!
//! [`Engine`] owns the whole mutable trading state for one symbol. Each
//! tick is processed to completion before the next: the indicator is
//! refreshed, extremes widened, and either the entry engine (flat) or the
//! exit state machine (open) consulted. A resulting signal goes through
//! the risk manager and the execution gateway, and the position and
//! balance change only after the gateway reports a fill.
//!
//! [`Engine::on_tick`] never fails: errors are logged and surface as
//! [`TickOutcome::Rejected`], and the next tick is processed normally.

use chrono::NaiveDateTime;
use tracing::{debug, error, info, warn};

use crate::domain::config::EngineConfig;
use crate::domain::entry::{EntrySignal, EntrySignalEngine};
use crate::domain::error::TraderError;
use crate::domain::exit::{ExitFlags, ExitSignal, ExitStateMachine};
use crate::domain::extremes::Extremes;
use crate::domain::indicator::Rsi;
use crate::domain::position::{Position, Trade};
use crate::domain::risk::{RiskManager, RiskStatus};
use crate::domain::stats::TradingStats;
use crate::domain::tick::{PriceSeries, Tick};
use crate::ports::execution_port::ExecutionGateway;
use crate::ports::report_port::{EventKind, ReportPort, TradeEvent};

/// Everything that changes while the engine runs.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub series: PriceSeries,
    pub extremes: Extremes,
    pub position: Option<Position>,
    pub balance: f64,
    pub stats: TradingStats,
    pub last_exit: Option<NaiveDateTime>,
    pub last_indicator: Option<f64>,
    pub last_tick_at: Option<NaiveDateTime>,
}

impl EngineState {
    fn new(initial_balance: f64) -> Self {
        EngineState {
            series: PriceSeries::new(),
            extremes: Extremes::new(),
            position: None,
            balance: initial_balance,
            stats: TradingStats::new(initial_balance),
            last_exit: None,
            last_indicator: None,
            last_tick_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Not enough closes for the indicator yet.
    NotReady { have: usize, need: usize },
    Idle,
    Entered(Position),
    Exited(Trade),
    Rejected { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineStatus {
    pub symbol: String,
    pub balance: f64,
    pub indicator: Option<f64>,
    pub position: Option<Position>,
    pub risk: RiskStatus,
    pub total_trades: usize,
}

pub struct Engine<G: ExecutionGateway, R: ReportPort> {
    config: EngineConfig,
    rsi: Rsi,
    state: EngineState,
    entry: EntrySignalEngine,
    exit: ExitStateMachine,
    risk: RiskManager,
    gateway: G,
    reporter: R,
}

impl<G: ExecutionGateway, R: ReportPort> Engine<G, R> {
    pub fn new(config: EngineConfig, gateway: G, reporter: R) -> Self {
        let rsi = Rsi::new(config.indicator_period);
        let entry = EntrySignalEngine::new(config.entry.clone(), config.thresholds);
        let exit = ExitStateMachine::new(config.exit.clone(), config.thresholds);
        let risk = RiskManager::new(config.risk.clone(), config.initial_balance);
        let state = EngineState::new(config.initial_balance);

        info!(
            symbol = %config.symbol,
            balance = config.initial_balance,
            indicator = %rsi,
            leverage = config.risk.leverage,
            margin = %config.risk.margin_type,
            allow_short = config.entry.allow_short,
            "engine initialised"
        );

        Engine {
            config,
            rsi,
            state,
            entry,
            exit,
            risk,
            gateway,
            reporter,
        }
    }

    /// Seed the price series with historical closed candles.
    pub fn warm_up(&mut self, closes: &[f64]) {
        for &close in closes {
            self.state.series.push(close, true);
        }
        debug!(samples = closes.len(), total = self.state.series.len(), "series warmed up");
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn position(&self) -> Option<&Position> {
        self.state.position.as_ref()
    }

    pub fn balance(&self) -> f64 {
        self.state.balance
    }

    pub fn stats(&self) -> &TradingStats {
        &self.state.stats
    }

    pub fn exit_flags(&self) -> &ExitFlags {
        self.exit.flags()
    }

    pub fn entry_engine(&self) -> &EntrySignalEngine {
        &self.entry
    }

    pub fn risk(&self) -> &RiskManager {
        &self.risk
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            symbol: self.config.symbol.clone(),
            balance: self.state.balance,
            indicator: self.state.last_indicator,
            position: self.state.position.clone(),
            risk: self.risk.status(self.state.balance),
            total_trades: self.state.stats.total_trades,
        }
    }

    /// Process one tick to completion.
    pub fn on_tick(&mut self, tick: &Tick) -> TickOutcome {
        match self.process(tick) {
            Ok(outcome) => outcome,
            Err(TraderError::NotReady { have, need }) => TickOutcome::NotReady { have, need },
            Err(err @ TraderError::TradeRejected { .. }) => {
                warn!(symbol = %tick.symbol, at = %tick.timestamp, price = tick.close, "{}", err);
                TickOutcome::Rejected {
                    reason: err.to_string(),
                }
            }
            Err(err) => {
                error!(
                    symbol = %tick.symbol,
                    at = %tick.timestamp,
                    price = tick.close,
                    open_position = self.state.position.is_some(),
                    balance = self.state.balance,
                    "tick failed: {}",
                    err
                );
                TickOutcome::Rejected {
                    reason: err.to_string(),
                }
            }
        }
    }

    fn process(&mut self, tick: &Tick) -> Result<TickOutcome, TraderError> {
        if !tick.symbol.eq_ignore_ascii_case(&self.config.symbol) {
            return Err(TraderError::InvariantViolation {
                reason: format!(
                    "tick for {} delivered to {} engine",
                    tick.symbol, self.config.symbol
                ),
            });
        }
        if !tick.close.is_finite() || tick.close <= 0.0 {
            return Err(TraderError::Data {
                reason: format!("invalid close price {}", tick.close),
            });
        }

        let price = tick.close;
        let now = tick.timestamp;
        self.state.last_tick_at = Some(now);
        self.state.series.push(price, tick.is_closed);

        let indicator = self
            .rsi
            .value(self.state.series.closes())
            .ok_or(TraderError::NotReady {
                have: self.state.series.len(),
                need: self.rsi.warmup(),
            })?;
        self.state.last_indicator = Some(indicator);
        self.state.extremes.update(price, indicator);

        if let Some(position) = self.state.position.as_mut() {
            position.update(price, indicator);
            let trend = self.state.series.pct_change(self.config.exit.trend_lookback);
            let signal = self.exit.evaluate(position, price, indicator, trend, now);
            return match signal {
                Some(signal) => self.close_position(signal).map(TickOutcome::Exited),
                None => Ok(TickOutcome::Idle),
            };
        }

        let signal = self.entry.evaluate(
            price,
            indicator,
            now,
            self.state.last_exit,
            &self.state.extremes,
        );
        match signal {
            Some(signal) => self.submit_entry(signal).map(TickOutcome::Entered),
            None => Ok(TickOutcome::Idle),
        }
    }

    /// Size, validate and execute an entry. State changes only after the
    /// gateway fills the order.
    pub fn submit_entry(&mut self, signal: EntrySignal) -> Result<Position, TraderError> {
        if let Some(open) = &self.state.position {
            return Err(TraderError::InvariantViolation {
                reason: format!(
                    "entry attempted while a {} position on {} is open",
                    open.side, open.symbol
                ),
            });
        }

        let balance = self.state.balance;
        let size = self
            .risk
            .size_position(balance, signal.price, None, self.config.risk.leverage);
        self.risk
            .validate_trade(balance, size.quantity, signal.price)?;

        let fill = self.gateway.open(signal.side, size.quantity, signal.price)?;

        let position = Position::open(
            &self.config.symbol,
            signal.side,
            fill.quantity,
            fill.price,
            signal.timestamp,
            signal.indicator,
            fill.fee,
        );
        self.entry.acknowledge(signal.side, &mut self.state.extremes);
        self.exit.reset();
        self.state.position = Some(position.clone());

        info!(
            side = %position.side,
            price = position.entry_price,
            quantity = position.quantity,
            indicator = signal.indicator,
            sizing = %size.method,
            reason = %signal.reason,
            "position opened"
        );
        self.publish(TradeEvent {
            kind: EventKind::Entry,
            symbol: position.symbol.clone(),
            side: position.side,
            price: position.entry_price,
            quantity: position.quantity,
            indicator: signal.indicator,
            reason: signal.reason,
            pnl: None,
            pnl_pct: None,
            timestamp: signal.timestamp,
        });

        Ok(position)
    }

    fn close_position(&mut self, signal: ExitSignal) -> Result<Trade, TraderError> {
        let position = self
            .state
            .position
            .as_ref()
            .ok_or_else(|| TraderError::InvariantViolation {
                reason: "exit requested with no open position".to_string(),
            })?;

        let fill = self
            .gateway
            .close(position.side, position.quantity, signal.price, true)?;
        let trade = Trade::from_close(
            position,
            fill.price,
            fill.fee,
            signal.timestamp,
            &signal.reason,
        );

        self.state.balance += trade.pnl;
        self.risk.update_drawdown(self.state.balance);
        self.state.stats.record(&trade, self.state.balance);
        self.exit.reset();
        self.state.extremes.reset();
        self.state.last_exit = Some(signal.timestamp);
        self.state.position = None;

        info!(
            side = %trade.side,
            entry = trade.entry_price,
            exit = trade.exit_price,
            pnl = trade.pnl,
            pnl_pct = trade.pnl_pct,
            result = %trade.result,
            minutes = trade.minutes_held(),
            balance = self.state.balance,
            reason = %trade.reason,
            "position closed"
        );
        let status = self.risk.status(self.state.balance);
        if status.critical {
            error!(drawdown_pct = status.drawdown_pct, "maximum drawdown reached, entries blocked");
        } else if status.warning {
            warn!(drawdown_pct = status.drawdown_pct, "approaching maximum drawdown");
        }

        self.publish(TradeEvent {
            kind: EventKind::Exit,
            symbol: trade.symbol.clone(),
            side: trade.side,
            price: trade.exit_price,
            quantity: trade.quantity,
            indicator: signal.indicator,
            reason: trade.reason.clone(),
            pnl: Some(trade.pnl),
            pnl_pct: Some(trade.pnl_pct),
            timestamp: trade.exit_time,
        });

        Ok(trade)
    }

    /// Stop trading: force-close any open position through the normal exit
    /// path and flush the reporter.
    pub fn shutdown(&mut self) -> Result<Option<Trade>, TraderError> {
        let closed = match &self.state.position {
            Some(position) => {
                let now = self.state.last_tick_at.unwrap_or(position.entry_time);
                let signal =
                    self.exit
                        .force_exit(position.current_price, position.current_indicator, now);
                Some(self.close_position(signal)?)
            }
            None => None,
        };

        self.reporter.finish(&self.state.stats)?;
        info!(
            trades = self.state.stats.total_trades,
            balance = self.state.balance,
            "engine stopped"
        );
        Ok(closed)
    }

    fn publish(&mut self, event: TradeEvent) {
        if let Err(err) = self.reporter.publish(&event) {
            warn!(kind = ?event.kind, "failed to publish trade event: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::Side;
    use crate::ports::execution_port::Fill;
    use chrono::{Duration, NaiveDate};

    #[derive(Default)]
    struct InstantFill {
        fail: bool,
    }

    impl ExecutionGateway for InstantFill {
        fn open(&mut self, _: Side, quantity: f64, price: f64) -> Result<Fill, TraderError> {
            if self.fail {
                return Err(TraderError::ExecutionFailed {
                    reason: "down".into(),
                });
            }
            Ok(Fill {
                price,
                quantity,
                fee: 0.0,
            })
        }

        fn close(&mut self, _: Side, quantity: f64, price: f64, _: bool) -> Result<Fill, TraderError> {
            self.open(Side::Long, quantity, price)
        }
    }

    struct Silent;

    impl ReportPort for Silent {
        fn publish(&mut self, _: &TradeEvent) -> Result<(), TraderError> {
            Ok(())
        }
    }

    fn tick(symbol: &str, minute: i64, close: f64) -> Tick {
        Tick {
            symbol: symbol.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                + Duration::minutes(minute),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
            is_closed: true,
        }
    }

    fn engine() -> Engine<InstantFill, Silent> {
        Engine::new(EngineConfig::default(), InstantFill::default(), Silent)
    }

    #[test]
    fn not_ready_until_warm() {
        let mut e = engine();
        for i in 0..14 {
            assert_eq!(
                e.on_tick(&tick("ETHUSDT", i, 100.0)),
                TickOutcome::NotReady {
                    have: i as usize + 1,
                    need: 15
                }
            );
        }
        assert_eq!(e.on_tick(&tick("ETHUSDT", 14, 100.0)), TickOutcome::Idle);
        assert_eq!(e.state().last_indicator, Some(50.0));
    }

    #[test]
    fn foreign_symbol_is_rejected_without_mutation() {
        let mut e = engine();
        let outcome = e.on_tick(&tick("BTCUSDT", 0, 100.0));
        assert!(matches!(outcome, TickOutcome::Rejected { .. }));
        assert!(e.state().series.is_empty());
    }

    #[test]
    fn invalid_price_is_rejected() {
        let mut e = engine();
        assert!(matches!(
            e.on_tick(&tick("ETHUSDT", 0, f64::NAN)),
            TickOutcome::Rejected { .. }
        ));
        assert!(e.state().series.is_empty());
    }

    #[test]
    fn second_entry_is_invariant_violation() {
        let mut e = engine();
        let signal = EntrySignal {
            side: Side::Long,
            price: 2000.0,
            indicator: 28.0,
            reason: "manual".to_string(),
            timestamp: tick("ETHUSDT", 0, 2000.0).timestamp,
        };
        let position = e.submit_entry(signal.clone()).unwrap();
        assert_eq!(position.quantity, 0.5);
        assert!(matches!(
            e.submit_entry(signal),
            Err(TraderError::InvariantViolation { .. })
        ));
        assert_eq!(e.position(), Some(&position));
    }

    #[test]
    fn failed_entry_commits_nothing() {
        let mut e = engine();
        e.gateway_mut().fail = true;
        let signal = EntrySignal {
            side: Side::Long,
            price: 2000.0,
            indicator: 28.0,
            reason: "manual".to_string(),
            timestamp: tick("ETHUSDT", 0, 2000.0).timestamp,
        };
        assert!(matches!(
            e.submit_entry(signal),
            Err(TraderError::ExecutionFailed { .. })
        ));
        assert!(e.position().is_none());
        assert_eq!(e.balance(), 1000.0);
    }

    #[test]
    fn shutdown_when_flat_closes_nothing() {
        let mut e = engine();
        assert_eq!(e.shutdown().unwrap(), None);
    }

    #[test]
    fn warm_up_seeds_series() {
        let mut e = engine();
        e.warm_up(&[100.0; 14]);
        assert_eq!(e.on_tick(&tick("ETHUSDT", 0, 100.0)), TickOutcome::Idle);
    }
}
