//! Single-consumer message loop in front of the [`Engine`].
//!
//! Producers (a market data thread, a housekeeping timer) only send
//! [`EngineMessage`]s over a bounded channel. [`run_feed`] is the one
//! place that touches engine state.

use std::io;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

use crate::domain::config_validation::MAX_CHANNEL_CAPACITY;
use crate::domain::engine::{Engine, TickOutcome};
use crate::domain::error::TraderError;
use crate::domain::position::Trade;
use crate::domain::stats::TradingStats;
use crate::domain::tick::Tick;
use crate::ports::execution_port::ExecutionGateway;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Clone)]
pub enum EngineMessage {
    Tick(Tick),
    /// Log a status snapshot.
    Status,
    Shutdown,
}

/// Counts of what happened while the loop ran.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSummary {
    pub ticks: usize,
    pub not_ready: usize,
    pub entries: usize,
    pub exits: usize,
    pub rejected: usize,
    pub final_balance: f64,
    /// Position force-closed on shutdown, if any.
    pub shutdown_trade: Option<Trade>,
    pub stats: TradingStats,
}

pub fn channel(capacity: usize) -> (SyncSender<EngineMessage>, Receiver<EngineMessage>) {
    sync_channel(capacity.clamp(1, MAX_CHANNEL_CAPACITY))
}

/// Drain `receiver` into `engine` until a shutdown message arrives or all
/// senders hang up, then shut the engine down.
pub fn run_feed<G: ExecutionGateway, R: ReportPort>(
    engine: &mut Engine<G, R>,
    receiver: Receiver<EngineMessage>,
) -> Result<FeedSummary, TraderError> {
    let mut ticks = 0;
    let mut not_ready = 0;
    let mut entries = 0;
    let mut exits = 0;
    let mut rejected = 0;

    for message in receiver.iter() {
        match message {
            EngineMessage::Tick(tick) => {
                ticks += 1;
                match engine.on_tick(&tick) {
                    TickOutcome::NotReady { .. } => not_ready += 1,
                    TickOutcome::Idle => {}
                    TickOutcome::Entered(_) => entries += 1,
                    TickOutcome::Exited(_) => exits += 1,
                    TickOutcome::Rejected { .. } => rejected += 1,
                }
            }
            EngineMessage::Status => {
                let status = engine.status();
                info!(
                    symbol = %status.symbol,
                    balance = status.balance,
                    indicator = ?status.indicator,
                    open = status.position.is_some(),
                    drawdown_pct = status.risk.drawdown_pct,
                    trades = status.total_trades,
                    "status"
                );
            }
            EngineMessage::Shutdown => {
                debug!("shutdown requested");
                break;
            }
        }
    }

    let shutdown_trade = engine.shutdown()?;
    if shutdown_trade.is_some() {
        exits += 1;
    }

    Ok(FeedSummary {
        ticks,
        not_ready,
        entries,
        exits,
        rejected,
        final_balance: engine.balance(),
        shutdown_trade,
        stats: engine.stats().clone(),
    })
}

/// Replay `ticks` on a producer thread, followed by a shutdown message.
/// The handle yields how many ticks were delivered.
pub fn spawn_replay(
    ticks: Vec<Tick>,
    sender: SyncSender<EngineMessage>,
) -> io::Result<JoinHandle<usize>> {
    thread::Builder::new()
        .name("rsitrader-replay".into())
        .spawn(move || {
            let mut sent = 0;
            for tick in ticks {
                if sender.send(EngineMessage::Tick(tick)).is_err() {
                    error!(sent, "engine hung up during replay");
                    return sent;
                }
                sent += 1;
            }
            if sender.send(EngineMessage::Shutdown).is_err() {
                debug!(sent, "engine hung up before shutdown message");
            }
            sent
        })
}
