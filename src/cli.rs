//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_journal_adapter::CsvJournalAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::log_reporter::LogReporter;
use crate::adapters::paper_gateway::{PaperConfig, PaperGateway};
use crate::domain::config::EngineConfig;
use crate::domain::config_validation::validate_engine_config;
use crate::domain::engine::Engine;
use crate::domain::error::TraderError;
use crate::domain::feed::{self, FeedSummary};
use crate::ports::market_data_port::MarketDataPort;

#[derive(Parser, Debug)]
#[command(name = "rsitrader", about = "RSI momentum trading engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a candle CSV through the engine with paper execution
    Replay {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        /// Write entry/exit events to this CSV file
        #[arg(short, long)]
        journal: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Install the stderr `tracing` subscriber. `RUST_LOG` overrides the
/// default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing();
    let result = match cli.command {
        Command::Replay {
            config,
            data,
            journal,
            symbol,
        } => run_replay(&config, &data, journal.as_deref(), symbol.as_deref()).map(|summary| {
            print_summary(&summary);
        }),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path, symbol_override: Option<&str>) -> Result<EngineConfig, TraderError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    let mut config = EngineConfig::from_port(&adapter)?;
    if let Some(symbol) = symbol_override {
        config.symbol = symbol.trim().to_uppercase();
    }
    validate_engine_config(&config)?;
    Ok(config)
}

pub fn run_replay(
    config_path: &Path,
    data_path: &Path,
    journal_path: Option<&Path>,
    symbol_override: Option<&str>,
) -> Result<FeedSummary, TraderError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = load_config(config_path, symbol_override)?;
    let paper = PaperConfig::from_port(&FileConfigAdapter::from_file(config_path)?)?;

    eprintln!("Loading candles from {}", data_path.display());
    let ticks = CsvAdapter::new(data_path.to_path_buf()).load_ticks(&config.symbol)?;
    if ticks.is_empty() {
        return Err(TraderError::Data {
            reason: format!("no candles in {}", data_path.display()),
        });
    }

    let journal = journal_path.map(CsvJournalAdapter::create).transpose()?;
    let reporter = (LogReporter::new(), journal);
    let capacity = config.channel_capacity;
    let mut engine = Engine::new(config, PaperGateway::new(paper), reporter);

    let (sender, receiver) = feed::channel(capacity);
    let producer = feed::spawn_replay(ticks, sender)?;
    let summary = feed::run_feed(&mut engine, receiver)?;
    let delivered = producer.join().map_err(|_| TraderError::InvariantViolation {
        reason: "replay thread panicked".to_string(),
    })?;
    tracing::debug!(delivered, "replay finished");

    Ok(summary)
}

fn run_validate(config_path: &Path) -> Result<(), TraderError> {
    eprintln!("Validating config: {}", config_path.display());
    let config = load_config(config_path, None)?;
    PaperConfig::from_port(&FileConfigAdapter::from_file(config_path)?)?;

    eprintln!("  symbol:      {}", config.symbol);
    eprintln!("  balance:     {:.2}", config.initial_balance);
    eprintln!(
        "  RSI({}):     oversold {} / overbought {}",
        config.indicator_period, config.thresholds.oversold, config.thresholds.overbought
    );
    eprintln!(
        "  tiers (h):   {:?}, max hold {}h",
        config.exit.tier_hours, config.exit.max_hold_hours
    );
    eprintln!(
        "  risk:        {}% per trade, {}% max drawdown, {}x {}",
        config.risk.max_risk_per_trade_pct,
        config.risk.max_drawdown_pct,
        config.risk.leverage,
        config.risk.margin_type
    );
    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn print_summary(summary: &FeedSummary) {
    let stats = &summary.stats;
    println!("Ticks processed:  {}", summary.ticks);
    println!("Warm-up ticks:    {}", summary.not_ready);
    println!("Rejected ticks:   {}", summary.rejected);
    println!("Trades:           {}", stats.total_trades);
    println!(
        "Wins / Losses:    {} / {} ({:.1}%)",
        stats.winning_trades, stats.losing_trades, stats.win_rate
    );
    println!("Total P&L:        {:.2}", stats.total_pnl);
    println!("Largest win:      {:.2}", stats.largest_win);
    println!("Largest loss:     {:.2}", stats.largest_loss);
    println!("Avg hold (min):   {:.1}", stats.avg_minutes_held);
    println!(
        "Final balance:    {:.2} ({:+.2}%)",
        summary.final_balance, stats.total_return_pct
    );
    if let Some(trade) = &summary.shutdown_trade {
        println!(
            "Closed on shutdown: {} {:.6} @ {:.2} ({:+.2})",
            trade.side, trade.quantity, trade.exit_price, trade.pnl
        );
    }
}
