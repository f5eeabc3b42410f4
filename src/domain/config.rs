//! Typed engine configuration assembled from a [`ConfigPort`].

use crate::domain::entry::EntryConfig;
use crate::domain::error::TraderError;
use crate::domain::exit::ExitConfig;
use crate::domain::indicator::Thresholds;
use crate::domain::risk::{MarginType, RiskConfig};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_SYMBOL: &str = "ETHUSDT";
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub symbol: String,
    pub initial_balance: f64,
    pub channel_capacity: usize,
    pub indicator_period: usize,
    pub thresholds: Thresholds,
    pub entry: EntryConfig,
    pub exit: ExitConfig,
    pub risk: RiskConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            symbol: DEFAULT_SYMBOL.to_string(),
            initial_balance: 1000.0,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            indicator_period: 14,
            thresholds: Thresholds::default(),
            entry: EntryConfig::default(),
            exit: ExitConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Read every recognised key, falling back to defaults for absent ones.
    /// Values that are present but malformed are errors.
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, TraderError> {
        let d = EngineConfig::default();

        let symbol = config
            .get_string("engine", "symbol")
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or(d.symbol);

        let thresholds = Thresholds {
            oversold: config.get_double("indicator", "oversold", d.thresholds.oversold)?,
            overbought: config.get_double("indicator", "overbought", d.thresholds.overbought)?,
        };

        let entry = EntryConfig {
            min_entry_counter: read_count(
                config,
                "entry",
                "min_entry_counter",
                d.entry.min_entry_counter as i64,
            )? as u32,
            bounce_threshold: config.get_double(
                "entry",
                "bounce_threshold",
                d.entry.bounce_threshold,
            )?,
            min_time_after_exit_minutes: config.get_int(
                "entry",
                "min_time_after_exit_minutes",
                d.entry.min_time_after_exit_minutes,
            )?,
            allow_short: config.get_bool("entry", "allow_short", d.entry.allow_short)?,
            ..d.entry
        };

        let tier_hours = match config.get_string("exit", "tier_hours") {
            Some(raw) => parse_tier_hours(&raw)?,
            None => d.exit.tier_hours,
        };
        let exit = ExitConfig {
            min_profit_pct: config.get_double("exit", "min_profit_pct", d.exit.min_profit_pct)?,
            big_profit_pct: config.get_double("exit", "big_profit_pct", d.exit.big_profit_pct)?,
            tier_hours,
            max_hold_hours: config.get_double("exit", "max_hold_hours", d.exit.max_hold_hours)?,
            trend_lookback: read_count(
                config,
                "exit",
                "trend_lookback",
                d.exit.trend_lookback as i64,
            )? as usize,
        };

        let margin_type = match config.get_string("risk", "margin_type") {
            Some(raw) => raw
                .parse::<MarginType>()
                .map_err(|e| TraderError::config_invalid("risk", "margin_type", e))?,
            None => d.risk.margin_type,
        };
        let risk = RiskConfig {
            max_risk_per_trade_pct: config.get_double(
                "risk",
                "max_risk_per_trade_pct",
                d.risk.max_risk_per_trade_pct,
            )?,
            max_drawdown_pct: config.get_double(
                "risk",
                "max_drawdown_pct",
                d.risk.max_drawdown_pct,
            )?,
            dynamic_sizing: config.get_bool("risk", "dynamic_sizing", d.risk.dynamic_sizing)?,
            leverage: read_count(config, "risk", "leverage", d.risk.leverage as i64)? as u32,
            margin_type,
        };

        Ok(EngineConfig {
            symbol,
            initial_balance: config.get_double("engine", "initial_balance", d.initial_balance)?,
            channel_capacity: read_count(
                config,
                "engine",
                "channel_capacity",
                d.channel_capacity as i64,
            )? as usize,
            indicator_period: read_count(
                config,
                "indicator",
                "period",
                d.indicator_period as i64,
            )? as usize,
            thresholds,
            entry,
            exit,
            risk,
        })
    }
}

/// Non-negative integer setting that fits in a `u32`.
fn read_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, TraderError> {
    let value = config.get_int(section, key, default)?;
    if !(0..=i64::from(u32::MAX)).contains(&value) {
        return Err(TraderError::config_invalid(
            section,
            key,
            format!("{} is out of range", value),
        ));
    }
    Ok(value)
}

/// Parse `"0.5,1.5,2.5"` into the three tier hour thresholds.
pub fn parse_tier_hours(raw: &str) -> Result<[f64; 3], TraderError> {
    let values = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TraderError::config_invalid("exit", "tier_hours", e.to_string()))?;

    <[f64; 3]>::try_from(values).map_err(|v| {
        TraderError::config_invalid(
            "exit",
            "tier_hours",
            format!("expected 3 comma-separated values, got {}", v.len()),
        )
    })
}
