//! Range checks run on an [`EngineConfig`] before the engine starts.

use crate::domain::config::EngineConfig;
use crate::domain::error::TraderError;

/// One week.
pub const MAX_COOLDOWN_MINUTES: i64 = 7 * 24 * 60;

/// `sync_channel` allocates every slot up front.
pub const MAX_CHANNEL_CAPACITY: usize = 1_000_000;

pub fn validate_engine_config(config: &EngineConfig) -> Result<(), TraderError> {
    validate_engine(config)?;
    validate_indicator(config)?;
    validate_entry(config)?;
    validate_exit(config)?;
    validate_risk(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> Result<(), TraderError> {
    Err(TraderError::config_invalid(section, key, reason))
}

fn validate_engine(config: &EngineConfig) -> Result<(), TraderError> {
    if config.symbol.trim().is_empty() {
        return invalid("engine", "symbol", "symbol must not be empty");
    }
    if !(config.initial_balance > 0.0) {
        return invalid("engine", "initial_balance", "initial_balance must be positive");
    }
    if config.channel_capacity == 0 || config.channel_capacity > MAX_CHANNEL_CAPACITY {
        return invalid(
            "engine",
            "channel_capacity",
            "channel_capacity must be between 1 and 1000000",
        );
    }
    Ok(())
}

fn validate_indicator(config: &EngineConfig) -> Result<(), TraderError> {
    if config.indicator_period == 0 {
        return invalid("indicator", "period", "period must be at least 1");
    }
    let t = &config.thresholds;
    if !(t.oversold > 0.0 && t.oversold < 100.0) {
        return invalid("indicator", "oversold", "oversold must be between 0 and 100");
    }
    if !(t.overbought > t.oversold && t.overbought < 100.0) {
        return invalid(
            "indicator",
            "overbought",
            "overbought must be above oversold and below 100",
        );
    }
    Ok(())
}

fn validate_entry(config: &EngineConfig) -> Result<(), TraderError> {
    if config.entry.min_entry_counter == 0 {
        return invalid("entry", "min_entry_counter", "min_entry_counter must be at least 1");
    }
    if config.entry.bounce_threshold < 0.0 {
        return invalid("entry", "bounce_threshold", "bounce_threshold must be non-negative");
    }
    if !(0..=MAX_COOLDOWN_MINUTES).contains(&config.entry.min_time_after_exit_minutes) {
        return invalid(
            "entry",
            "min_time_after_exit_minutes",
            "min_time_after_exit_minutes must be between 0 and 10080 (one week)",
        );
    }
    Ok(())
}

fn validate_exit(config: &EngineConfig) -> Result<(), TraderError> {
    let exit = &config.exit;
    if !(exit.min_profit_pct > 0.0) {
        return invalid("exit", "min_profit_pct", "min_profit_pct must be positive");
    }
    if !(exit.big_profit_pct > exit.min_profit_pct) {
        return invalid(
            "exit",
            "big_profit_pct",
            "big_profit_pct must be greater than min_profit_pct",
        );
    }
    let hours = exit.tier_hours;
    if !(hours[0] > 0.0 && hours[0] < hours[1] && hours[1] < hours[2]) {
        return invalid(
            "exit",
            "tier_hours",
            "tier_hours must be positive and strictly ascending",
        );
    }
    if !(exit.max_hold_hours > 0.0) {
        return invalid("exit", "max_hold_hours", "max_hold_hours must be positive");
    }
    if exit.trend_lookback == 0 {
        return invalid("exit", "trend_lookback", "trend_lookback must be at least 1");
    }
    Ok(())
}

fn validate_risk(config: &EngineConfig) -> Result<(), TraderError> {
    let risk = &config.risk;
    if !(risk.max_risk_per_trade_pct > 0.0 && risk.max_risk_per_trade_pct <= 100.0) {
        return invalid(
            "risk",
            "max_risk_per_trade_pct",
            "max_risk_per_trade_pct must be in (0, 100]",
        );
    }
    if !(risk.max_drawdown_pct > 0.0 && risk.max_drawdown_pct <= 100.0) {
        return invalid("risk", "max_drawdown_pct", "max_drawdown_pct must be in (0, 100]");
    }
    if risk.leverage == 0 {
        return invalid("risk", "leverage", "leverage must be at least 1");
    }
    Ok(())
}
