//! Position sizing, trade admission and drawdown tracking.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use super::error::RejectReason;

/// Notional may exceed the balance by this factor before a trade is refused.
const BALANCE_TOLERANCE: f64 = 1.01;
/// Fraction of the drawdown limit at which a warning is raised.
const WARNING_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginType {
    Isolated,
    Crossed,
}

impl FromStr for MarginType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolated" => Ok(MarginType::Isolated),
            "crossed" | "cross" => Ok(MarginType::Crossed),
            other => Err(format!("unknown margin type '{other}'")),
        }
    }
}

impl fmt::Display for MarginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginType::Isolated => write!(f, "ISOLATED"),
            MarginType::Crossed => write!(f, "CROSSED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    pub max_risk_per_trade_pct: f64,
    pub max_drawdown_pct: f64,
    pub dynamic_sizing: bool,
    pub leverage: u32,
    pub margin_type: MarginType,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            max_risk_per_trade_pct: 2.0,
            max_drawdown_pct: 10.0,
            dynamic_sizing: false,
            leverage: 1,
            margin_type: MarginType::Isolated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskState {
    pub initial_balance: f64,
    pub peak_balance: f64,
    pub current_drawdown_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingMethod {
    /// Whole balance at the entry price.
    Fixed,
    /// Risk amount divided by the distance to the stop.
    StopDistance,
    /// Stop equal to the entry price.
    StopAtEntry,
    /// Leveraged fraction of the balance.
    Conservative,
}

impl fmt::Display for SizingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizingMethod::Fixed => write!(f, "fixed"),
            SizingMethod::StopDistance => write!(f, "stop-distance"),
            SizingMethod::StopAtEntry => write!(f, "stop-at-entry"),
            SizingMethod::Conservative => write!(f, "conservative"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSize {
    pub quantity: f64,
    pub method: SizingMethod,
}

/// Point-in-time risk summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskStatus {
    pub balance: f64,
    pub initial_balance: f64,
    pub peak_balance: f64,
    pub drawdown_pct: f64,
    pub max_drawdown_pct: f64,
    pub warning: bool,
    pub critical: bool,
}

#[derive(Debug, Clone)]
pub struct RiskManager {
    config: RiskConfig,
    state: RiskState,
}

impl RiskManager {
    pub fn new(config: RiskConfig, initial_balance: f64) -> Self {
        RiskManager {
            config,
            state: RiskState {
                initial_balance,
                peak_balance: initial_balance,
                current_drawdown_pct: 0.0,
            },
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn state(&self) -> &RiskState {
        &self.state
    }

    pub fn size_position(
        &self,
        balance: f64,
        entry_price: f64,
        stop_price: Option<f64>,
        leverage: u32,
    ) -> PositionSize {
        if !self.config.dynamic_sizing {
            return PositionSize {
                quantity: balance / entry_price,
                method: SizingMethod::Fixed,
            };
        }

        let risk_pct = self.config.max_risk_per_trade_pct / 100.0;
        let risk_amount = balance * risk_pct;

        let size = match stop_price.filter(|stop| *stop > 0.0) {
            Some(stop) => {
                let per_unit = (entry_price - stop).abs();
                if per_unit > 0.0 {
                    PositionSize {
                        quantity: risk_amount / per_unit,
                        method: SizingMethod::StopDistance,
                    }
                } else {
                    PositionSize {
                        quantity: risk_amount / entry_price,
                        method: SizingMethod::StopAtEntry,
                    }
                }
            }
            None => PositionSize {
                quantity: balance * f64::from(leverage) * risk_pct / entry_price,
                method: SizingMethod::Conservative,
            },
        };
        debug!(quantity = size.quantity, method = %size.method, "position sized");
        size
    }

    /// Admit or refuse a trade. Checks run in order: balance, notional,
    /// drawdown. Never mutates state.
    pub fn validate_trade(
        &self,
        balance: f64,
        quantity: f64,
        entry_price: f64,
    ) -> Result<(), RejectReason> {
        if balance <= 0.0 {
            return Err(RejectReason::InsufficientBalance { balance });
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(RejectReason::InvalidQuantity { quantity });
        }

        let notional = quantity * entry_price;
        if notional > balance * BALANCE_TOLERANCE {
            return Err(RejectReason::OversizedPosition { notional, balance });
        }

        if self.state.current_drawdown_pct >= self.config.max_drawdown_pct {
            return Err(RejectReason::DrawdownLimitReached {
                drawdown_pct: self.state.current_drawdown_pct,
                max_drawdown_pct: self.config.max_drawdown_pct,
            });
        }

        Ok(())
    }

    pub fn update_drawdown(&mut self, balance: f64) {
        let state = &mut self.state;
        if balance > state.peak_balance {
            state.peak_balance = balance;
        }
        state.current_drawdown_pct = if state.peak_balance > 0.0 {
            ((state.peak_balance - balance) * 100.0 / state.peak_balance).max(0.0)
        } else {
            0.0
        };
    }

    pub fn status(&self, balance: f64) -> RiskStatus {
        let drawdown = self.state.current_drawdown_pct;
        let max = self.config.max_drawdown_pct;
        RiskStatus {
            balance,
            initial_balance: self.state.initial_balance,
            peak_balance: self.state.peak_balance,
            drawdown_pct: drawdown,
            max_drawdown_pct: max,
            warning: drawdown >= max * WARNING_FRACTION,
            critical: drawdown >= max,
        }
    }
}
