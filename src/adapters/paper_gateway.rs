//! Simulated execution venue with percentage slippage and commission.

use tracing::debug;

use crate::domain::error::TraderError;
use crate::domain::position::Side;
use crate::ports::config_port::ConfigPort;
use crate::ports::execution_port::{ExecutionGateway, Fill};

#[derive(Debug, Clone, PartialEq)]
pub struct PaperConfig {
    pub slippage_pct: f64,
    pub commission_pct: f64,
}

impl Default for PaperConfig {
    fn default() -> Self {
        PaperConfig {
            slippage_pct: 0.0,
            commission_pct: 0.0,
        }
    }
}

impl PaperConfig {
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, TraderError> {
        let slippage_pct = config.get_double("paper", "slippage_pct", 0.0)?;
        if slippage_pct < 0.0 {
            return Err(TraderError::config_invalid(
                "paper",
                "slippage_pct",
                "slippage_pct must be non-negative",
            ));
        }
        let commission_pct = config.get_double("paper", "commission_pct", 0.0)?;
        if commission_pct < 0.0 {
            return Err(TraderError::config_invalid(
                "paper",
                "commission_pct",
                "commission_pct must be non-negative",
            ));
        }
        Ok(PaperConfig {
            slippage_pct,
            commission_pct,
        })
    }
}

/// Slippage always moves the fill against the trader: buys fill higher,
/// sells fill lower.
pub fn apply_slippage(price: f64, buying: bool, slippage_pct: f64) -> f64 {
    if buying {
        price * (1.0 + slippage_pct / 100.0)
    } else {
        price * (1.0 - slippage_pct / 100.0)
    }
}

pub fn commission(notional: f64, commission_pct: f64) -> f64 {
    notional * commission_pct / 100.0
}

#[derive(Debug, Clone, Default)]
pub struct PaperGateway {
    config: PaperConfig,
    /// Net signed quantity currently held.
    exposure: f64,
    pub fills: usize,
}

impl PaperGateway {
    pub fn new(config: PaperConfig) -> Self {
        PaperGateway {
            config,
            exposure: 0.0,
            fills: 0,
        }
    }

    pub fn exposure(&self) -> f64 {
        self.exposure
    }

    fn fill(&mut self, buying: bool, quantity: f64, price: f64) -> Result<Fill, TraderError> {
        if !(quantity > 0.0) || !quantity.is_finite() {
            return Err(TraderError::ExecutionFailed {
                reason: format!("invalid order quantity {}", quantity),
            });
        }
        if !(price > 0.0) || !price.is_finite() {
            return Err(TraderError::ExecutionFailed {
                reason: format!("invalid order price {}", price),
            });
        }
        let fill_price = apply_slippage(price, buying, self.config.slippage_pct);
        let fee = commission(fill_price * quantity, self.config.commission_pct);
        self.exposure += if buying { quantity } else { -quantity };
        self.fills += 1;
        debug!(buying, quantity, price = fill_price, fee, "paper fill");
        Ok(Fill {
            price: fill_price,
            quantity,
            fee,
        })
    }
}

impl ExecutionGateway for PaperGateway {
    fn open(&mut self, side: Side, quantity: f64, price: f64) -> Result<Fill, TraderError> {
        self.fill(side == Side::Long, quantity, price)
    }

    fn close(
        &mut self,
        side: Side,
        quantity: f64,
        price: f64,
        reduce_only: bool,
    ) -> Result<Fill, TraderError> {
        if reduce_only && side.sign() * self.exposure < quantity - 1e-12 {
            return Err(TraderError::ExecutionFailed {
                reason: format!(
                    "reduce-only close of {} exceeds {} exposure {}",
                    quantity, side, self.exposure
                ),
            });
        }
        self.fill(side == Side::Short, quantity, price)
    }
}
