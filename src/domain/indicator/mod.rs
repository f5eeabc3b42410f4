//! Momentum indicator.
//!
//! The engine works with a single oscillator, the RSI, evaluated over the
//! trailing window of a [`PriceSeries`](crate::domain::tick::PriceSeries).
//! A reading is `None` until enough closes are available.

pub mod rsi;

use std::fmt;

use crate::domain::position::Side;

pub use rsi::calculate_rsi;

/// Oversold/overbought levels shared by entry and exit logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

impl Thresholds {
    /// Level an excursion must cross to open a position on `side`.
    pub fn entry_threshold(&self, side: Side) -> f64 {
        match side {
            Side::Long => self.oversold,
            Side::Short => self.overbought,
        }
    }

    /// Distance past the entry threshold; positive once beyond it.
    pub fn depth(&self, side: Side, value: f64) -> f64 {
        side.sign() * (self.entry_threshold(side) - value)
    }

    /// Indicator sits on the side that hurts an open `side` position.
    pub fn is_adverse(&self, side: Side, value: f64) -> bool {
        match side {
            Side::Long => value < self.oversold,
            Side::Short => value > self.overbought,
        }
    }

    /// Indicator sits in the extreme zone a `side` position profits into.
    pub fn is_favorable(&self, side: Side, value: f64) -> bool {
        match side {
            Side::Long => value >= self.overbought,
            Side::Short => value <= self.oversold,
        }
    }
}

/// Configured RSI with its lookback period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rsi {
    pub period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Rsi { period }
    }

    /// Number of closes needed before a value is produced.
    pub fn warmup(&self) -> usize {
        self.period + 1
    }

    pub fn value(&self, closes: &[f64]) -> Option<f64> {
        calculate_rsi(closes, self.period)
    }
}

impl fmt::Display for Rsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RSI({})", self.period)
    }
}
