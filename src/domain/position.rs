//! Open position tracking and closed trade records.

use chrono::{Duration, NaiveDateTime};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short. Multiplying a price move by the sign
    /// yields the move in the position's favour.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    /// Price `pct` percent in the position's favour from `base`.
    pub fn favorable_price(self, base: f64, pct: f64) -> f64 {
        base * (1.0 + self.sign() * pct / 100.0)
    }

    /// Price `pct` percent against the position from `base`.
    pub fn adverse_price(self, base: f64, pct: f64) -> f64 {
        base * (1.0 - self.sign() * pct / 100.0)
    }

    /// Whether `price` is at or beyond `target` in the position's favour.
    pub fn reached(self, price: f64, target: f64) -> bool {
        match self {
            Side::Long => price >= target,
            Side::Short => price <= target,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub entry_indicator: f64,
    pub entry_fee: f64,
    pub current_price: f64,
    pub current_indicator: f64,
    pub unrealized_pnl: f64,
    pub unrealized_pnl_pct: f64,
}

impl Position {
    pub fn open(
        symbol: &str,
        side: Side,
        quantity: f64,
        entry_price: f64,
        entry_time: NaiveDateTime,
        entry_indicator: f64,
        entry_fee: f64,
    ) -> Self {
        Position {
            symbol: symbol.to_string(),
            side,
            quantity,
            entry_price,
            entry_time,
            entry_indicator,
            entry_fee,
            current_price: entry_price,
            current_indicator: entry_indicator,
            unrealized_pnl: 0.0,
            unrealized_pnl_pct: 0.0,
        }
    }

    /// Mark the position to the latest price and indicator.
    pub fn update(&mut self, price: f64, indicator: f64) {
        self.current_price = price;
        self.current_indicator = indicator;
        self.unrealized_pnl = self.side.sign() * (price - self.entry_price) * self.quantity;
        self.unrealized_pnl_pct = self.move_pct(price);
    }

    /// Signed percent move from entry in the position's favour.
    pub fn move_pct(&self, price: f64) -> f64 {
        if self.entry_price <= 0.0 {
            return 0.0;
        }
        self.side.sign() * (price / self.entry_price - 1.0) * 100.0
    }

    pub fn notional(&self) -> f64 {
        self.quantity * self.entry_price
    }

    pub fn time_held(&self, now: NaiveDateTime) -> Duration {
        now - self.entry_time
    }

    pub fn hours_held(&self, now: NaiveDateTime) -> f64 {
        self.time_held(now).num_seconds() as f64 / 3600.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeResult {
    Win,
    Loss,
}

impl fmt::Display for TradeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeResult::Win => write!(f, "WIN"),
            TradeResult::Loss => write!(f, "LOSS"),
        }
    }
}

/// A completed round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub result: TradeResult,
    pub time_held: Duration,
    pub reason: String,
}

impl Trade {
    /// Close `position` at `exit_price`. Fees on both legs are deducted from
    /// the P&L; the percentage is relative to entry notional.
    pub fn from_close(
        position: &Position,
        exit_price: f64,
        exit_fee: f64,
        exit_time: NaiveDateTime,
        reason: &str,
    ) -> Self {
        let gross = position.side.sign() * (exit_price - position.entry_price) * position.quantity;
        let pnl = gross - position.entry_fee - exit_fee;
        let notional = position.notional();
        let pnl_pct = if notional > 0.0 {
            pnl / notional * 100.0
        } else {
            0.0
        };
        let result = if pnl >= 0.0 {
            TradeResult::Win
        } else {
            TradeResult::Loss
        };

        Trade {
            symbol: position.symbol.clone(),
            side: position.side,
            quantity: position.quantity,
            entry_price: position.entry_price,
            exit_price,
            entry_time: position.entry_time,
            exit_time,
            pnl,
            pnl_pct,
            result,
            time_held: exit_time - position.entry_time,
            reason: reason.to_string(),
        }
    }

    pub fn minutes_held(&self) -> f64 {
        self.time_held.num_seconds() as f64 / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn long_position() -> Position {
        Position::open("ETHUSDT", Side::Long, 0.5, 2000.0, at(10, 0), 28.0, 0.0)
    }

    fn short_position() -> Position {
        Position::open("ETHUSDT", Side::Short, 0.5, 2000.0, at(10, 0), 72.0, 0.0)
    }

    #[test]
    fn side_sign_and_opposite() {
        assert_eq!(Side::Long.sign(), 1.0);
        assert_eq!(Side::Short.sign(), -1.0);
        assert_eq!(Side::Long.opposite(), Side::Short);
    }

    #[test]
    fn side_prices() {
        assert_relative_eq!(Side::Long.favorable_price(2000.0, 3.0), 2060.0);
        assert_relative_eq!(Side::Short.favorable_price(2000.0, 3.0), 1940.0);
        assert_relative_eq!(Side::Long.adverse_price(2000.0, 1.0), 1980.0);
        assert_relative_eq!(Side::Short.adverse_price(2000.0, 1.0), 2020.0);
    }

    #[test]
    fn side_reached() {
        assert!(Side::Long.reached(2060.0, 2060.0));
        assert!(!Side::Long.reached(2059.0, 2060.0));
        assert!(Side::Short.reached(1940.0, 1940.0));
        assert!(!Side::Short.reached(1941.0, 1940.0));
    }

    #[test]
    fn update_long_profit() {
        let mut pos = long_position();
        pos.update(2060.0, 65.0);
        assert_relative_eq!(pos.unrealized_pnl, 30.0);
        assert_relative_eq!(pos.unrealized_pnl_pct, 3.0, epsilon = 1e-9);
        assert_eq!(pos.current_indicator, 65.0);
    }

    #[test]
    fn update_short_profit() {
        let mut pos = short_position();
        pos.update(1940.0, 35.0);
        assert_relative_eq!(pos.unrealized_pnl, 30.0);
        assert_relative_eq!(pos.unrealized_pnl_pct, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn update_short_loss() {
        let mut pos = short_position();
        pos.update(2020.0, 80.0);
        assert_relative_eq!(pos.unrealized_pnl, -10.0);
        assert_relative_eq!(pos.unrealized_pnl_pct, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn hours_held() {
        let pos = long_position();
        assert_relative_eq!(pos.hours_held(at(13, 30)), 3.5);
    }

    #[test]
    fn trade_from_close_win() {
        let pos = long_position();
        let trade = Trade::from_close(&pos, 2060.0, 0.0, at(11, 0), "big profit");
        assert_relative_eq!(trade.pnl, 30.0);
        assert_relative_eq!(trade.pnl_pct, 3.0, epsilon = 1e-9);
        assert_eq!(trade.result, TradeResult::Win);
        assert_relative_eq!(trade.minutes_held(), 60.0);
    }

    #[test]
    fn trade_fees_reduce_pnl() {
        let mut pos = long_position();
        pos.entry_fee = 1.0;
        let trade = Trade::from_close(&pos, 2002.0, 1.5, at(11, 0), "x");
        // gross 1.0 - fees 2.5
        assert_relative_eq!(trade.pnl, -1.5);
        assert_eq!(trade.result, TradeResult::Loss);
    }

    #[test]
    fn trade_breakeven_is_win() {
        let pos = long_position();
        let trade = Trade::from_close(&pos, 2000.0, 0.0, at(11, 0), "x");
        assert_eq!(trade.result, TradeResult::Win);
    }
}
