//! Running trade statistics.

use super::position::{Trade, TradeResult};

#[derive(Debug, Clone, PartialEq)]
pub struct TradingStats {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percent of trades that were wins.
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    /// Most negative P&L seen.
    pub largest_loss: f64,
    pub avg_minutes_held: f64,
    pub start_balance: f64,
    pub current_balance: f64,
    pub total_return_pct: f64,
}

impl TradingStats {
    pub fn new(start_balance: f64) -> Self {
        TradingStats {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            total_pnl: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            largest_win: 0.0,
            largest_loss: 0.0,
            avg_minutes_held: 0.0,
            start_balance,
            current_balance: start_balance,
            total_return_pct: 0.0,
        }
    }

    /// Fold one closed trade into the statistics. `balance` is the account
    /// balance after the trade settled.
    pub fn record(&mut self, trade: &Trade, balance: f64) {
        self.total_trades += 1;
        let n = self.total_trades as f64;

        match trade.result {
            TradeResult::Win => {
                self.winning_trades += 1;
                let wins = self.winning_trades as f64;
                self.avg_win = (self.avg_win * (wins - 1.0) + trade.pnl) / wins;
                self.largest_win = self.largest_win.max(trade.pnl);
            }
            TradeResult::Loss => {
                self.losing_trades += 1;
                let losses = self.losing_trades as f64;
                self.avg_loss = (self.avg_loss * (losses - 1.0) + trade.pnl) / losses;
                self.largest_loss = self.largest_loss.min(trade.pnl);
            }
        }

        self.total_pnl += trade.pnl;
        self.win_rate = self.winning_trades as f64 / n * 100.0;
        self.avg_minutes_held = (self.avg_minutes_held * (n - 1.0) + trade.minutes_held()) / n;

        self.current_balance = balance;
        self.total_return_pct = if self.start_balance > 0.0 {
            (balance / self.start_balance - 1.0) * 100.0
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{Position, Side};
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn trade(exit_price: f64, minutes: u32) -> Trade {
        let pos = Position::open("ETHUSDT", Side::Long, 0.5, 2000.0, at(10, 0), 25.0, 0.0);
        Trade::from_close(&pos, exit_price, 0.0, at(10, minutes), "test")
    }

    #[test]
    fn empty_stats() {
        let stats = TradingStats::new(1000.0);
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.current_balance, 1000.0);
    }

    #[test]
    fn mixed_trades() {
        let mut stats = TradingStats::new(1000.0);
        stats.record(&trade(2060.0, 30), 1030.0);
        stats.record(&trade(1980.0, 50), 1020.0);
        stats.record(&trade(2040.0, 10), 1040.0);

        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.losing_trades, 1);
        assert_relative_eq!(stats.win_rate, 200.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(stats.total_pnl, 40.0);
        assert_relative_eq!(stats.avg_win, 25.0);
        assert_relative_eq!(stats.avg_loss, -10.0);
        assert_relative_eq!(stats.largest_win, 30.0);
        assert_relative_eq!(stats.largest_loss, -10.0);
        assert_relative_eq!(stats.avg_minutes_held, 30.0);
        assert_relative_eq!(stats.total_return_pct, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn largest_loss_tracks_most_negative() {
        let mut stats = TradingStats::new(1000.0);
        stats.record(&trade(1990.0, 5), 995.0);
        stats.record(&trade(1950.0, 5), 970.0);
        stats.record(&trade(1980.0, 5), 960.0);
        assert_relative_eq!(stats.largest_loss, -25.0);
        assert_eq!(stats.win_rate, 0.0);
    }
}
