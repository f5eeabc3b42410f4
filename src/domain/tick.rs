//! Market ticks and the close-price series fed to the indicator.

use chrono::NaiveDateTime;

/// A candle update from the market data feed.
///
/// The same candle arrives repeatedly while it is open; `is_closed` marks
/// its final update.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub is_closed: bool,
}

/// Ordered close prices.
///
/// The last element tracks the candle that is still forming. A new element
/// is appended only once the previous candle has closed, so the length never
/// shrinks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    closes: Vec<f64>,
    last_closed: bool,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with historical closes, all of which are treated as closed candles.
    pub fn from_closes(closes: Vec<f64>) -> Self {
        PriceSeries {
            closes,
            last_closed: true,
        }
    }

    pub fn push(&mut self, close: f64, is_closed: bool) {
        match self.closes.last_mut() {
            Some(last) if !self.last_closed => *last = close,
            _ => self.closes.push(close),
        }
        self.last_closed = is_closed;
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn last(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    /// Percentage change of the last close versus the close `lookback`
    /// samples earlier. Uses the oldest available sample when the series is
    /// shorter than the lookback.
    pub fn pct_change(&self, lookback: usize) -> Option<f64> {
        if self.closes.len() < 2 || lookback == 0 {
            return None;
        }
        let last_idx = self.closes.len() - 1;
        let base = self.closes[last_idx.saturating_sub(lookback)];
        if base <= 0.0 {
            return None;
        }
        Some((self.closes[last_idx] / base - 1.0) * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_appends() {
        let mut series = PriceSeries::new();
        series.push(100.0, false);
        assert_eq!(series.closes(), &[100.0]);
    }

    #[test]
    fn open_candle_overwrites_last() {
        let mut series = PriceSeries::new();
        series.push(100.0, false);
        series.push(101.0, false);
        series.push(102.0, true);
        assert_eq!(series.closes(), &[102.0]);
    }

    #[test]
    fn closed_candle_starts_new_element() {
        let mut series = PriceSeries::new();
        series.push(100.0, true);
        series.push(101.0, false);
        series.push(99.0, true);
        series.push(98.0, false);
        assert_eq!(series.closes(), &[100.0, 99.0, 98.0]);
    }

    #[test]
    fn seeded_series_appends_next_tick() {
        let mut series = PriceSeries::from_closes(vec![1.0, 2.0]);
        series.push(3.0, false);
        assert_eq!(series.len(), 3);
        series.push(4.0, false);
        assert_eq!(series.closes(), &[1.0, 2.0, 4.0]);
    }

    #[test]
    fn pct_change_over_lookback() {
        let series = PriceSeries::from_closes(vec![100.0, 101.0, 102.0, 98.0]);
        let change = series.pct_change(3).unwrap();
        assert!((change - (-2.0)).abs() < 1e-9);
    }

    #[test]
    fn pct_change_short_series_uses_oldest() {
        let series = PriceSeries::from_closes(vec![100.0, 110.0]);
        let change = series.pct_change(15).unwrap();
        assert!((change - 10.0).abs() < 1e-9);
    }

    #[test]
    fn pct_change_requires_two_samples() {
        let series = PriceSeries::from_closes(vec![100.0]);
        assert!(series.pct_change(5).is_none());
    }
}
