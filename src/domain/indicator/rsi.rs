//! RSI (Relative Strength Index) over a trailing window.
//!
//! Average gain/loss are the simple means of the last `n` price changes:
//! - gain = max(delta, 0), loss = max(-delta, 0)
//! - RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//!
//! Degenerate windows resolve explicitly:
//! - no gains and no losses: 50 (flat market)
//! - no losses: 100
//! - no gains: 0
//!
//! Warmup: `n + 1` closes are required.

pub fn calculate_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let window = &closes[closes.len() - period - 1..];
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;

    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gain_sum += change;
        } else if change < 0.0 {
            loss_sum -= change;
        }
    }

    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;

    let rsi = if avg_gain == 0.0 && avg_loss == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    };

    if rsi.is_nan() {
        return None;
    }
    Some(rsi.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn rsi_empty_closes() {
        assert_eq!(calculate_rsi(&[], 14), None);
    }

    #[test]
    fn rsi_zero_period() {
        assert_eq!(calculate_rsi(&[100.0, 101.0], 0), None);
    }

    #[test]
    fn rsi_warmup_boundary() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + (i % 5) as f64 * 2.0).collect();
        assert!(calculate_rsi(&closes[..14], 14).is_none());
        assert!(calculate_rsi(&closes, 14).is_some());
    }

    #[test]
    fn rsi_flat_market_is_neutral() {
        let closes = vec![100.0; 15];
        assert_eq!(calculate_rsi(&closes, 14), Some(50.0));
    }

    #[test]
    fn rsi_all_gains() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        assert_eq!(calculate_rsi(&closes, 14), Some(100.0));
    }

    #[test]
    fn rsi_all_losses() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        assert_eq!(calculate_rsi(&closes, 14), Some(0.0));
    }

    #[test]
    fn rsi_uses_only_trailing_window() {
        // Early crash drops out of the window once enough flat closes follow.
        let mut closes = vec![200.0, 100.0];
        closes.extend(std::iter::repeat_n(100.0, 14));
        assert_eq!(calculate_rsi(&closes, 14), Some(50.0));
    }

    #[test]
    fn rsi_known_calculation() {
        // Two gains of 2 and one loss of 1 over period 3:
        // avg_gain = 4/3, avg_loss = 1/3, RS = 4, RSI = 80
        let closes = [10.0, 12.0, 11.0, 13.0];
        assert_relative_eq!(calculate_rsi(&closes, 3).unwrap(), 80.0, epsilon = 1e-9);
    }

    #[test]
    fn rsi_balanced_moves_is_fifty() {
        let closes = [10.0, 11.0, 10.0, 11.0, 10.0];
        assert_relative_eq!(calculate_rsi(&closes, 4).unwrap(), 50.0, epsilon = 1e-9);
    }

    proptest! {
        #[test]
        fn requires_exactly_period_plus_one(
            period in 1usize..40,
            closes in prop::collection::vec(1.0f64..10_000.0, 0..80),
        ) {
            let value = calculate_rsi(&closes, period);
            prop_assert_eq!(value.is_some(), closes.len() > period);
        }

        #[test]
        fn always_within_bounds(
            period in 1usize..30,
            closes in prop::collection::vec(0.01f64..1_000_000.0, 1..100),
        ) {
            if let Some(rsi) = calculate_rsi(&closes, period) {
                prop_assert!((0.0..=100.0).contains(&rsi));
            }
        }

        #[test]
        fn constant_series_is_fifty(period in 1usize..50, price in 0.01f64..100_000.0) {
            let closes = vec![price; period + 1];
            prop_assert_eq!(calculate_rsi(&closes, period), Some(50.0));
        }

        #[test]
        fn strictly_increasing_is_hundred(
            period in 1usize..30,
            start in 1.0f64..1_000.0,
            extra in 0usize..20,
        ) {
            let closes: Vec<f64> = (0..period + 1 + extra).map(|i| start + i as f64).collect();
            prop_assert_eq!(calculate_rsi(&closes, period), Some(100.0));
        }
    }
}
