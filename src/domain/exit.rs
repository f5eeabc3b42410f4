//! Position exit state machine.
//!
//! While a position is open, three escalation tiers latch as the adverse
//! move deepens and the holding time grows. An active tier only permits a
//! close at its own price target while the indicator is still on the
//! adverse side, so the exit lands on the first bounce after escalation
//! rather than at the low. A hard holding-time cap takes precedence over
//! the tiers. Profit taking runs independently of the tiers.
//!
//! All flags reset together when the position closes.

use chrono::{Duration, NaiveDateTime};
use std::fmt;
use tracing::info;

use super::indicator::Thresholds;
use super::position::Position;

/// Adverse move, in percent, that arms each tier.
pub const TIER_ADVERSE_PCT: [f64; 3] = [0.5, 1.0, 2.0];

/// Hold-hour multipliers per tier as (deteriorating, recovering).
const TREND_MULTIPLIERS: [(f64, f64); 3] = [(0.7, 1.3), (0.75, 1.25), (0.8, 1.2)];

const DETERIORATING_PCT: f64 = -1.5;
const RECOVERING_PCT: f64 = -0.3;

/// Tier 1 exits slightly above the entry price.
const AT_ENTRY_TARGET_PCT: f64 = 0.15;
/// Tier 2 accepts this much loss.
const FAST_TARGET_PCT: f64 = 0.75;

/// Minutes since tier 3 activation and the loss tolerated from then on.
const RATCHET_STEPS: [(i64, f64); 4] = [(0, 1.0), (30, 1.5), (60, 2.0), (90, 3.0)];

/// Points the indicator must recede from its post-entry peak.
pub const PEAK_RETRACE_POINTS: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ExitConfig {
    pub min_profit_pct: f64,
    pub big_profit_pct: f64,
    pub tier_hours: [f64; 3],
    pub max_hold_hours: f64,
    /// Closes used to judge the recent trend.
    pub trend_lookback: usize,
}

impl Default for ExitConfig {
    fn default() -> Self {
        ExitConfig {
            min_profit_pct: 0.75,
            big_profit_pct: 3.0,
            tier_hours: [0.5, 1.5, 2.5],
            max_hold_hours: 4.0,
            trend_lookback: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Deteriorating,
    Neutral,
    Recovering,
}

impl Trend {
    /// Classify a percent change already signed in the position's favour.
    pub fn classify(signed_change: f64) -> Trend {
        if signed_change < DETERIORATING_PCT {
            Trend::Deteriorating
        } else if signed_change > RECOVERING_PCT {
            Trend::Recovering
        } else {
            Trend::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    AtEntry,
    Fast,
    VeryFast,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::AtEntry, Tier::Fast, Tier::VeryFast];

    fn index(self) -> usize {
        match self {
            Tier::AtEntry => 0,
            Tier::Fast => 1,
            Tier::VeryFast => 2,
        }
    }

    /// Hours a position must be held before this tier can arm.
    pub fn hour_threshold(self, base_hours: &[f64; 3], trend: Trend) -> f64 {
        let (worse, better) = TREND_MULTIPLIERS[self.index()];
        let base = base_hours[self.index()];
        match trend {
            Trend::Deteriorating => base * worse,
            Trend::Neutral => base,
            Trend::Recovering => base * better,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::AtEntry => write!(f, "tier1 at-entry"),
            Tier::Fast => write!(f, "tier2 fast"),
            Tier::VeryFast => write!(f, "tier3 very-fast"),
        }
    }
}

/// Escalation state of the open position.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitFlags {
    pub at_entry: bool,
    pub fast: bool,
    pub very_fast: bool,
    pub very_fast_since: Option<NaiveDateTime>,
    /// Loss, in percent, tier 3 accepts; widens with time spent in tier 3.
    pub loss_tolerance_pct: f64,
    /// Most favourable indicator reading since entry.
    pub indicator_peak: Option<f64>,
}

impl Default for ExitFlags {
    fn default() -> Self {
        ExitFlags {
            at_entry: false,
            fast: false,
            very_fast: false,
            very_fast_since: None,
            loss_tolerance_pct: RATCHET_STEPS[0].1,
            indicator_peak: None,
        }
    }
}

impl ExitFlags {
    pub fn is_active(&self, tier: Tier) -> bool {
        match tier {
            Tier::AtEntry => self.at_entry,
            Tier::Fast => self.fast,
            Tier::VeryFast => self.very_fast,
        }
    }

    fn activate(&mut self, tier: Tier, now: NaiveDateTime) {
        match tier {
            Tier::AtEntry => self.at_entry = true,
            Tier::Fast => self.fast = true,
            Tier::VeryFast => {
                self.very_fast = true;
                self.very_fast_since = Some(now);
                self.loss_tolerance_pct = RATCHET_STEPS[0].1;
            }
        }
    }

    pub fn is_initial(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    MaxHoldLoss,
    MaxHoldWin,
    Tier(Tier),
    BigProfit,
    IndicatorPeak,
    Shutdown,
}

/// A decision to close the open position.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitSignal {
    pub kind: ExitKind,
    pub price: f64,
    pub indicator: f64,
    pub reason: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct ExitStateMachine {
    config: ExitConfig,
    thresholds: Thresholds,
    flags: ExitFlags,
}

impl ExitStateMachine {
    pub fn new(config: ExitConfig, thresholds: Thresholds) -> Self {
        ExitStateMachine {
            config,
            thresholds,
            flags: ExitFlags::default(),
        }
    }

    pub fn config(&self) -> &ExitConfig {
        &self.config
    }

    pub fn flags(&self) -> &ExitFlags {
        &self.flags
    }

    pub fn reset(&mut self) {
        self.flags = ExitFlags::default();
    }

    /// Evaluate the open position against the latest tick.
    ///
    /// `trend_change` is the raw percent change of price over the trend
    /// lookback. Flag latching is kept whether or not a signal is returned.
    pub fn evaluate(
        &mut self,
        position: &Position,
        price: f64,
        indicator: f64,
        trend_change: Option<f64>,
        now: NaiveDateTime,
    ) -> Option<ExitSignal> {
        let side = position.side;
        let hours_held = position.hours_held(now);
        let move_pct = position.move_pct(price);
        let trend = trend_change
            .map(|change| Trend::classify(side.sign() * change))
            .unwrap_or(Trend::Neutral);

        self.track_peak(position, indicator);
        self.latch_tiers(move_pct, hours_held, trend, now);
        self.advance_ratchet(now);

        let signal = |kind: ExitKind, reason: String| ExitSignal {
            kind,
            price,
            indicator,
            reason,
            timestamp: now,
        };

        if hours_held >= self.config.max_hold_hours {
            if move_pct < 0.0 {
                return Some(signal(
                    ExitKind::MaxHoldLoss,
                    format!("max hold exceeded ({:.1}h) at a loss", hours_held),
                ));
            }
            if self.thresholds.is_favorable(side, indicator) {
                return Some(signal(
                    ExitKind::MaxHoldWin,
                    format!("max hold exceeded ({:.1}h) at RSI extreme", hours_held),
                ));
            }
        }

        if self.thresholds.is_adverse(side, indicator) {
            for tier in Tier::ALL {
                if !self.flags.is_active(tier) {
                    continue;
                }
                let target = self.tier_target(position, tier);
                if side.reached(price, target) {
                    let reason = match tier {
                        Tier::VeryFast => {
                            format!("{} sell (-{}%)", tier, self.flags.loss_tolerance_pct)
                        }
                        _ => format!("{} sell", tier),
                    };
                    return Some(signal(ExitKind::Tier(tier), reason));
                }
            }
        }

        let big_target = side.favorable_price(position.entry_price, self.config.big_profit_pct);
        if side.reached(price, big_target) {
            return Some(signal(
                ExitKind::BigProfit,
                format!("big profit target (+{}%)", self.config.big_profit_pct),
            ));
        }

        let min_target = side.favorable_price(position.entry_price, self.config.min_profit_pct);
        if side.reached(price, min_target) {
            if let Some(peak) = self.flags.indicator_peak {
                let receded = side.sign() * (peak - indicator);
                if self.thresholds.is_favorable(side, peak) && receded >= PEAK_RETRACE_POINTS {
                    return Some(signal(
                        ExitKind::IndicatorPeak,
                        format!(
                            "RSI peak reversal at {:.1} (+{}%+)",
                            peak, self.config.min_profit_pct
                        ),
                    ));
                }
            }
        }

        None
    }

    /// Unconditional close used when the engine shuts down.
    pub fn force_exit(&self, price: f64, indicator: f64, now: NaiveDateTime) -> ExitSignal {
        ExitSignal {
            kind: ExitKind::Shutdown,
            price,
            indicator,
            reason: "shutdown".to_string(),
            timestamp: now,
        }
    }

    fn tier_target(&self, position: &Position, tier: Tier) -> f64 {
        let side = position.side;
        match tier {
            Tier::AtEntry => side.favorable_price(position.entry_price, AT_ENTRY_TARGET_PCT),
            Tier::Fast => side.adverse_price(position.entry_price, FAST_TARGET_PCT),
            Tier::VeryFast => {
                side.adverse_price(position.entry_price, self.flags.loss_tolerance_pct)
            }
        }
    }

    fn track_peak(&mut self, position: &Position, indicator: f64) {
        let side = position.side;
        let peak = match self.flags.indicator_peak {
            Some(peak) if side.sign() * (peak - indicator) >= 0.0 => peak,
            _ => indicator,
        };
        self.flags.indicator_peak = Some(peak);
    }

    fn latch_tiers(&mut self, move_pct: f64, hours_held: f64, trend: Trend, now: NaiveDateTime) {
        for tier in Tier::ALL {
            if self.flags.is_active(tier) {
                continue;
            }
            let hours_needed = tier.hour_threshold(&self.config.tier_hours, trend);
            if move_pct <= -TIER_ADVERSE_PCT[tier.index()] && hours_held >= hours_needed {
                self.flags.activate(tier, now);
                info!(
                    %tier,
                    move_pct,
                    hours_held,
                    ?trend,
                    "exit tier activated"
                );
            }
        }
    }

    fn advance_ratchet(&mut self, now: NaiveDateTime) {
        let Some(since) = self.flags.very_fast_since else {
            return;
        };
        let elapsed = now - since;
        for (minutes, tolerance) in RATCHET_STEPS {
            if elapsed >= Duration::minutes(minutes) {
                self.flags.loss_tolerance_pct = tolerance;
            }
        }
    }
}
