//! Entry signal engine.
//!
//! Each side keeps an [`Excursion`]: a counter of ticks spent past the entry
//! threshold and a decaying intensity score that grows with both the depth
//! and the duration of the excursion. A position is proposed once the
//! excursion is strong enough and price and indicator both confirm a turn.
//!
//! Long entries follow oversold excursions, short entries overbought ones.
//! Both sides run through the same code with the comparisons mirrored by
//! [`Side::sign`].

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use super::extremes::Extremes;
use super::indicator::Thresholds;
use super::position::Side;

/// Intensity at which the counter requirement is waived.
pub const INTENSITY_TRIGGER: f64 = 10.0;

const BUFFER_WIDTH: f64 = 5.0;
const NEUTRAL_LEVEL: f64 = 50.0;
const SUB_NEUTRAL_DISTANCE: f64 = 5.0;
const SUSTAINED_MINUTES: i64 = 5;
const SUSTAINED_BONUS: f64 = 0.5;
const BUFFER_DECAY: f64 = 0.2;
const SUB_NEUTRAL_DECAY: f64 = 0.5;
const PARTIAL_RESET_FLOOR: f64 = 5.0;
const PARTIAL_RESET_DECAY: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EntryConfig {
    pub min_entry_counter: u32,
    pub bounce_threshold: f64,
    pub min_time_after_exit_minutes: i64,
    pub allow_short: bool,
    /// Minimum retreat of price from its tracked extreme, in percent.
    pub pullback_pct: f64,
}

impl Default for EntryConfig {
    fn default() -> Self {
        EntryConfig {
            min_entry_counter: 3,
            bounce_threshold: 3.0,
            min_time_after_exit_minutes: 5,
            allow_short: false,
            pullback_pct: 0.75,
        }
    }
}

/// Where an indicator reading falls relative to one side's entry threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Beyond,
    Buffer,
    SubNeutral,
    Neutral,
}

impl Zone {
    pub fn classify(thresholds: &Thresholds, side: Side, indicator: f64) -> Zone {
        let depth = thresholds.depth(side, indicator);
        if depth > 0.0 {
            Zone::Beyond
        } else if depth > -BUFFER_WIDTH {
            Zone::Buffer
        } else if side.sign() * (NEUTRAL_LEVEL - indicator) > SUB_NEUTRAL_DISTANCE {
            Zone::SubNeutral
        } else {
            Zone::Neutral
        }
    }
}

/// Accumulated state of one side's threshold excursion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Excursion {
    pub counter: u32,
    pub intensity: f64,
    pub started_at: Option<NaiveDateTime>,
}

impl Excursion {
    fn observe(&mut self, zone: Zone, depth: f64, now: NaiveDateTime) {
        match zone {
            Zone::Beyond => {
                let started = *self.started_at.get_or_insert(now);
                self.counter += 1;
                self.intensity += 1.0 + depth / 10.0;
                if now - started > Duration::minutes(SUSTAINED_MINUTES) {
                    self.intensity += SUSTAINED_BONUS;
                }
            }
            Zone::Buffer => {
                self.intensity = (self.intensity - BUFFER_DECAY).max(0.0);
            }
            Zone::SubNeutral => {
                self.intensity = (self.intensity - SUB_NEUTRAL_DECAY).max(0.0);
                self.counter = self.counter.saturating_sub(1);
            }
            Zone::Neutral => {
                if self.intensity > PARTIAL_RESET_FLOOR {
                    self.intensity = (self.intensity - PARTIAL_RESET_DECAY).max(0.0);
                } else {
                    self.reset();
                }
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A proposed position, not yet admitted or executed.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySignal {
    pub side: Side,
    pub price: f64,
    pub indicator: f64,
    pub reason: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct EntrySignalEngine {
    config: EntryConfig,
    thresholds: Thresholds,
    long: Excursion,
    short: Excursion,
}

impl EntrySignalEngine {
    pub fn new(config: EntryConfig, thresholds: Thresholds) -> Self {
        EntrySignalEngine {
            config,
            thresholds,
            long: Excursion::default(),
            short: Excursion::default(),
        }
    }

    pub fn excursion(&self, side: Side) -> &Excursion {
        match side {
            Side::Long => &self.long,
            Side::Short => &self.short,
        }
    }

    fn excursion_mut(&mut self, side: Side) -> &mut Excursion {
        match side {
            Side::Long => &mut self.long,
            Side::Short => &mut self.short,
        }
    }

    fn sides(&self) -> &'static [Side] {
        if self.config.allow_short {
            &[Side::Long, Side::Short]
        } else {
            &[Side::Long]
        }
    }

    pub fn in_cooldown(&self, now: NaiveDateTime, last_exit: Option<NaiveDateTime>) -> bool {
        match last_exit {
            Some(exit) => Duration::try_minutes(self.config.min_time_after_exit_minutes)
                .is_none_or(|cooldown| now - exit < cooldown),
            None => false,
        }
    }

    /// Fold one ready tick into the accumulators and check the entry gate.
    ///
    /// `extremes` must already include this tick. Accumulation is kept even
    /// when a signal is returned; the post-trigger reset happens in
    /// [`acknowledge`](Self::acknowledge) once the position is open.
    pub fn evaluate(
        &mut self,
        price: f64,
        indicator: f64,
        now: NaiveDateTime,
        last_exit: Option<NaiveDateTime>,
        extremes: &Extremes,
    ) -> Option<EntrySignal> {
        if self.in_cooldown(now, last_exit) {
            return None;
        }

        for &side in self.sides() {
            let zone = Zone::classify(&self.thresholds, side, indicator);
            let depth = self.thresholds.depth(side, indicator);
            self.excursion_mut(side).observe(zone, depth, now);
        }

        self.sides()
            .iter()
            .find_map(|&side| self.check_gate(side, price, indicator, now, extremes))
    }

    fn check_gate(
        &self,
        side: Side,
        price: f64,
        indicator: f64,
        now: NaiveDateTime,
        extremes: &Extremes,
    ) -> Option<EntrySignal> {
        let excursion = self.excursion(side);
        let counter_met = excursion.counter >= self.config.min_entry_counter;
        let intensity_met = excursion.intensity >= INTENSITY_TRIGGER;
        if !counter_met && !intensity_met {
            return None;
        }

        let pullback_met = match side {
            Side::Long => {
                price <= extremes.highest_price * (1.0 - self.config.pullback_pct / 100.0)
            }
            Side::Short => {
                price >= extremes.lowest_price * (1.0 + self.config.pullback_pct / 100.0)
            }
        };
        if !pullback_met {
            return None;
        }

        let reference = match side {
            Side::Long => extremes.lowest_indicator,
            Side::Short => extremes.highest_indicator,
        };
        let bounce = side.sign() * (indicator - reference);
        if bounce < self.config.bounce_threshold {
            return None;
        }

        let zone_name = match side {
            Side::Long => "oversold",
            Side::Short => "overbought",
        };
        let mut reason = Vec::new();
        if counter_met {
            reason.push(format!("RSI {} x{}", zone_name, excursion.counter));
        }
        if intensity_met {
            reason.push(format!("intensity {:.1}", excursion.intensity));
        }
        reason.push(format!("RSI bounce {:.1}", bounce));
        reason.push(format!("pullback past {}%", self.config.pullback_pct));

        debug!(
            %side,
            price,
            indicator,
            counter = excursion.counter,
            intensity = excursion.intensity,
            "entry gate passed"
        );

        Some(EntrySignal {
            side,
            price,
            indicator,
            reason: reason.join(" | "),
            timestamp: now,
        })
    }

    /// Reset the side's accumulator and its indicator extreme after the
    /// position has been opened.
    pub fn acknowledge(&mut self, side: Side, extremes: &mut Extremes) {
        self.excursion_mut(side).reset();
        match side {
            Side::Long => extremes.lowest_indicator = 100.0,
            Side::Short => extremes.highest_indicator = 0.0,
        }
    }
}
