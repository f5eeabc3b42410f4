//! Running price and indicator extremes since the last flat reset.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremes {
    pub highest_price: f64,
    pub lowest_price: f64,
    pub highest_indicator: f64,
    pub lowest_indicator: f64,
}

impl Default for Extremes {
    fn default() -> Self {
        Extremes {
            highest_price: 0.0,
            lowest_price: f64::INFINITY,
            highest_indicator: 0.0,
            lowest_indicator: 100.0,
        }
    }
}

impl Extremes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Widen the tracked range; never narrows it.
    pub fn update(&mut self, price: f64, indicator: f64) {
        self.highest_price = self.highest_price.max(price);
        self.lowest_price = self.lowest_price.min(price);
        self.highest_indicator = self.highest_indicator.max(indicator);
        self.lowest_indicator = self.lowest_indicator.min(indicator);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}
