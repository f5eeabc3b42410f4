//! Market data source port trait.

use crate::domain::error::TraderError;
use crate::domain::tick::Tick;

pub trait MarketDataPort {
    /// All ticks for `symbol`, in timestamp order.
    fn load_ticks(&self, symbol: &str) -> Result<Vec<Tick>, TraderError>;
}
