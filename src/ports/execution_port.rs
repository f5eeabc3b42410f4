//! Order execution port trait.

use crate::domain::error::TraderError;
use crate::domain::position::Side;

/// What the venue actually executed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub price: f64,
    pub quantity: f64,
    pub fee: f64,
}

/// Synchronous gateway to an execution venue.
///
/// Timeouts and retries belong to the implementation. The engine only
/// sees success or [`TraderError::ExecutionFailed`], and commits nothing
/// until a call succeeds.
pub trait ExecutionGateway {
    fn open(&mut self, side: Side, quantity: f64, price: f64) -> Result<Fill, TraderError>;

    /// Close `quantity` of an open `side` position.
    fn close(
        &mut self,
        side: Side,
        quantity: f64,
        price: f64,
        reduce_only: bool,
    ) -> Result<Fill, TraderError>;
}
