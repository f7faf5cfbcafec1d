use brokerage_core::{Order, OrderId, Price, Quantity};

use crate::error::MatchingResult;

/// One planned execution between a resting Buy and a resting Sell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
}

/// Port for order matching algorithms
///
/// Implementations are pure: they read order snapshots and return the fills
/// they would execute. Applying those fills is the engine's job.
pub trait MatchingAlgorithm: Send + Sync {
    /// Check if two orders can match
    fn can_match(&self, buy_order: &Order, sell_order: &Order) -> bool;

    /// Match two orders and return the fill and remaining quantities
    ///
    /// Returns: (fill, buy_remaining_qty, sell_remaining_qty)
    fn match_orders(
        &self,
        buy_order: &Order,
        sell_order: &Order,
    ) -> MatchingResult<(Fill, Quantity, Quantity)>;

    /// Plan every fill a pass over `orders` (one asset's open orders) would
    /// produce, in execution order
    fn plan_pass(&self, orders: &[Order]) -> MatchingResult<Vec<Fill>>;

    /// Get the name of the algorithm
    fn name(&self) -> &str;
}
