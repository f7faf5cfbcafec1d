use brokerage_core::{AssetId, Price};

/// Port for market prices
///
/// The engine only reads from it: to default an order's limit price and to
/// value holdings. How ticks arrive is the implementation's business.
pub trait PriceOracle: Send + Sync {
    /// Latest known price for an asset, if any tick has been seen
    fn current_price(&self, aid: &AssetId) -> Option<Price>;
}
