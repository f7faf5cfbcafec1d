use brokerage_core::{AssetId, Price, Timestamp};
use brokerage_ports::PriceOracle;
use chrono::Utc;
use dashmap::DashMap;
use log::debug;

/// A price observation for one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceTick {
    pub price: Price,
    pub observed_at: Timestamp,
}

/// In-memory price oracle holding the latest tick per asset
///
/// Older ticks never overwrite newer ones, so feeds may deliver out of order.
#[derive(Default)]
pub struct PriceBoard {
    ticks: DashMap<AssetId, PriceTick>,
}

impl PriceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tick observed now
    pub fn record_price(&self, aid: impl Into<AssetId>, price: Price) {
        self.record_price_at(aid, price, Utc::now());
    }

    /// Record a tick with explicit observation time
    pub fn record_price_at(&self, aid: impl Into<AssetId>, price: Price, observed_at: Timestamp) {
        let aid = aid.into();
        let tick = PriceTick { price, observed_at };
        self.ticks
            .entry(aid.clone())
            .and_modify(|current| {
                if current.observed_at <= observed_at {
                    *current = tick;
                }
            })
            .or_insert(tick);
        debug!("Price tick: asset={}, price={}", aid, price);
    }

    pub fn latest(&self, aid: &AssetId) -> Option<PriceTick> {
        self.ticks.get(aid).map(|tick| *tick)
    }
}

impl PriceOracle for PriceBoard {
    fn current_price(&self, aid: &AssetId) -> Option<Price> {
        self.latest(aid).map(|tick| tick.price)
    }
}
