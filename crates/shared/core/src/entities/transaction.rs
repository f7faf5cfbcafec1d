use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AssetId, OrderId, UserId};
use crate::values::{Price, Quantity};

/// Unique identifier for a transaction
pub type TransactionId = Uuid;

/// Record of one executed match. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// The asset that changed hands
    pub aid: AssetId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buy_uid: UserId,
    pub sell_uid: UserId,
    pub executed_price: Price,
    pub executed_quantity: Quantity,
    pub executed_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction with explicit timestamp
    #[allow(clippy::too_many_arguments)]
    pub fn new_with_time(
        aid: impl Into<AssetId>,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        buy_uid: UserId,
        sell_uid: UserId,
        executed_price: Price,
        executed_quantity: Quantity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            aid: aid.into(),
            buy_order_id,
            sell_order_id,
            buy_uid,
            sell_uid,
            executed_price,
            executed_quantity,
            executed_at: timestamp,
        }
    }

    /// Amount moved from buyer to seller (price * quantity)
    pub fn notional(&self) -> Decimal {
        self.executed_price.saturating_mul(Decimal::from(self.executed_quantity))
    }

    /// Whether `uid` was on either side of this transaction
    pub fn involves(&self, uid: UserId) -> bool {
        self.buy_uid == uid || self.sell_uid == uid
    }

    /// Whether this transaction filled (part of) `order_id`
    pub fn fills(&self, order_id: OrderId) -> bool {
        self.buy_order_id == order_id || self.sell_order_id == order_id
    }
}
