use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AssetId, OrderStateError, OrderStatus, Side, UserId};
use crate::values::{Price, Quantity};

/// Unique identifier for an order
pub type OrderId = Uuid;

/// A limit order resting in (or retired from) an asset's book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Owner of the order
    pub uid: UserId,
    /// The asset being traded
    pub aid: AssetId,
    pub side: Side,
    /// Originally requested quantity
    pub quantity: Quantity,
    /// Quantity still open. Only ever decreases.
    pub remaining_quantity: Quantity,
    pub limit_price: Price,
    pub status: OrderStatus,
    /// Submission sequence number, strictly increasing across the engine.
    /// Breaks ties between orders created within the same clock tick.
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a new pending order with explicit timestamp
    pub fn new_with_time(
        uid: UserId,
        aid: impl Into<AssetId>,
        side: Side,
        quantity: Quantity,
        limit_price: Price,
        sequence: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            uid,
            aid: aid.into(),
            side,
            quantity,
            remaining_quantity: quantity,
            limit_price,
            status: OrderStatus::Pending,
            sequence,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Create a new pending order using current system time
    /// Note: For deterministic tests, prefer `new_with_time` with clock-provided time
    pub fn new(
        uid: UserId,
        aid: impl Into<AssetId>,
        side: Side,
        quantity: Quantity,
        limit_price: Price,
        sequence: u64,
    ) -> Self {
        Self::new_with_time(uid, aid, side, quantity, limit_price, sequence, Utc::now())
    }

    /// Quantity executed so far
    pub fn filled_quantity(&self) -> Quantity {
        self.quantity - self.remaining_quantity
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Whether this order was submitted before `other`
    pub fn precedes(&self, other: &Order) -> bool {
        (self.created_at, self.sequence) < (other.created_at, other.sequence)
    }

    /// Cost still reserved by this order: remaining quantity at the limit price
    ///
    /// Only open Buy orders reserve anything. Saturates at `Decimal::MAX`.
    pub fn pending_cost(&self) -> Decimal {
        if self.side == Side::Buy && self.is_open() {
            Decimal::from(self.remaining_quantity).saturating_mul(self.limit_price)
        } else {
            Decimal::ZERO
        }
    }

    /// Apply an execution of `quantity` units
    ///
    /// Moves the order to `Completed` when nothing remains, else to
    /// `PartiallyFilled`.
    pub fn apply_fill(
        &mut self,
        quantity: Quantity,
        at: DateTime<Utc>,
    ) -> Result<OrderStatus, OrderStateError> {
        if quantity == 0 {
            return Err(OrderStateError::EmptyFill);
        }
        if quantity > self.remaining_quantity {
            return Err(OrderStateError::Overfill {
                order_id: self.id,
                remaining: self.remaining_quantity,
                requested: quantity,
            });
        }

        let remaining = self.remaining_quantity - quantity;
        let next = if remaining == 0 {
            OrderStatus::Completed
        } else {
            OrderStatus::PartiallyFilled
        };
        self.transition(next)?;

        self.remaining_quantity = remaining;
        self.updated_at = at;
        Ok(next)
    }

    /// Withdraw the order from the book
    ///
    /// `remaining_quantity` is left as is so the unfilled part stays auditable;
    /// a cancelled order no longer counts towards pending cost.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), OrderStateError> {
        self.transition(OrderStatus::Cancelled)?;
        self.updated_at = at;
        Ok(())
    }

    fn transition(&mut self, next: OrderStatus) -> Result<(), OrderStateError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderStateError::IllegalTransition {
                order_id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
