use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AssetId, UserId};
use crate::values::{Price, Quantity};

/// Quantity of one asset owned by one user, with its weighted average cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub uid: UserId,
    pub aid: AssetId,
    /// Units owned (never negative)
    pub quantity: Quantity,
    /// Quantity-weighted average purchase price
    pub avg_buy_price: Price,
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    /// Empty holding, created on first acquisition
    pub fn empty(uid: UserId, aid: impl Into<AssetId>, at: DateTime<Utc>) -> Self {
        Self {
            uid,
            aid: aid.into(),
            quantity: 0,
            avg_buy_price: Decimal::ZERO,
            updated_at: at,
        }
    }

    /// Holding seeded with an existing position (e.g. an opening portfolio)
    pub fn with_position(
        uid: UserId,
        aid: impl Into<AssetId>,
        quantity: Quantity,
        avg_buy_price: Price,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            uid,
            aid: aid.into(),
            quantity,
            avg_buy_price,
            updated_at: at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.quantity == 0
    }

    /// Add a purchase of `quantity` units at `price`, re-weighting the average cost
    ///
    /// Returns the new quantity, or `None` (holding untouched) when the
    /// quantity or total cost would overflow.
    pub fn acquire(
        &mut self,
        quantity: Quantity,
        price: Price,
        at: DateTime<Utc>,
    ) -> Option<Quantity> {
        let new_quantity = self.quantity.checked_add(quantity)?;
        if new_quantity > 0 {
            let total_cost = Decimal::from(self.quantity)
                .checked_mul(self.avg_buy_price)?
                .checked_add(Decimal::from(quantity).checked_mul(price)?)?;
            self.avg_buy_price = total_cost.checked_div(Decimal::from(new_quantity))?;
        }
        self.quantity = new_quantity;
        self.updated_at = at;
        Some(new_quantity)
    }

    /// Remove `quantity` units. Average cost of what remains is unchanged.
    ///
    /// Returns `None` (and leaves the holding untouched) if fewer units are held.
    pub fn release(&mut self, quantity: Quantity, at: DateTime<Utc>) -> Option<Quantity> {
        let remaining = self.quantity.checked_sub(quantity)?;
        self.quantity = remaining;
        if remaining == 0 {
            self.avg_buy_price = Decimal::ZERO;
        }
        self.updated_at = at;
        Some(remaining)
    }

    /// Cost basis: quantity * average buy price
    pub fn cost_basis(&self) -> Decimal {
        Decimal::from(self.quantity).saturating_mul(self.avg_buy_price)
    }

    /// Value at a given market price
    pub fn market_value(&self, price: Price) -> Decimal {
        Decimal::from(self.quantity).saturating_mul(price)
    }

    /// Unrealized profit at a given market price
    pub fn unrealized_pnl(&self, price: Price) -> Decimal {
        self.market_value(price).saturating_sub(self.cost_basis())
    }
}
