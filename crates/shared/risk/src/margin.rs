use brokerage_core::{AssetClass, Holding, Order, Quantity, Side};
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{RiskError, RiskResult};

/// Credit every user may commit on top of their funds, per asset class
pub const DEFAULT_BASE_ALLOWANCE: Decimal = dec!(100000);

/// Sum of `remaining_qty × limit_price` over open Buy orders
///
/// Sells, cancelled and completed orders contribute nothing. Callers filter
/// by user and asset class. Saturates at `Decimal::MAX`, which only makes the
/// margin check stricter.
pub fn pending_cost<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Decimal {
    orders
        .into_iter()
        .map(Order::pending_cost)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Sum of `qty × avg_buy_price` over holdings (cost basis of what is owned)
pub fn committed_cost<'a>(holdings: impl IntoIterator<Item = &'a Holding>) -> Decimal {
    holdings
        .into_iter()
        .map(Holding::cost_basis)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Everything needed to price one user's margin in one asset class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposureSnapshot {
    pub class: AssetClass,
    pub funds: Decimal,
    pub pending_cost: Decimal,
    pub committed_cost: Decimal,
}

impl ExposureSnapshot {
    /// Build a snapshot from a user's funds, orders and holdings in `class`
    pub fn collect<'a>(
        class: AssetClass,
        funds: Decimal,
        open_orders: impl IntoIterator<Item = &'a Order>,
        holdings: impl IntoIterator<Item = &'a Holding>,
    ) -> Self {
        Self {
            class,
            funds,
            pending_cost: pending_cost(open_orders),
            committed_cost: committed_cost(holdings),
        }
    }
}

/// Margin figures reported to the caller for both fund pools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginStatus {
    pub available_margin_equity: Decimal,
    pub available_margin_commodity: Decimal,
    pub utilized_margin_equity: Decimal,
    pub utilized_margin_commodity: Decimal,
    /// Reserved by open Buy orders, not yet settled
    pub pending_cost_equity: Decimal,
    pub pending_cost_commodity: Decimal,
}

/// Pre-trade margin and holdings checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginCalculator {
    base_allowance: Decimal,
}

impl MarginCalculator {
    pub fn new(base_allowance: Decimal) -> Self {
        Self { base_allowance }
    }

    pub fn base_allowance(&self) -> Decimal {
        self.base_allowance
    }

    /// `base_allowance + funds − pending_cost`, saturating at the decimal bounds
    pub fn available_margin(&self, snapshot: &ExposureSnapshot) -> Decimal {
        self.base_allowance
            .saturating_add(snapshot.funds)
            .saturating_sub(snapshot.pending_cost)
    }

    /// Cost basis of current holdings in the class
    pub fn utilized_margin(&self, snapshot: &ExposureSnapshot) -> Decimal {
        snapshot.committed_cost
    }

    /// Reject a Buy whose notional does not fit in the available margin
    ///
    /// A notional beyond the decimal range never fits; it is reported as
    /// `required = Decimal::MAX`.
    pub fn check_buy(
        &self,
        snapshot: &ExposureSnapshot,
        quantity: Quantity,
        limit_price: Decimal,
    ) -> RiskResult<()> {
        let notional = Decimal::from(quantity).checked_mul(limit_price);
        let required = notional.unwrap_or(Decimal::MAX);
        let available = self.available_margin(snapshot);

        debug!(
            "Margin check: class={}, required={}, available={}, funds={}, pending={}",
            snapshot.class, required, available, snapshot.funds, snapshot.pending_cost
        );

        if notional.is_none() || available < required {
            return Err(RiskError::MarginExceeded {
                class: snapshot.class,
                required,
                available,
            });
        }
        Ok(())
    }

    /// Reject a Sell for more than the user can deliver
    ///
    /// `held` is the holding quantity; `committed` is what the user's other
    /// open Sell orders on the same asset may still deliver.
    pub fn check_sell(
        &self,
        held: Quantity,
        committed: Quantity,
        quantity: Quantity,
    ) -> RiskResult<()> {
        let available = held.saturating_sub(committed);
        if quantity > available {
            return Err(RiskError::InsufficientHoldings {
                requested: quantity,
                available,
            });
        }
        Ok(())
    }

    /// Remaining quantity already promised by open Sell orders
    pub fn committed_sell_quantity<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Quantity {
        orders
            .into_iter()
            .filter(|o| o.side == Side::Sell && o.is_open())
            .map(|o| o.remaining_quantity)
            .fold(0, Quantity::saturating_add)
    }

    /// Combine the two per-class snapshots into the caller-facing report
    pub fn status(&self, equity: &ExposureSnapshot, commodity: &ExposureSnapshot) -> MarginStatus {
        MarginStatus {
            available_margin_equity: self.available_margin(equity),
            available_margin_commodity: self.available_margin(commodity),
            utilized_margin_equity: self.utilized_margin(equity),
            utilized_margin_commodity: self.utilized_margin(commodity),
            pending_cost_equity: equity.pending_cost,
            pending_cost_commodity: commodity.pending_cost,
        }
    }
}

impl Default for MarginCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_ALLOWANCE)
    }
}
