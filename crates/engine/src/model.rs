// Re-export domain types from brokerage-core
pub use brokerage_core::{
    Account, Asset, AssetClass, AssetId, Holding, Order, OrderId, OrderStatus, Price, Quantity,
    Side, Timestamp, Transaction, TransactionId, UserId,
};

// Re-export margin reporting
pub use brokerage_risk::MarginStatus;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A holding as reported to the caller, valued at the oracle price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingView {
    pub aid: AssetId,
    pub name: String,
    pub class: AssetClass,
    pub quantity: Quantity,
    pub avg_buy_price: Price,
    /// None when the oracle has never priced the asset
    pub current_price: Option<Price>,
    pub current_value: Option<Decimal>,
    /// `current_value − quantity × avg_buy_price`
    pub profit: Option<Decimal>,
    /// Profit relative to cost basis, in percent
    pub profit_percentage: Option<Decimal>,
}

/// Portfolio totals for one user
///
/// Holdings without an oracle price are valued at cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    /// Zero when nothing is held
    pub total_profit_percentage: Decimal,
    pub total_equity_value: Decimal,
    pub total_commodity_value: Decimal,
}

/// Outcome of one matching pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub aid: AssetId,
    /// Transactions settled by this pass, in execution order
    pub transactions: Vec<Transaction>,
}

impl MatchReport {
    pub fn new(aid: AssetId) -> Self {
        Self {
            aid,
            transactions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn match_count(&self) -> usize {
        self.transactions.len()
    }

    /// Units that changed hands
    pub fn matched_quantity(&self) -> Quantity {
        self.transactions
            .iter()
            .map(|t| t.executed_quantity)
            .fold(0, Quantity::saturating_add)
    }

    /// Total cash that moved from buyers to sellers
    pub fn notional(&self) -> Decimal {
        self.transactions
            .iter()
            .map(Transaction::notional)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }
}

/// Percentage of `part` over `whole`, zero when `whole` is zero
pub(crate) fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        let saturated = if part.is_sign_negative() == whole.is_sign_negative() {
            Decimal::MAX
        } else {
            Decimal::MIN
        };
        part.checked_div(whole)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(saturated)
    }
}
