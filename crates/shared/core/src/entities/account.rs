use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AssetClass;

/// Unique identifier for a brokerage user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Fund pools of a single user
///
/// Balances only move during settlement. Placing or cancelling an order never
/// touches them; open exposure is derived from the order book instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub uid: UserId,

    /// Funds available for equity trading
    pub equity_funds: Decimal,

    /// Funds available for commodity trading
    pub commodity_funds: Decimal,

    /// When the account was opened
    pub created_at: DateTime<Utc>,

    /// Last settlement that touched this account
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Open an account with explicit timestamp
    pub fn new_with_time(
        uid: UserId,
        equity_funds: Decimal,
        commodity_funds: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            uid,
            equity_funds,
            commodity_funds,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Open an account using current system time
    pub fn new(uid: UserId, equity_funds: Decimal, commodity_funds: Decimal) -> Self {
        Self::new_with_time(uid, equity_funds, commodity_funds, Utc::now())
    }

    /// Balance of the pool that settles trades in `class`
    pub fn funds(&self, class: AssetClass) -> Decimal {
        match class {
            AssetClass::Equity => self.equity_funds,
            AssetClass::Commodity => self.commodity_funds,
        }
    }

    fn pool_mut(&mut self, class: AssetClass) -> &mut Decimal {
        match class {
            AssetClass::Equity => &mut self.equity_funds,
            AssetClass::Commodity => &mut self.commodity_funds,
        }
    }

    /// Add settlement proceeds to a pool
    ///
    /// Returns the new balance, or `None` (account untouched) on overflow.
    pub fn credit(
        &mut self,
        class: AssetClass,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Option<Decimal> {
        let balance = self.funds(class).checked_add(amount)?;
        *self.pool_mut(class) = balance;
        self.updated_at = at;
        Some(balance)
    }

    /// Remove a settlement payment from a pool
    ///
    /// The balance may dip below zero; the shortfall is drawn from the margin
    /// allowance that was checked when the order was placed. Returns the new
    /// balance, or `None` (account untouched) on overflow.
    pub fn debit(
        &mut self,
        class: AssetClass,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Option<Decimal> {
        let balance = self.funds(class).checked_sub(amount)?;
        *self.pool_mut(class) = balance;
        self.updated_at = at;
        Some(balance)
    }
}
