//! Settlement of a single match
//!
//! [`settle`] is pure: it takes the current records of both orders, both
//! accounts and both holdings, and returns their new versions plus the
//! transaction record. Nothing is written until the caller commits the
//! resulting [`WriteBatch`].

use brokerage_core::{
    Account, AssetClass, Holding, Order, OrderStateError, Quantity, Timestamp, Transaction,
    UserId,
};
use brokerage_ports::Fill;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::infrastructure::WriteBatch;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error(transparent)]
    OrderState(#[from] OrderStateError),

    #[error("User {uid} holds {held}, cannot deliver {required}")]
    ShortDelivery {
        uid: UserId,
        held: Quantity,
        required: Quantity,
    },

    #[error("No account for user {0}")]
    MissingAccount(UserId),

    #[error("Fill does not belong to these orders: {0}")]
    Mismatch(String),

    #[error("Amount out of range: {0}")]
    OutOfRange(String),
}

/// Current state of everything a match touches
#[derive(Debug, Clone)]
pub struct SettlementContext {
    /// Class of the traded asset; selects the fund pool
    pub class: AssetClass,
    pub buy_order: Order,
    pub sell_order: Order,
    /// Accounts of the parties. One entry when a user matched their own order.
    pub accounts: BTreeMap<UserId, Account>,
    /// Existing holdings of the traded asset, keyed by user
    pub holdings: BTreeMap<UserId, Holding>,
}

/// New versions of every record touched by a match
#[derive(Debug, Clone)]
pub struct Settlement {
    pub transaction: Transaction,
    pub buy_order: Order,
    pub sell_order: Order,
    pub accounts: Vec<Account>,
    pub holdings: Vec<Holding>,
}

impl Settlement {
    /// Stage every write of this settlement as one all-or-nothing batch
    pub fn into_batch(self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for account in self.accounts {
            batch.put_account(account);
        }
        for holding in self.holdings {
            batch.put_holding(holding);
        }
        batch
            .put_order(self.buy_order)
            .put_order(self.sell_order)
            .append_transaction(self.transaction);
        batch
    }
}

/// Compute the effects of executing `fill`
///
/// - buyer's pool is debited and seller's pool credited by `quantity × price`
/// - buyer's holding grows, with its average cost re-weighted
/// - seller's holding shrinks
/// - both orders record the fill
///
/// A self-match moves no units, so the holding keeps its quantity and cost.
pub fn settle(
    mut ctx: SettlementContext,
    fill: &Fill,
    at: Timestamp,
) -> Result<Settlement, SettlementError> {
    if ctx.buy_order.id != fill.buy_order_id || ctx.sell_order.id != fill.sell_order_id {
        return Err(SettlementError::Mismatch(format!(
            "fill {}/{} vs orders {}/{}",
            fill.buy_order_id, fill.sell_order_id, ctx.buy_order.id, ctx.sell_order.id
        )));
    }
    if ctx.buy_order.aid != ctx.sell_order.aid {
        return Err(SettlementError::Mismatch(format!(
            "assets {} and {}",
            ctx.buy_order.aid, ctx.sell_order.aid
        )));
    }

    let quantity = fill.quantity;
    let price = fill.price;
    let buyer = ctx.buy_order.uid;
    let seller = ctx.sell_order.uid;
    let aid = ctx.buy_order.aid.clone();

    ctx.buy_order.apply_fill(quantity, at)?;
    ctx.sell_order.apply_fill(quantity, at)?;

    let out_of_range = SettlementError::OutOfRange;

    let notional = Decimal::from(quantity)
        .checked_mul(price)
        .ok_or_else(|| out_of_range(format!("notional of {} @ {}", quantity, price)))?;
    ctx.accounts
        .get_mut(&buyer)
        .ok_or(SettlementError::MissingAccount(buyer))?
        .debit(ctx.class, notional, at)
        .ok_or_else(|| out_of_range(format!("{} funds of user {}", ctx.class, buyer)))?;
    ctx.accounts
        .get_mut(&seller)
        .ok_or(SettlementError::MissingAccount(seller))?
        .credit(ctx.class, notional, at)
        .ok_or_else(|| out_of_range(format!("{} funds of user {}", ctx.class, seller)))?;

    let short = |held| SettlementError::ShortDelivery {
        uid: seller,
        held,
        required: quantity,
    };
    let seller_holding = ctx.holdings.get_mut(&seller).ok_or(short(0))?;
    let held = seller_holding.quantity;
    if buyer == seller {
        if held < quantity {
            return Err(short(held));
        }
        seller_holding.updated_at = at;
    } else {
        seller_holding.release(quantity, at).ok_or(short(held))?;
        ctx.holdings
            .entry(buyer)
            .or_insert_with(|| Holding::empty(buyer, aid.clone(), at))
            .acquire(quantity, price, at)
            .ok_or_else(|| out_of_range(format!("holding of user {} in {}", buyer, aid)))?;
    }

    let transaction = Transaction::new_with_time(
        aid,
        ctx.buy_order.id,
        ctx.sell_order.id,
        buyer,
        seller,
        price,
        quantity,
        at,
    );

    Ok(Settlement {
        transaction,
        buy_order: ctx.buy_order,
        sell_order: ctx.sell_order,
        accounts: ctx.accounts.into_values().collect(),
        holdings: ctx.holdings.into_values().collect(),
    })
}
