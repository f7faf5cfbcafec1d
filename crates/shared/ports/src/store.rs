use brokerage_core::{Account, Asset, AssetId, Holding, Order, OrderId, Transaction, UserId};

use crate::error::StoreResult;

/// Port for persisted engine state
///
/// Every method is a single-record read or write. Grouping writes into an
/// all-or-nothing unit is done above this trait, by the engine's write batch.
pub trait LedgerStore: Send + Sync {
    // Accounts

    /// Insert a new account. Fails with `Duplicate` if the user already has one.
    fn insert_account(&self, account: Account) -> StoreResult<()>;
    fn account(&self, uid: UserId) -> StoreResult<Option<Account>>;
    fn put_account(&self, account: Account) -> StoreResult<()>;

    // Assets

    /// Insert a new asset. Fails with `Duplicate` if the id is taken.
    fn insert_asset(&self, asset: Asset) -> StoreResult<()>;
    fn asset(&self, aid: &AssetId) -> StoreResult<Option<Asset>>;
    fn assets(&self) -> StoreResult<Vec<Asset>>;

    // Orders

    fn order(&self, oid: OrderId) -> StoreResult<Option<Order>>;
    fn put_order(&self, order: Order) -> StoreResult<()>;
    /// Pending and partially filled orders for one asset
    fn open_orders(&self, aid: &AssetId) -> StoreResult<Vec<Order>>;
    /// Every order (any status) placed by one user
    fn orders_for_user(&self, uid: UserId) -> StoreResult<Vec<Order>>;
    /// Assets that have at least one open order
    fn assets_with_open_orders(&self) -> StoreResult<Vec<AssetId>>;

    // Holdings

    fn holding(&self, uid: UserId, aid: &AssetId) -> StoreResult<Option<Holding>>;
    fn put_holding(&self, holding: Holding) -> StoreResult<()>;
    fn remove_holding(&self, uid: UserId, aid: &AssetId) -> StoreResult<()>;
    fn holdings_for_user(&self, uid: UserId) -> StoreResult<Vec<Holding>>;

    // Transaction log

    fn append_transaction(&self, transaction: Transaction) -> StoreResult<()>;
    fn transactions_for_user(&self, uid: UserId) -> StoreResult<Vec<Transaction>>;
    fn transactions_for_asset(&self, aid: &AssetId) -> StoreResult<Vec<Transaction>>;
    fn transactions_for_order(&self, oid: OrderId) -> StoreResult<Vec<Transaction>>;
}
