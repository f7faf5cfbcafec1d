use brokerage_core::{Account, Asset, AssetId, Holding, Order, OrderId, Transaction, UserId};
use brokerage_ports::{LedgerStore, StoreError, StoreResult};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::BTreeSet;
use std::sync::RwLock;

/// In-memory implementation of the ledger store
///
/// Tables are concurrent maps; the transaction log is a vector that is only
/// ever appended to.
#[derive(Default)]
pub struct MemoryStore {
    accounts: DashMap<UserId, Account>,
    assets: DashMap<AssetId, Asset>,
    orders: DashMap<OrderId, Order>,
    holdings: DashMap<(UserId, AssetId), Holding>,
    transactions: RwLock<Vec<Transaction>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_log<T>(&self, f: impl FnOnce(&[Transaction]) -> T) -> StoreResult<T> {
        let log = self
            .transactions
            .read()
            .map_err(|_| StoreError::Unavailable("transaction log lock poisoned".to_string()))?;
        Ok(f(&log))
    }

    fn select_transactions(
        &self,
        predicate: impl Fn(&Transaction) -> bool,
    ) -> StoreResult<Vec<Transaction>> {
        self.read_log(|log| log.iter().filter(|t| predicate(t)).cloned().collect())
    }

    /// Total number of transactions recorded
    pub fn transaction_count(&self) -> StoreResult<usize> {
        self.read_log(|log| log.len())
    }
}

fn by_submission(orders: &mut [Order]) {
    orders.sort_by_key(|o| (o.created_at, o.sequence));
}

impl LedgerStore for MemoryStore {
    fn insert_account(&self, account: Account) -> StoreResult<()> {
        match self.accounts.entry(account.uid) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(format!("account {}", account.uid))),
            Entry::Vacant(slot) => {
                slot.insert(account);
                Ok(())
            }
        }
    }

    fn account(&self, uid: UserId) -> StoreResult<Option<Account>> {
        Ok(self.accounts.get(&uid).map(|a| a.value().clone()))
    }

    fn put_account(&self, account: Account) -> StoreResult<()> {
        self.accounts.insert(account.uid, account);
        Ok(())
    }

    fn insert_asset(&self, asset: Asset) -> StoreResult<()> {
        match self.assets.entry(asset.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(format!("asset {}", asset.id))),
            Entry::Vacant(slot) => {
                slot.insert(asset);
                Ok(())
            }
        }
    }

    fn asset(&self, aid: &AssetId) -> StoreResult<Option<Asset>> {
        Ok(self.assets.get(aid).map(|a| a.value().clone()))
    }

    fn assets(&self) -> StoreResult<Vec<Asset>> {
        let mut assets: Vec<Asset> = self.assets.iter().map(|a| a.value().clone()).collect();
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(assets)
    }

    fn order(&self, oid: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.orders.get(&oid).map(|o| o.value().clone()))
    }

    fn put_order(&self, order: Order) -> StoreResult<()> {
        self.orders.insert(order.id, order);
        Ok(())
    }

    fn open_orders(&self, aid: &AssetId) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| o.aid == *aid && o.is_open())
            .map(|o| o.value().clone())
            .collect();
        by_submission(&mut orders);
        Ok(orders)
    }

    fn orders_for_user(&self, uid: UserId) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| o.uid == uid)
            .map(|o| o.value().clone())
            .collect();
        by_submission(&mut orders);
        Ok(orders)
    }

    fn assets_with_open_orders(&self) -> StoreResult<Vec<AssetId>> {
        let assets: BTreeSet<AssetId> = self
            .orders
            .iter()
            .filter(|o| o.is_open())
            .map(|o| o.aid.clone())
            .collect();
        Ok(assets.into_iter().collect())
    }

    fn holding(&self, uid: UserId, aid: &AssetId) -> StoreResult<Option<Holding>> {
        Ok(self
            .holdings
            .get(&(uid, aid.clone()))
            .map(|h| h.value().clone()))
    }

    fn put_holding(&self, holding: Holding) -> StoreResult<()> {
        self.holdings
            .insert((holding.uid, holding.aid.clone()), holding);
        Ok(())
    }

    fn remove_holding(&self, uid: UserId, aid: &AssetId) -> StoreResult<()> {
        self.holdings.remove(&(uid, aid.clone()));
        Ok(())
    }

    fn holdings_for_user(&self, uid: UserId) -> StoreResult<Vec<Holding>> {
        let mut holdings: Vec<Holding> = self
            .holdings
            .iter()
            .filter(|h| h.key().0 == uid)
            .map(|h| h.value().clone())
            .collect();
        holdings.sort_by(|a, b| a.aid.cmp(&b.aid));
        Ok(holdings)
    }

    fn append_transaction(&self, transaction: Transaction) -> StoreResult<()> {
        let mut log = self
            .transactions
            .write()
            .map_err(|_| StoreError::Unavailable("transaction log lock poisoned".to_string()))?;
        log.push(transaction);
        Ok(())
    }

    fn transactions_for_user(&self, uid: UserId) -> StoreResult<Vec<Transaction>> {
        self.select_transactions(|t| t.involves(uid))
    }

    fn transactions_for_asset(&self, aid: &AssetId) -> StoreResult<Vec<Transaction>> {
        self.select_transactions(|t| t.aid == *aid)
    }

    fn transactions_for_order(&self, oid: OrderId) -> StoreResult<Vec<Transaction>> {
        self.select_transactions(|t| t.fills(oid))
    }
}
