use brokerage_core::{Account, AssetId, Holding, Order, Transaction, UserId};
use brokerage_ports::{LedgerStore, StoreError, StoreResult};
use log::{error, warn};

/// A record write staged in a batch
#[derive(Debug, Clone)]
enum Write {
    Account(Account),
    Order(Order),
    Holding(Holding),
}

/// What a write replaced, so it can be put back
#[derive(Debug)]
enum Undo {
    Account(Account),
    Order(Order),
    Holding {
        uid: UserId,
        aid: AssetId,
        previous: Option<Holding>,
    },
}

/// All-or-nothing group of store writes
///
/// Writes are applied in staging order, then the transaction records are
/// appended last. If any step fails, every write already applied is restored
/// to its previous value in reverse order, and the original error is returned.
/// Because the log is appended last, a failed batch never leaves a transaction
/// behind.
#[derive(Debug, Default)]
pub struct WriteBatch {
    writes: Vec<Write>,
    transactions: Vec<Transaction>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_account(&mut self, account: Account) -> &mut Self {
        self.writes.push(Write::Account(account));
        self
    }

    pub fn put_order(&mut self, order: Order) -> &mut Self {
        self.writes.push(Write::Order(order));
        self
    }

    pub fn put_holding(&mut self, holding: Holding) -> &mut Self {
        self.writes.push(Write::Holding(holding));
        self
    }

    pub fn append_transaction(&mut self, transaction: Transaction) -> &mut Self {
        self.transactions.push(transaction);
        self
    }

    /// Number of staged operations
    pub fn len(&self) -> usize {
        self.writes.len() + self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply the batch to `store`
    pub fn commit(self, store: &dyn LedgerStore) -> StoreResult<()> {
        let mut applied: Vec<Undo> = Vec::with_capacity(self.writes.len());

        for write in self.writes {
            match Self::apply(store, write) {
                Ok(undo) => applied.push(undo),
                Err(err) => {
                    Self::rollback(store, applied);
                    return Err(err);
                }
            }
        }

        let count = self.transactions.len();
        for (appended, transaction) in self.transactions.into_iter().enumerate() {
            if let Err(err) = store.append_transaction(transaction) {
                if appended > 0 {
                    // The log has no delete; a multi-transaction batch that
                    // fails halfway cannot be fully undone
                    error!(
                        "Transaction log append failed after {} of {} records: {}",
                        appended, count, err
                    );
                }
                Self::rollback(store, applied);
                return Err(err);
            }
        }

        Ok(())
    }

    /// Capture the current value of the record, then overwrite it
    fn apply(store: &dyn LedgerStore, write: Write) -> StoreResult<Undo> {
        match write {
            Write::Account(account) => {
                let previous = store.account(account.uid)?.ok_or_else(|| {
                    StoreError::Unavailable(format!("account {} vanished", account.uid))
                })?;
                store.put_account(account)?;
                Ok(Undo::Account(previous))
            }
            Write::Order(order) => {
                let previous = store.order(order.id)?.ok_or_else(|| {
                    StoreError::Unavailable(format!("order {} vanished", order.id))
                })?;
                store.put_order(order)?;
                Ok(Undo::Order(previous))
            }
            Write::Holding(holding) => {
                let uid = holding.uid;
                let aid = holding.aid.clone();
                let previous = store.holding(uid, &aid)?;
                store.put_holding(holding)?;
                Ok(Undo::Holding { uid, aid, previous })
            }
        }
    }

    fn rollback(store: &dyn LedgerStore, applied: Vec<Undo>) {
        warn!("Rolling back {} applied writes", applied.len());

        for undo in applied.into_iter().rev() {
            let restored = match undo {
                Undo::Account(account) => store.put_account(account),
                Undo::Order(order) => store.put_order(order),
                Undo::Holding {
                    previous: Some(holding),
                    ..
                } => store.put_holding(holding),
                Undo::Holding {
                    uid,
                    aid,
                    previous: None,
                } => store.remove_holding(uid, &aid),
            };
            if let Err(err) = restored {
                error!("Rollback write failed, store may be inconsistent: {}", err);
            }
        }
    }
}
