use brokerage_clock::SystemClock;
use brokerage_core::{
    Account, Asset, AssetClass, AssetId, Holding, Order, OrderId, Price, Quantity, Side,
    Transaction, UserId,
};
use brokerage_matching::PriceTimeMatchingEngine;
use brokerage_ports::{Clock, Fill, LedgerStore, MatchingAlgorithm, PriceOracle};
use brokerage_risk::{ExposureSnapshot, MarginCalculator, MarginStatus};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;

use super::settlement::{SettlementContext, settle};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::infrastructure::KeyedLocks;
use crate::model::{HoldingView, MatchReport, PortfolioSummary, percentage};

/// Shortest period `spawn_matching_timer` accepts
const MIN_TIMER_PERIOD: Duration = Duration::from_millis(1);

/// Facade over order intake, matching, settlement and portfolio queries
///
/// Lock order is always asset before users, and users in ascending id order.
/// `submit_order` drops its user lock before it triggers a matching pass.
pub struct BrokerageEngine {
    config: EngineConfig,

    /// Persisted accounts, assets, orders, holdings and transactions
    store: Arc<dyn LedgerStore>,

    /// Reference prices for unpriced orders and holding valuation
    oracle: Arc<dyn PriceOracle>,

    /// Source of order and settlement timestamps
    clock: Arc<dyn Clock>,

    matcher: Arc<dyn MatchingAlgorithm>,
    margin: MarginCalculator,

    /// Serialises margin check + insert per user, and settlement per party
    user_locks: KeyedLocks<UserId>,

    /// Serialises matching passes and cancellations per asset
    asset_locks: KeyedLocks<AssetId>,

    /// Submission counter breaking ties between equal timestamps
    sequence: AtomicU64,
}

impl BrokerageEngine {
    /// Create an engine with the wall clock and price-time matching
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn LedgerStore>,
        oracle: Arc<dyn PriceOracle>,
    ) -> Result<Self> {
        config.validate()?;
        let margin = MarginCalculator::new(config.base_allowance);

        info!(
            "Brokerage engine created: base_allowance={}, match_on_submit={}",
            config.base_allowance, config.match_on_submit
        );

        Ok(Self {
            config,
            store,
            oracle,
            clock: Arc::new(SystemClock::new()),
            matcher: Arc::new(PriceTimeMatchingEngine::new()),
            margin,
            user_locks: KeyedLocks::new(),
            asset_locks: KeyedLocks::new(),
            sequence: AtomicU64::new(0),
        })
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        debug!("Using clock {}", clock.name());
        self.clock = clock;
        self
    }

    /// Replace the matching algorithm
    pub fn with_matching_algorithm(mut self, matcher: Arc<dyn MatchingAlgorithm>) -> Self {
        debug!("Using matching algorithm {}", matcher.name());
        self.matcher = matcher;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    // Registration

    /// Open an account with starting funds in each pool
    pub async fn open_account(
        &self,
        uid: UserId,
        equity_funds: Decimal,
        commodity_funds: Decimal,
    ) -> Result<Account> {
        for amount in [equity_funds, commodity_funds] {
            if amount < Decimal::ZERO {
                return Err(EngineError::InvalidAmount(amount));
            }
        }

        let account = Account::new_with_time(uid, equity_funds, commodity_funds, self.clock.now());
        self.store.insert_account(account.clone())?;

        info!(
            "Account opened: uid={}, equity_funds={}, commodity_funds={}",
            uid, equity_funds, commodity_funds
        );
        Ok(account)
    }

    /// Make an asset tradable
    pub async fn list_asset(&self, asset: Asset) -> Result<()> {
        let (aid, class) = (asset.id.clone(), asset.class);
        self.store.insert_asset(asset)?;
        info!("Asset listed: aid={}, class={}", aid, class);
        Ok(())
    }

    /// Credit a position acquired outside the engine (opening portfolio)
    ///
    /// Merges into an existing holding at the weighted average price.
    pub async fn seed_holding(
        &self,
        uid: UserId,
        aid: impl Into<AssetId>,
        quantity: Quantity,
        avg_buy_price: Price,
    ) -> Result<Holding> {
        let aid = aid.into();
        if quantity == 0 {
            return Err(EngineError::InvalidQuantity);
        }
        if avg_buy_price <= Decimal::ZERO {
            return Err(EngineError::InvalidPrice(avg_buy_price));
        }
        self.listed_asset(&aid)?;

        let _user = self.user_locks.lock(&uid).await;
        self.require_account(uid)?;

        let now = self.clock.now();
        let mut holding = self
            .store
            .holding(uid, &aid)?
            .unwrap_or_else(|| Holding::empty(uid, aid.clone(), now));
        if holding.acquire(quantity, avg_buy_price, now).is_none() {
            return Err(EngineError::AmountOutOfRange(format!(
                "holding of user {} in {} plus {} @ {}",
                uid, aid, quantity, avg_buy_price
            )));
        }
        self.store.put_holding(holding.clone())?;

        info!(
            "Holding seeded: uid={}, aid={}, quantity={}, avg_buy_price={}",
            uid, aid, holding.quantity, holding.avg_buy_price
        );
        Ok(holding)
    }

    // Order intake

    /// Validate, margin-check and rest a limit order
    ///
    /// Without an explicit `limit_price` the oracle's current price is used.
    /// When `match_on_submit` is set a matching pass on the asset follows; a
    /// failure there is logged and does not undo the accepted order.
    pub async fn submit_order(
        &self,
        uid: UserId,
        aid: impl Into<AssetId>,
        quantity: Quantity,
        side: Side,
        limit_price: Option<Price>,
    ) -> Result<OrderId> {
        let aid = aid.into();
        if quantity == 0 {
            return Err(EngineError::InvalidQuantity);
        }
        let asset = self.store.asset(&aid)?.ok_or_else(|| EngineError::InvalidAsset {
            aid: aid.clone(),
            reason: "not listed".to_string(),
        })?;
        let limit_price = match limit_price {
            Some(price) => price,
            None => self
                .oracle
                .current_price(&aid)
                .ok_or_else(|| EngineError::InvalidAsset {
                    aid: aid.clone(),
                    reason: "no reference price".to_string(),
                })?,
        };
        if limit_price <= Decimal::ZERO {
            return Err(EngineError::InvalidPrice(limit_price));
        }

        let order = {
            let _user = self.user_locks.lock(&uid).await;

            if let Err(err) = self.check_order(uid, &asset, side, quantity, limit_price) {
                warn!(
                    "Order rejected: uid={}, aid={}, side={}, qty={}, price={}: {}",
                    uid, aid, side, quantity, limit_price, err
                );
                return Err(err);
            }

            let order = Order::new_with_time(
                uid,
                aid.clone(),
                side,
                quantity,
                limit_price,
                self.next_sequence(),
                self.clock.now(),
            );
            self.store.put_order(order.clone())?;
            order
        };

        info!(
            "Order accepted: id={}, uid={}, aid={}, side={}, qty={}, price={}",
            order.id, uid, aid, side, quantity, limit_price
        );

        if self.config.match_on_submit {
            if let Err(err) = self.run_matching_pass(&aid).await {
                warn!("Matching after order {} failed: {}", order.id, err);
            }
        }

        Ok(order.id)
    }

    /// Margin check for Buys, deliverable-quantity check for Sells
    ///
    /// Must run under the user's lock.
    fn check_order(
        &self,
        uid: UserId,
        asset: &Asset,
        side: Side,
        quantity: Quantity,
        limit_price: Price,
    ) -> Result<()> {
        let account = self.require_account(uid)?;
        let orders = self.store.orders_for_user(uid)?;

        match side {
            Side::Buy => {
                let holdings = self.store.holdings_for_user(uid)?;
                let classes = self.asset_classes()?;
                let snapshot = exposure(&account, asset.class, &orders, &holdings, &classes);
                self.margin.check_buy(&snapshot, quantity, limit_price)?;
            }
            Side::Sell => {
                let held = self
                    .store
                    .holding(uid, &asset.id)?
                    .map(|h| h.quantity)
                    .unwrap_or(0);
                let committed = MarginCalculator::committed_sell_quantity(
                    orders.iter().filter(|o| o.aid == asset.id),
                );
                self.margin.check_sell(held, committed, quantity)?;
            }
        }
        Ok(())
    }

    /// Withdraw an open order from its book
    ///
    /// Funds are not touched; the order simply stops counting towards
    /// pending cost.
    pub async fn cancel_order(&self, oid: OrderId) -> Result<()> {
        let aid = self.load_order(oid)?.aid;
        let _book = self.asset_locks.lock(&aid).await;

        // Re-read: a pass may have filled it while we waited
        let mut order = self.load_order(oid)?;
        order.cancel(self.clock.now())?;
        self.store.put_order(order.clone())?;

        info!(
            "Order cancelled: id={}, uid={}, aid={}, unfilled={}",
            oid, order.uid, aid, order.remaining_quantity
        );
        Ok(())
    }

    // Matching

    /// Match and settle crossing orders on one asset until none remain
    ///
    /// Each match is settled atomically. If a settlement fails it is rolled
    /// back and the pass stops with the error; matches settled before it
    /// stay. Running the pass again resumes where it stopped.
    pub async fn run_matching_pass(&self, aid: &AssetId) -> Result<MatchReport> {
        let asset = self.listed_asset(aid)?;
        let _book = self.asset_locks.lock(aid).await;

        let open = self.store.open_orders(aid)?;
        let mut fills = self.matcher.plan_pass(&open)?;
        if let Some(limit) = self.config.max_matches_per_pass {
            if fills.len() > limit {
                debug!(
                    "Pass on {} capped at {} of {} planned matches",
                    aid,
                    limit,
                    fills.len()
                );
                fills.truncate(limit);
            }
        }

        let mut report = MatchReport::new(aid.clone());
        for fill in &fills {
            let transaction = self.settle_fill(asset.class, fill).await?;
            report.transactions.push(transaction);
        }

        if !report.is_empty() {
            info!(
                "Matching pass on {}: matches={}, quantity={}, notional={}",
                aid,
                report.match_count(),
                report.matched_quantity(),
                report.notional()
            );
        }
        Ok(report)
    }

    /// One pass per asset that has open orders
    ///
    /// A failing asset is logged and skipped so the others still match.
    pub async fn run_matching_all(&self) -> Result<Vec<MatchReport>> {
        let mut reports = Vec::new();
        for aid in self.store.assets_with_open_orders()? {
            match self.run_matching_pass(&aid).await {
                Ok(report) => reports.push(report),
                Err(err) => error!("Matching pass on {} failed: {}", aid, err),
            }
        }
        Ok(reports)
    }

    /// Settle one fill under both parties' locks
    async fn settle_fill(&self, class: AssetClass, fill: &Fill) -> Result<Transaction> {
        let buy_order = self.load_order(fill.buy_order_id)?;
        let sell_order = self.load_order(fill.sell_order_id)?;
        let aid = buy_order.aid.clone();
        let parties = [buy_order.uid, sell_order.uid];

        let _users = self.user_locks.lock_all(&parties).await;

        let mut accounts = BTreeMap::new();
        let mut holdings = BTreeMap::new();
        for uid in parties {
            if accounts.contains_key(&uid) {
                continue;
            }
            if let Some(account) = self.store.account(uid)? {
                accounts.insert(uid, account);
            }
            if let Some(holding) = self.store.holding(uid, &aid)? {
                holdings.insert(uid, holding);
            }
        }

        let context = SettlementContext {
            class,
            buy_order,
            sell_order,
            accounts,
            holdings,
        };
        let settlement = settle(context, fill, self.clock.now())?;
        let transaction = settlement.transaction.clone();

        if let Err(err) = settlement.into_batch().commit(self.store.as_ref()) {
            warn!(
                "Settlement of {} x {} @ {} on {} rolled back: {}",
                fill.buy_order_id, fill.sell_order_id, fill.price, aid, err
            );
            return Err(err.into());
        }

        debug!(
            "Settled: tx={}, aid={}, buyer={}, seller={}, qty={}, price={}",
            transaction.id,
            aid,
            transaction.buy_uid,
            transaction.sell_uid,
            transaction.executed_quantity,
            transaction.executed_price
        );
        Ok(transaction)
    }

    /// Run `run_matching_all` every `period` on a background task
    ///
    /// A zero period is raised to 1ms. The task ends on its own once the
    /// engine is dropped; abort the handle to stop it sooner.
    pub fn spawn_matching_timer(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let engine = Arc::downgrade(self);
        let period = period.max(MIN_TIMER_PERIOD);

        tokio::spawn(async move {
            info!("Starting matching timer with period {:?}", period);
            let mut ticker = interval(period);

            loop {
                ticker.tick().await;
                let Some(engine) = engine.upgrade() else {
                    debug!("Engine dropped, stopping matching timer");
                    break;
                };
                match engine.run_matching_all().await {
                    Ok(reports) => {
                        let matches: usize = reports.iter().map(MatchReport::match_count).sum();
                        if matches > 0 {
                            debug!("Timer pass settled {} matches", matches);
                        }
                    }
                    Err(err) => error!("Timer matching pass failed: {}", err),
                }
            }
        })
    }

    /// Start the timer if `matching_interval_ms` is configured
    pub fn start_configured_timer(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        self.config
            .matching_interval()
            .map(|period| self.spawn_matching_timer(period))
    }

    // Queries

    pub async fn get_margin_status(&self, uid: UserId) -> Result<MarginStatus> {
        let _user = self.user_locks.lock(&uid).await;

        let account = self.require_account(uid)?;
        let orders = self.store.orders_for_user(uid)?;
        let holdings = self.store.holdings_for_user(uid)?;
        let classes = self.asset_classes()?;

        let equity = exposure(&account, AssetClass::Equity, &orders, &holdings, &classes);
        let commodity = exposure(&account, AssetClass::Commodity, &orders, &holdings, &classes);
        Ok(self.margin.status(&equity, &commodity))
    }

    /// Non-empty holdings valued at the oracle price
    pub async fn get_holdings(&self, uid: UserId) -> Result<Vec<HoldingView>> {
        self.require_account(uid)?;

        let mut views = Vec::new();
        for holding in self.store.holdings_for_user(uid)? {
            if holding.is_empty() {
                continue;
            }
            let asset = self.listed_asset(&holding.aid)?;
            let current_price = self.oracle.current_price(&holding.aid);
            let cost = holding.cost_basis();
            let current_value = current_price.map(|p| holding.market_value(p));
            let profit = current_price.map(|p| holding.unrealized_pnl(p));

            views.push(HoldingView {
                aid: holding.aid,
                name: asset.name,
                class: asset.class,
                quantity: holding.quantity,
                avg_buy_price: holding.avg_buy_price,
                current_price,
                current_value,
                profit,
                profit_percentage: profit.map(|p| percentage(p, cost)),
            });
        }
        Ok(views)
    }

    pub async fn get_portfolio_summary(&self, uid: UserId) -> Result<PortfolioSummary> {
        let holdings = self.get_holdings(uid).await?;

        let mut summary = PortfolioSummary {
            total_value: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            total_profit_percentage: Decimal::ZERO,
            total_equity_value: Decimal::ZERO,
            total_commodity_value: Decimal::ZERO,
        };
        for view in &holdings {
            let cost = Decimal::from(view.quantity).saturating_mul(view.avg_buy_price);
            let value = view.current_value.unwrap_or(cost);
            summary.total_cost = summary.total_cost.saturating_add(cost);
            summary.total_value = summary.total_value.saturating_add(value);
            let class_value = match view.class {
                AssetClass::Equity => &mut summary.total_equity_value,
                AssetClass::Commodity => &mut summary.total_commodity_value,
            };
            *class_value = class_value.saturating_add(value);
        }
        summary.total_profit = summary.total_value.saturating_sub(summary.total_cost);
        summary.total_profit_percentage = percentage(summary.total_profit, summary.total_cost);
        Ok(summary)
    }

    pub async fn get_account(&self, uid: UserId) -> Result<Account> {
        self.require_account(uid)
    }

    /// Every order the user placed, newest first
    pub async fn get_orders(&self, uid: UserId) -> Result<Vec<Order>> {
        self.require_account(uid)?;
        let mut orders = self.store.orders_for_user(uid)?;
        orders.reverse();
        Ok(orders)
    }

    pub async fn get_order(&self, oid: OrderId) -> Result<Order> {
        self.load_order(oid)
    }

    /// Transactions where the user bought or sold, oldest first
    pub async fn get_transactions(&self, uid: UserId) -> Result<Vec<Transaction>> {
        self.require_account(uid)?;
        Ok(self.store.transactions_for_user(uid)?)
    }

    pub async fn get_asset_transactions(&self, aid: &AssetId) -> Result<Vec<Transaction>> {
        self.listed_asset(aid)?;
        Ok(self.store.transactions_for_asset(aid)?)
    }

    // Helpers

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn require_account(&self, uid: UserId) -> Result<Account> {
        self.store
            .account(uid)?
            .ok_or_else(|| EngineError::not_found("Account", uid))
    }

    fn listed_asset(&self, aid: &AssetId) -> Result<Asset> {
        self.store
            .asset(aid)?
            .ok_or_else(|| EngineError::not_found("Asset", aid))
    }

    fn load_order(&self, oid: OrderId) -> Result<Order> {
        self.store
            .order(oid)?
            .ok_or_else(|| EngineError::not_found("Order", oid))
    }

    fn asset_classes(&self) -> Result<HashMap<AssetId, AssetClass>> {
        Ok(self
            .store
            .assets()?
            .into_iter()
            .map(|asset| (asset.id, asset.class))
            .collect())
    }
}

/// A user's exposure restricted to one asset class
fn exposure(
    account: &Account,
    class: AssetClass,
    orders: &[Order],
    holdings: &[Holding],
    classes: &HashMap<AssetId, AssetClass>,
) -> ExposureSnapshot {
    let in_class = |aid: &AssetId| classes.get(aid) == Some(&class);
    ExposureSnapshot::collect(
        class,
        account.funds(class),
        orders.iter().filter(|o| in_class(&o.aid)),
        holdings.iter().filter(|h| in_class(&h.aid)),
    )
}
