//! Engine integration tests
//!
//! Drives the public engine API end to end: submission, matching, settlement,
//! cancellation and portfolio queries against the in-memory store.

use std::sync::Arc;

use brokerage_clock::ManualClock;
use brokerage_engine::model::{Asset, AssetClass, AssetId, OrderId, OrderStatus, Side, UserId};
use brokerage_engine::{BrokerageEngine, EngineConfig, EngineError, MemoryStore, PriceBoard};
use brokerage_ports::LedgerStore;
use brokerage_risk::pending_cost;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const U1: UserId = UserId(1);
const U2: UserId = UserId(2);
const U3: UserId = UserId(3);

struct Harness {
    engine: BrokerageEngine,
    store: Arc<MemoryStore>,
    prices: Arc<PriceBoard>,
    clock: Arc<ManualClock>,
}

impl Harness {
    /// U1 has 10000 equity funds and nothing held.
    /// U2 has no funds and holds 20 INFY bought at 90.
    /// U3 has an empty account.
    async fn new(config: EngineConfig) -> Self {
        let _ = env_logger::try_init();

        let store = Arc::new(MemoryStore::new());
        let prices = Arc::new(PriceBoard::new());
        let clock = Arc::new(ManualClock::default());
        let engine = BrokerageEngine::new(config, store.clone(), prices.clone())
            .unwrap()
            .with_clock(clock.clone());

        engine
            .list_asset(Asset::new("INFY", "Infosys", AssetClass::Equity))
            .await
            .unwrap();
        engine
            .list_asset(Asset::new("TCS", "Tata Consultancy", AssetClass::Equity))
            .await
            .unwrap();
        engine
            .list_asset(Asset::new("GOLD", "Gold", AssetClass::Commodity))
            .await
            .unwrap();

        engine.open_account(U1, dec!(10000), dec!(0)).await.unwrap();
        engine.open_account(U2, dec!(0), dec!(0)).await.unwrap();
        engine.open_account(U3, dec!(0), dec!(0)).await.unwrap();
        engine.seed_holding(U2, "INFY", 20, dec!(90)).await.unwrap();

        Self {
            engine,
            store,
            prices,
            clock,
        }
    }

    async fn buy(&self, uid: UserId, aid: &str, qty: u64, price: Decimal) -> OrderId {
        self.engine
            .submit_order(uid, aid, qty, Side::Buy, Some(price))
            .await
            .unwrap()
    }

    async fn sell(&self, uid: UserId, aid: &str, qty: u64, price: Decimal) -> OrderId {
        self.engine
            .submit_order(uid, aid, qty, Side::Sell, Some(price))
            .await
            .unwrap()
    }

    async fn equity_funds(&self, uid: UserId) -> Decimal {
        self.engine.get_account(uid).await.unwrap().equity_funds
    }

    async fn held(&self, uid: UserId, aid: &str) -> u64 {
        self.store
            .holding(uid, &AssetId::new(aid))
            .unwrap()
            .map(|h| h.quantity)
            .unwrap_or(0)
    }

    async fn pending(&self, uid: UserId) -> Decimal {
        let orders = self.engine.get_orders(uid).await.unwrap();
        pending_cost(&orders)
    }

    fn tick(&self) {
        self.clock.advance(chrono::Duration::milliseconds(1));
    }
}

// ============================================================================
// Submission and settlement walkthrough
// ============================================================================

#[tokio::test]
async fn test_buy_then_two_partial_sells() {
    let h = Harness::new(EngineConfig::default()).await;

    // A: a resting Buy reserves margin, funds untouched
    let buy = h.buy(U1, "INFY", 10, dec!(100)).await;
    assert_eq!(h.pending(U1).await, dec!(1000));
    assert_eq!(h.equity_funds(U1).await, dec!(10000));
    let status = h.engine.get_margin_status(U1).await.unwrap();
    assert_eq!(status.available_margin_equity, dec!(109000));
    assert_eq!(status.pending_cost_equity, dec!(1000));
    assert_eq!(status.pending_cost_commodity, dec!(0));

    // B: half of it fills
    h.tick();
    h.sell(U2, "INFY", 5, dec!(100)).await;
    let txs = h.engine.get_transactions(U1).await.unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].executed_quantity, 5);
    assert_eq!(txs[0].executed_price, dec!(100));
    assert_eq!(h.equity_funds(U1).await, dec!(9500));
    assert_eq!(h.equity_funds(U2).await, dec!(500));
    let order = h.engine.get_order(buy).await.unwrap();
    assert_eq!(order.status, OrderStatus::PartiallyFilled);
    assert_eq!(order.remaining_quantity, 5);
    assert_eq!(h.pending(U1).await, dec!(500));
    let status = h.engine.get_margin_status(U1).await.unwrap();
    assert_eq!(status.pending_cost_equity, dec!(500));

    // C: the rest fills
    h.tick();
    h.sell(U2, "INFY", 5, dec!(100)).await;
    let order = h.engine.get_order(buy).await.unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.remaining_quantity, 0);
    assert_eq!(h.pending(U1).await, dec!(0));
    assert_eq!(h.equity_funds(U1).await, dec!(9000));
    assert_eq!(h.equity_funds(U2).await, dec!(1000));

    assert_eq!(h.held(U1, "INFY").await, 10);
    assert_eq!(h.held(U2, "INFY").await, 10);
    let status = h.engine.get_margin_status(U1).await.unwrap();
    assert_eq!(status.utilized_margin_equity, dec!(1000));
    assert_eq!(status.available_margin_equity, dec!(109000));
}

#[tokio::test]
async fn test_sell_without_holdings_is_rejected() {
    let h = Harness::new(EngineConfig::default()).await;

    let result = h
        .engine
        .submit_order(U3, "INFY", 1, Side::Sell, Some(dec!(100)))
        .await;
    assert!(matches!(
        result,
        Err(EngineError::InsufficientHoldings {
            requested: 1,
            available: 0
        })
    ));
    assert!(h.engine.get_orders(U3).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_open_sells_count_against_holdings() {
    let h = Harness::new(EngineConfig::default()).await;

    h.sell(U2, "INFY", 15, dec!(200)).await;
    let result = h
        .engine
        .submit_order(U2, "INFY", 6, Side::Sell, Some(dec!(200)))
        .await;
    assert!(matches!(
        result,
        Err(EngineError::InsufficientHoldings {
            requested: 6,
            available: 5
        })
    ));
    h.sell(U2, "INFY", 5, dec!(200)).await;
}

#[tokio::test]
async fn test_margin_never_negative_after_submit() {
    let config = EngineConfig::default().with_base_allowance(Decimal::ZERO);
    let h = Harness::new(config).await;

    h.buy(U1, "INFY", 100, dec!(100)).await;
    let status = h.engine.get_margin_status(U1).await.unwrap();
    assert_eq!(status.available_margin_equity, dec!(0));

    let result = h
        .engine
        .submit_order(U1, "TCS", 1, Side::Buy, Some(dec!(0.01)))
        .await;
    assert!(matches!(
        result,
        Err(EngineError::MarginExceeded { available, .. }) if available == dec!(0)
    ));
    assert_eq!(h.engine.get_orders(U1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_allowance_lets_funds_go_negative() {
    let h = Harness::new(EngineConfig::default()).await;

    // U3 has no funds, only the default allowance
    h.engine.seed_holding(U2, "TCS", 5, dec!(300)).await.unwrap();
    h.buy(U3, "TCS", 5, dec!(400)).await;
    h.tick();
    h.sell(U2, "TCS", 5, dec!(400)).await;

    assert_eq!(h.equity_funds(U3).await, dec!(-2000));
    let status = h.engine.get_margin_status(U3).await.unwrap();
    assert_eq!(status.available_margin_equity, dec!(98000));
    assert_eq!(status.utilized_margin_equity, dec!(2000));
}

#[tokio::test]
async fn test_zero_allowance_keeps_funds_non_negative() {
    let config = EngineConfig::default().with_base_allowance(Decimal::ZERO);
    let h = Harness::new(config).await;

    // U3 has nothing to pay with
    let result = h
        .engine
        .submit_order(U3, "INFY", 1, Side::Buy, Some(dec!(1)))
        .await;
    assert!(matches!(result, Err(EngineError::MarginExceeded { .. })));

    // U1 spends exactly everything
    h.buy(U1, "INFY", 20, dec!(500)).await;
    h.tick();
    h.sell(U2, "INFY", 20, dec!(500)).await;
    assert_eq!(h.equity_funds(U1).await, dec!(0));
    assert_eq!(h.equity_funds(U2).await, dec!(10000));
}

#[tokio::test]
async fn test_oversized_buy_is_rejected() {
    let h = Harness::new(EngineConfig::default()).await;

    // u64::MAX * 1e10 does not fit in a Decimal
    let result = h
        .engine
        .submit_order(U1, "INFY", u64::MAX, Side::Buy, Some(dec!(10000000000)))
        .await;
    assert!(matches!(
        result,
        Err(EngineError::MarginExceeded { required, available })
            if required == Decimal::MAX && available == dec!(110000)
    ));

    // Largest representable price, any quantity above one overflows
    let result = h
        .engine
        .submit_order(U1, "INFY", 2, Side::Buy, Some(Decimal::MAX))
        .await;
    assert!(matches!(result, Err(EngineError::MarginExceeded { .. })));

    assert!(h.engine.get_orders(U1).await.unwrap().is_empty());
    assert_eq!(h.pending(U1).await, dec!(0));
}

#[tokio::test]
async fn test_oversized_seed_holding_is_rejected() {
    let h = Harness::new(EngineConfig::default()).await;

    let result = h.engine.seed_holding(U2, "INFY", u64::MAX, dec!(1)).await;
    assert!(matches!(result, Err(EngineError::AmountOutOfRange(_))));
    assert_eq!(h.held(U2, "INFY").await, 20);
}

#[tokio::test]
async fn test_self_match_keeps_holding_cost() {
    let h = Harness::new(EngineConfig::default()).await;

    h.sell(U2, "INFY", 4, dec!(120)).await;
    h.tick();
    h.buy(U2, "INFY", 4, dec!(120)).await;

    let txs = h.engine.get_transactions(U2).await.unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].buy_uid, txs[0].sell_uid);
    assert_eq!(h.equity_funds(U2).await, dec!(0));

    let holding = h
        .store
        .holding(U2, &AssetId::new("INFY"))
        .unwrap()
        .unwrap();
    assert_eq!(holding.quantity, 20);
    assert_eq!(holding.avg_buy_price, dec!(90));
    let status = h.engine.get_margin_status(U2).await.unwrap();
    assert_eq!(status.utilized_margin_equity, dec!(1800));
}

// ============================================================================
// Matching rules
// ============================================================================

#[tokio::test]
async fn test_execution_at_resting_price() {
    let h = Harness::new(EngineConfig::default()).await;

    // Resting sell at 90, aggressive buy at 100: trades at 90
    h.sell(U2, "INFY", 5, dec!(90)).await;
    h.tick();
    h.buy(U1, "INFY", 5, dec!(100)).await;
    assert_eq!(h.equity_funds(U1).await, dec!(9550));

    // Resting buy at 100, aggressive sell at 90: trades at 100
    h.tick();
    h.buy(U1, "INFY", 5, dec!(100)).await;
    h.tick();
    h.sell(U2, "INFY", 5, dec!(90)).await;
    assert_eq!(h.equity_funds(U1).await, dec!(9050));

    let prices: Vec<_> = h
        .engine
        .get_asset_transactions(&AssetId::new("INFY"))
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.executed_price)
        .collect();
    assert_eq!(prices, vec![dec!(90), dec!(100)]);
}

#[tokio::test]
async fn test_best_price_then_oldest_first() {
    let config = EngineConfig::default().with_match_on_submit(false);
    let h = Harness::new(config).await;
    h.engine.seed_holding(U3, "INFY", 10, dec!(50)).await.unwrap();

    let expensive = h.sell(U2, "INFY", 4, dec!(105)).await;
    let early_cheap = h.sell(U2, "INFY", 4, dec!(101)).await;
    let late_cheap = h.sell(U3, "INFY", 4, dec!(101)).await;
    h.buy(U1, "INFY", 6, dec!(110)).await;

    let report = h
        .engine
        .run_matching_pass(&AssetId::new("INFY"))
        .await
        .unwrap();
    assert_eq!(report.match_count(), 2);
    assert_eq!(report.transactions[0].sell_order_id, early_cheap);
    assert_eq!(report.transactions[0].executed_quantity, 4);
    assert_eq!(report.transactions[1].sell_order_id, late_cheap);
    assert_eq!(report.transactions[1].executed_quantity, 2);

    let untouched = h.engine.get_order(expensive).await.unwrap();
    assert_eq!(untouched.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_pass_is_idempotent() {
    let config = EngineConfig::default().with_match_on_submit(false);
    let h = Harness::new(config).await;
    let aid = AssetId::new("INFY");

    h.buy(U1, "INFY", 8, dec!(100)).await;
    h.sell(U2, "INFY", 5, dec!(95)).await;

    let first = h.engine.run_matching_pass(&aid).await.unwrap();
    assert_eq!(first.match_count(), 1);
    let funds = h.equity_funds(U1).await;

    let second = h.engine.run_matching_pass(&aid).await.unwrap();
    assert!(second.is_empty());
    assert_eq!(h.store.transaction_count().unwrap(), 1);
    assert_eq!(h.equity_funds(U1).await, funds);
}

#[tokio::test]
async fn test_no_cross_no_match() {
    let h = Harness::new(EngineConfig::default()).await;
    h.buy(U1, "INFY", 5, dec!(99)).await;
    h.sell(U2, "INFY", 5, dec!(100)).await;
    assert_eq!(h.store.transaction_count().unwrap(), 0);
}

#[tokio::test]
async fn test_pass_cap_leaves_rest_for_next_pass() {
    let config = EngineConfig::default()
        .with_match_on_submit(false)
        .with_max_matches_per_pass(1);
    let h = Harness::new(config).await;
    let aid = AssetId::new("INFY");

    h.sell(U2, "INFY", 3, dec!(100)).await;
    h.sell(U2, "INFY", 3, dec!(100)).await;
    h.buy(U1, "INFY", 6, dec!(100)).await;

    assert_eq!(h.engine.run_matching_pass(&aid).await.unwrap().match_count(), 1);
    assert_eq!(h.engine.run_matching_pass(&aid).await.unwrap().match_count(), 1);
    assert!(h.engine.run_matching_pass(&aid).await.unwrap().is_empty());
    assert_eq!(h.held(U1, "INFY").await, 6);
}

#[tokio::test]
async fn test_matching_all_covers_every_book() {
    let config = EngineConfig::default().with_match_on_submit(false);
    let h = Harness::new(config).await;
    h.engine.seed_holding(U2, "GOLD", 2, dec!(6000)).await.unwrap();
    h.engine.seed_holding(U2, "TCS", 2, dec!(300)).await.unwrap();

    h.buy(U1, "INFY", 1, dec!(100)).await;
    h.sell(U2, "INFY", 1, dec!(100)).await;
    h.buy(U1, "GOLD", 1, dec!(6100)).await;
    h.sell(U2, "GOLD", 1, dec!(6100)).await;
    // Does not cross
    h.sell(U2, "TCS", 1, dec!(400)).await;

    let reports = h.engine.run_matching_all().await.unwrap();
    let matched: usize = reports.iter().map(|r| r.match_count()).sum();
    assert_eq!(matched, 2);

    let account = h.engine.get_account(U1).await.unwrap();
    assert_eq!(account.equity_funds, dec!(9900));
    assert_eq!(account.commodity_funds, dec!(-6100));
    let account = h.engine.get_account(U2).await.unwrap();
    assert_eq!(account.commodity_funds, dec!(6100));
}

// ============================================================================
// Bookkeeping invariants
// ============================================================================

#[tokio::test]
async fn test_remaining_matches_executed_and_value_is_conserved() {
    let h = Harness::new(EngineConfig::default()).await;
    h.engine.seed_holding(U3, "INFY", 7, dec!(80)).await.unwrap();

    let mut orders = vec![
        h.buy(U1, "INFY", 6, dec!(102)).await,
        h.sell(U2, "INFY", 4, dec!(101)).await,
        h.sell(U3, "INFY", 7, dec!(100)).await,
        h.buy(U1, "INFY", 9, dec!(101)).await,
        h.sell(U2, "INFY", 3, dec!(99)).await,
    ];
    orders.push(h.buy(U3, "INFY", 2, dec!(103)).await);

    for oid in orders {
        let order = h.engine.get_order(oid).await.unwrap();
        let executed: u64 = h
            .store
            .transactions_for_order(oid)
            .unwrap()
            .iter()
            .map(|t| t.executed_quantity)
            .sum();
        assert_eq!(order.remaining_quantity, order.quantity - executed);
        assert_eq!(order.status == OrderStatus::Completed, order.remaining_quantity == 0);
    }

    let mut total_funds = Decimal::ZERO;
    let mut total_held = 0;
    for uid in [U1, U2, U3] {
        total_funds += h.equity_funds(uid).await;
        total_held += h.held(uid, "INFY").await;
    }
    assert_eq!(total_funds, dec!(10000));
    assert_eq!(total_held, 27);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_releases_margin_but_not_funds() {
    let h = Harness::new(EngineConfig::default()).await;

    let buy = h.buy(U1, "INFY", 10, dec!(100)).await;
    h.sell(U2, "INFY", 4, dec!(100)).await;
    let before = h.engine.get_margin_status(U1).await.unwrap();

    h.engine.cancel_order(buy).await.unwrap();

    let order = h.engine.get_order(buy).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.remaining_quantity, 6);
    assert_eq!(h.pending(U1).await, dec!(0));
    assert_eq!(h.equity_funds(U1).await, dec!(9600));

    let after = h.engine.get_margin_status(U1).await.unwrap();
    assert_eq!(
        after.available_margin_equity - before.available_margin_equity,
        dec!(600)
    );

    // A cancelled order no longer matches
    h.sell(U2, "INFY", 4, dec!(100)).await;
    assert_eq!(h.store.transaction_count().unwrap(), 1);
}

#[tokio::test]
async fn test_cancel_terminal_or_unknown_order() {
    let h = Harness::new(EngineConfig::default()).await;

    let buy = h.buy(U1, "INFY", 2, dec!(100)).await;
    h.sell(U2, "INFY", 2, dec!(100)).await;
    assert!(matches!(
        h.engine.cancel_order(buy).await,
        Err(EngineError::InvalidState(_))
    ));

    let sell = h.sell(U2, "INFY", 2, dec!(500)).await;
    h.engine.cancel_order(sell).await.unwrap();
    assert!(matches!(
        h.engine.cancel_order(sell).await,
        Err(EngineError::InvalidState(_))
    ));

    assert!(matches!(
        h.engine.cancel_order(uuid::Uuid::new_v4()).await,
        Err(EngineError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_cancelled_sell_frees_holdings() {
    let h = Harness::new(EngineConfig::default()).await;

    let sell = h.sell(U2, "INFY", 20, dec!(500)).await;
    assert!(
        h.engine
            .submit_order(U2, "INFY", 1, Side::Sell, Some(dec!(500)))
            .await
            .is_err()
    );
    h.engine.cancel_order(sell).await.unwrap();
    h.sell(U2, "INFY", 20, dec!(500)).await;
}

// ============================================================================
// Portfolio queries
// ============================================================================

#[tokio::test]
async fn test_holdings_and_portfolio_valuation() {
    let h = Harness::new(EngineConfig::default()).await;
    h.engine.seed_holding(U2, "GOLD", 1, dec!(6000)).await.unwrap();

    h.prices.record_price("INFY", dec!(99));
    let views = h.engine.get_holdings(U2).await.unwrap();
    assert_eq!(views.len(), 2);

    let gold = views.iter().find(|v| v.aid == AssetId::new("GOLD")).unwrap();
    assert_eq!(gold.current_price, None);
    assert_eq!(gold.current_value, None);

    let infy = views.iter().find(|v| v.aid == AssetId::new("INFY")).unwrap();
    assert_eq!(infy.current_value, Some(dec!(1980)));
    assert_eq!(infy.profit, Some(dec!(180)));
    assert_eq!(infy.profit_percentage, Some(dec!(10)));

    // Unpriced gold counts at cost
    let summary = h.engine.get_portfolio_summary(U2).await.unwrap();
    assert_eq!(summary.total_cost, dec!(7800));
    assert_eq!(summary.total_value, dec!(7980));
    assert_eq!(summary.total_profit, dec!(180));
    assert_eq!(summary.total_equity_value, dec!(1980));
    assert_eq!(summary.total_commodity_value, dec!(6000));

    let empty = h.engine.get_portfolio_summary(U3).await.unwrap();
    assert_eq!(empty.total_value, dec!(0));
    assert_eq!(empty.total_profit_percentage, dec!(0));
}

#[tokio::test]
async fn test_sold_out_holding_is_hidden() {
    let h = Harness::new(EngineConfig::default()).await;
    h.buy(U1, "INFY", 20, dec!(100)).await;
    h.sell(U2, "INFY", 20, dec!(100)).await;

    assert!(h.engine.get_holdings(U2).await.unwrap().is_empty());
    assert_eq!(h.engine.get_holdings(U1).await.unwrap()[0].quantity, 20);
}

#[tokio::test]
async fn test_engine_from_json_config() {
    let config = EngineConfig::from_json(r#"{ "base_allowance": "0", "match_on_submit": false }"#)
        .unwrap();
    let h = Harness::new(config).await;

    let result = h
        .engine
        .submit_order(U1, "INFY", 101, Side::Buy, Some(dec!(100)))
        .await;
    assert!(matches!(result, Err(EngineError::MarginExceeded { .. })));

    h.buy(U1, "INFY", 1, dec!(100)).await;
    h.sell(U2, "INFY", 1, dec!(100)).await;
    assert_eq!(h.store.transaction_count().unwrap(), 0);
}
