use std::cmp::Reverse;
use std::collections::HashMap;

use brokerage_core::{Order, OrderId, Quantity, Side, Timestamp};
use brokerage_ports::{Fill, MatchingAlgorithm, MatchingError, MatchingResult};
use priority_queue::PriorityQueue;
use rust_decimal::Decimal;

/// Earlier submissions rank higher
type TimePriority = Reverse<(Timestamp, u64)>;

/// Standard price-time priority matching engine (FIFO)
///
/// Orders are matched based on:
/// 1. Best price (highest bid, lowest ask)
/// 2. Time priority (first in, first out at same price)
///
/// A matched pair executes at the limit price of whichever order was
/// submitted first (the resting order).
pub struct PriceTimeMatchingEngine;

impl PriceTimeMatchingEngine {
    pub fn new() -> Self {
        Self
    }

    fn time_priority(order: &Order) -> TimePriority {
        Reverse((order.created_at, order.sequence))
    }
}

impl Default for PriceTimeMatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingAlgorithm for PriceTimeMatchingEngine {
    fn name(&self) -> &str {
        "Price-Time Priority"
    }

    fn can_match(&self, buy_order: &Order, sell_order: &Order) -> bool {
        // Must be same asset
        if buy_order.aid != sell_order.aid {
            return false;
        }

        // Must be opposite sides
        if buy_order.side != Side::Buy || sell_order.side != Side::Sell {
            return false;
        }

        // Both must still be resting with something left
        if !buy_order.is_open() || !sell_order.is_open() {
            return false;
        }

        // Price must cross
        buy_order.limit_price >= sell_order.limit_price
    }

    fn match_orders(
        &self,
        buy_order: &Order,
        sell_order: &Order,
    ) -> MatchingResult<(Fill, Quantity, Quantity)> {
        if !self.can_match(buy_order, sell_order) {
            return Err(MatchingError::CannotMatch(format!(
                "buy {} @ {} vs sell {} @ {}",
                buy_order.id, buy_order.limit_price, sell_order.id, sell_order.limit_price
            )));
        }

        let match_qty = buy_order
            .remaining_quantity
            .min(sell_order.remaining_quantity);

        if match_qty == 0 {
            return Err(MatchingError::NoQuantity);
        }

        // Resting order (older) sets the price
        let match_price = if buy_order.precedes(sell_order) {
            buy_order.limit_price
        } else {
            sell_order.limit_price
        };

        let fill = Fill {
            buy_order_id: buy_order.id,
            sell_order_id: sell_order.id,
            price: match_price,
            quantity: match_qty,
        };

        Ok((
            fill,
            buy_order.remaining_quantity - match_qty,
            sell_order.remaining_quantity - match_qty,
        ))
    }

    fn plan_pass(&self, orders: &[Order]) -> MatchingResult<Vec<Fill>> {
        let Some(first) = orders.first() else {
            return Ok(Vec::new());
        };
        if let Some(stray) = orders.iter().find(|o| o.aid != first.aid) {
            return Err(MatchingError::MixedBook(format!(
                "{} and {}",
                first.aid, stray.aid
            )));
        }

        // Working copies: the plan must not depend on the caller's state
        let mut book: HashMap<OrderId, Order> = HashMap::new();
        let mut bids: PriorityQueue<OrderId, (Decimal, TimePriority)> = PriorityQueue::new();
        let mut asks: PriorityQueue<OrderId, (Reverse<Decimal>, TimePriority)> =
            PriorityQueue::new();

        for order in orders
            .iter()
            .filter(|o| o.is_open() && o.remaining_quantity > 0)
        {
            match order.side {
                Side::Buy => {
                    bids.push(order.id, (order.limit_price, Self::time_priority(order)));
                }
                Side::Sell => {
                    asks.push(
                        order.id,
                        (Reverse(order.limit_price), Self::time_priority(order)),
                    );
                }
            }
            book.insert(order.id, order.clone());
        }

        let mut fills = Vec::new();

        // Every iteration retires at least one order, so this terminates
        while let (Some((&bid_id, _)), Some((&ask_id, _))) = (bids.peek(), asks.peek()) {
            let (Some(buy), Some(sell)) = (book.get(&bid_id), book.get(&ask_id)) else {
                break;
            };
            if !self.can_match(buy, sell) {
                break;
            }

            let (fill, buy_remaining, sell_remaining) = self.match_orders(buy, sell)?;
            fills.push(fill);

            if let Some(buy) = book.get_mut(&bid_id) {
                buy.remaining_quantity = buy_remaining;
            }
            if let Some(sell) = book.get_mut(&ask_id) {
                sell.remaining_quantity = sell_remaining;
            }
            if buy_remaining == 0 {
                bids.pop();
            }
            if sell_remaining == 0 {
                asks.pop();
            }
        }

        Ok(fills)
    }
}
