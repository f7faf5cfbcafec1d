use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::OrderId;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order has been accepted and nothing has executed yet
    Pending,
    /// Order has been partially filled
    PartiallyFilled,
    /// Order has been completely filled
    Completed,
    /// Order has been cancelled by the user
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Returns true if the order is still resting in the book
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::PartiallyFilled)
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step
    ///
    /// ```text
    /// Pending ──► PartiallyFilled ──► Completed
    ///    │               │  ▲
    ///    │               └──┘
    ///    ├───────────────┴──────────► Cancelled
    ///    └──────────────────────────► Completed
    /// ```
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, PartiallyFilled)
                | (Pending, Completed)
                | (Pending, Cancelled)
                | (PartiallyFilled, PartiallyFilled)
                | (PartiallyFilled, Completed)
                | (PartiallyFilled, Cancelled)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::PartiallyFilled => "PartiallyFilled",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

/// Rejected order lifecycle step
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderStateError {
    #[error("Order {order_id} cannot move from {from} to {to}")]
    IllegalTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Order {order_id} has {remaining} remaining, cannot fill {requested}")]
    Overfill {
        order_id: OrderId,
        remaining: u64,
        requested: u64,
    },

    #[error("Fill quantity must be positive")]
    EmptyFill,
}
