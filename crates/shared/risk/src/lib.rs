//! Brokerage Risk
//!
//! Margin and exposure math. Everything here is a pure function of current
//! state: funds, open orders and holdings are passed in, nothing is cached.
//!
//! ```text
//! pending_cost(uid, class)     = Σ remaining_qty × limit_price   (open Buys)
//! committed_cost(uid, class)   = Σ qty × avg_buy_price           (holdings)
//! available_margin(uid, class) = base_allowance + funds − pending_cost
//! utilized_margin(uid, class)  = committed_cost
//! ```

mod error;
mod margin;

pub use error::{RiskError, RiskResult};
pub use margin::{
    DEFAULT_BASE_ALLOWANCE, ExposureSnapshot, MarginCalculator, MarginStatus, committed_cost,
    pending_cost,
};
