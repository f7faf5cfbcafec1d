use brokerage_core::{AssetClass, Quantity};
use rust_decimal::Decimal;
use thiserror::Error;

/// Pre-trade check failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("Order exceeds available {class} margin: required {required}, available {available}")]
    MarginExceeded {
        class: AssetClass,
        required: Decimal,
        available: Decimal,
    },

    #[error("Insufficient holdings: requested {requested}, available {available}")]
    InsufficientHoldings {
        requested: Quantity,
        available: Quantity,
    },
}

pub type RiskResult<T> = std::result::Result<T, RiskError>;
