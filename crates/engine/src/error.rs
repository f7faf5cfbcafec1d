use brokerage_core::{AssetId, OrderStateError, Quantity};
use brokerage_ports::{MatchingError, StoreError};
use brokerage_risk::RiskError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::application::SettlementError;

#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("Order exceeds available margin: required {required}, available {available}")]
    MarginExceeded { required: Decimal, available: Decimal },

    #[error("Insufficient holdings: requested {requested}, available {available}")]
    InsufficientHoldings {
        requested: Quantity,
        available: Quantity,
    },

    #[error("Invalid asset {aid}: {reason}")]
    InvalidAsset { aid: AssetId, reason: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Quantity must be positive")]
    InvalidQuantity,

    #[error("Price must be positive, got {0}")]
    InvalidPrice(Decimal),

    #[error("Amount must not be negative, got {0}")]
    InvalidAmount(Decimal),

    #[error("Amount out of range: {0}")]
    AmountOutOfRange(String),

    #[error("Transient store failure: {0}")]
    TransientStoreFailure(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl EngineError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        EngineError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Only store contention is worth retrying; every other error is final
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::TransientStoreFailure(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => EngineError::TransientStoreFailure(msg),
            StoreError::Duplicate(msg) => EngineError::InvalidState(format!("duplicate {}", msg)),
        }
    }
}

impl From<RiskError> for EngineError {
    fn from(err: RiskError) -> Self {
        match err {
            RiskError::MarginExceeded {
                required,
                available,
                ..
            } => EngineError::MarginExceeded {
                required,
                available,
            },
            RiskError::InsufficientHoldings {
                requested,
                available,
            } => EngineError::InsufficientHoldings {
                requested,
                available,
            },
        }
    }
}

impl From<MatchingError> for EngineError {
    fn from(err: MatchingError) -> Self {
        EngineError::InternalError(err.to_string())
    }
}

impl From<OrderStateError> for EngineError {
    fn from(err: OrderStateError) -> Self {
        EngineError::InvalidState(err.to_string())
    }
}

impl From<SettlementError> for EngineError {
    fn from(err: SettlementError) -> Self {
        match err {
            SettlementError::OrderState(e) => e.into(),
            SettlementError::ShortDelivery { held, required, .. } => {
                EngineError::InsufficientHoldings {
                    requested: required,
                    available: held,
                }
            }
            SettlementError::MissingAccount(uid) => EngineError::not_found("Account", uid),
            SettlementError::Mismatch(msg) => EngineError::InternalError(msg),
            SettlementError::OutOfRange(msg) => EngineError::AmountOutOfRange(msg),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::InvalidConfig(err.to_string())
    }
}
