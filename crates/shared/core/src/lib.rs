//! Brokerage Core Domain
//!
//! Pure domain types for the brokerage matching and settlement engine.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Accounts and assets
    Account,
    Asset,
    AssetClass,
    AssetId,
    // Portfolio
    Holding,
    // Core trading entities
    Order,
    OrderId,
    OrderStateError,
    OrderStatus,
    Side,
    Transaction,
    TransactionId,
    UserId,
};
pub use values::{Price, Quantity, Timestamp};
