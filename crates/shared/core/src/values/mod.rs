use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Price value - uses Decimal for precision
pub type Price = Decimal;

/// Quantity value - whole units of an asset
pub type Quantity = u64;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;
