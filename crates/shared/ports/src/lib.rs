//! Brokerage Ports
//!
//! Port definitions (traits) for the brokerage engine.
//! These define the boundaries between domain logic and infrastructure.

mod clock;
mod error;
mod matching;
mod oracle;
mod store;

pub use clock::Clock;
pub use error::{MatchingError, MatchingResult, StoreError, StoreResult};
pub use matching::{Fill, MatchingAlgorithm};
pub use oracle::PriceOracle;
pub use store::LedgerStore;
