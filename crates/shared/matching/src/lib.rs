//! Brokerage Matching Algorithms
//!
//! Implementations of order matching algorithms for the brokerage engine.

mod price_time;

pub use price_time::PriceTimeMatchingEngine;

// Re-export the trait from ports for convenience
pub use brokerage_ports::{Fill, MatchingAlgorithm, MatchingError, MatchingResult};
