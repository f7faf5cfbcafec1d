//! Brokerage Engine
//!
//! Order matching and settlement for a brokerage simulation. Callers submit
//! Buy/Sell limit orders; the engine checks margin, rests them in a per-asset
//! book, matches crossing orders under price-time priority and settles each
//! match atomically against funds, holdings, orders and the transaction log.
//!
//! ## Architecture
//!
//! ```text
//!  submit_order ──► margin / holdings check ──► Order (Pending)
//!                      (per-user section)           │
//!                                                   ▼
//!  timer / caller ──────────────────────────► run_matching_pass(aid)
//!                                              (per-asset section)
//!                                                   │ fills
//!                                                   ▼
//!                                    settle() ──► WriteBatch ──► LedgerStore
//!                                 (pure, per match)   (commit or roll back)
//! ```

// Application layer
pub mod application;

// Infrastructure layer
pub mod infrastructure;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod model;

// Re-export main types for convenience
pub use application::BrokerageEngine;
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use infrastructure::{KeyedLocks, MemoryStore, PriceBoard, WriteBatch};
