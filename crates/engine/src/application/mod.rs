mod engine;
mod settlement;

pub use engine::BrokerageEngine;
pub use settlement::{Settlement, SettlementContext, SettlementError, settle};
