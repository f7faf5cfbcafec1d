mod locks;
mod memory_store;
mod price_board;
mod write_batch;

pub use locks::KeyedLocks;
pub use memory_store::MemoryStore;
pub use price_board::{PriceBoard, PriceTick};
pub use write_batch::WriteBatch;
