mod account;
mod asset;
mod holding;
mod order;
mod order_status;
mod side;
mod transaction;

pub use account::{Account, UserId};
pub use asset::{Asset, AssetClass, AssetId};
pub use holding::Holding;
pub use order::{Order, OrderId};
pub use order_status::{OrderStateError, OrderStatus};
pub use side::Side;
pub use transaction::{Transaction, TransactionId};
