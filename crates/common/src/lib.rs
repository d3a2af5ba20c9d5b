//! Shared identifiers and value types used across the workspace.

pub mod money;
pub mod status;
pub mod types;

pub use money::Money;
pub use status::{OrderStatus, ParseEnumError, Role};
pub use types::{MessageId, OrderId, OrderItemId, ProductId, UserId};
