//! Order aggregate, commands and lifecycle service.

mod aggregate;
mod commands;
mod items;
mod notices;
mod service;

pub use aggregate::{LineItem, OrderDetails, compute_total};
pub use commands::{CreateOrder, UpdateOrder};
pub use items::{ItemSpec, MAX_QUANTITY, validate_items};
pub use notices::{order_created, status_changed};
pub use service::OrderLifecycleService;
