//! Durable store for the order management backend.
//!
//! The store is split into one trait per concern (catalog, accounts,
//! orders, contact messages, report aggregation). Every mutating order
//! operation runs as a single transaction so that status and items are
//! never partially applied.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::OrderQuery;
pub use records::{
    ContactMessage, MonthlyOrderCount, NewContactMessage, NewOrder, NewOrderItem, NewProduct,
    NewUser, Order, OrderChanges, OrderItem, Product, ProductChanges, ProductSales, StatusChange,
    User, UserChanges,
};
pub use store::{
    AccountStore, CatalogStore, ContactStore, OrderStore, OwnerGuard, ReportStore, Store,
};
