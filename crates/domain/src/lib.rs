//! Domain layer for the order management backend.
//!
//! This crate provides:
//! - `policy`: pure access decisions over a `Caller`
//! - `order`: the order aggregate and `OrderLifecycleService`
//! - `catalog`, `accounts`, `contact`: management services for products,
//!   users and contact messages

pub mod accounts;
pub mod catalog;
pub mod contact;
pub mod error;
pub mod order;
pub mod policy;

pub use accounts::{AccountService, NewAccount, normalize_email};
pub use catalog::{CatalogService, ProductInput};
pub use contact::{ContactDetails, ContactService};
pub use error::{DomainError, ValidationError};
pub use order::{
    CreateOrder, ItemSpec, LineItem, OrderDetails, OrderLifecycleService, UpdateOrder,
    compute_total,
};
pub use policy::Caller;
