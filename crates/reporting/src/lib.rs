//! Operational reporting.
//!
//! [`ReportingEngine`] aggregates orders, line items and products into a
//! [`Report`]: revenue, status distribution, monthly order counts and the
//! best-selling products. Every call recomputes from the store.

pub mod engine;
pub mod report;

pub use engine::{ReportingEngine, TOP_PRODUCTS_LIMIT};
pub use report::{Report, TopProduct};
