//! Report payload types.

use std::collections::BTreeMap;

use common::{Money, OrderStatus, ProductId};
use serde::Serialize;
use store::{MonthlyOrderCount, ProductSales};

/// A best-selling product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopProduct {
    pub id: ProductId,
    pub name: String,
    pub total_sold: u64,
}

impl From<ProductSales> for TopProduct {
    fn from(sales: ProductSales) -> Self {
        Self {
            id: sales.product_id,
            name: sales.name,
            total_sold: sales.total_sold,
        }
    }
}

/// Snapshot of order activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub total_orders: u64,
    /// Σ quantity × current product price over every line item.
    pub total_revenue: Money,
    /// Keyed by status wire value, so keys iterate in status order.
    pub orders_by_status: BTreeMap<String, u64>,
    /// Oldest month first.
    pub monthly_sales: Vec<MonthlyOrderCount>,
    pub top_products: Vec<TopProduct>,
}

impl Report {
    /// Report over an empty store.
    pub fn empty() -> Self {
        Self {
            total_orders: 0,
            total_revenue: Money::zero(),
            orders_by_status: BTreeMap::new(),
            monthly_sales: Vec::new(),
            top_products: Vec::new(),
        }
    }

    pub fn count_for(&self, status: OrderStatus) -> u64 {
        self.orders_by_status
            .get(status.as_str())
            .copied()
            .unwrap_or(0)
    }

    /// Sum of the per-status counts. Equals `total_orders` when the report
    /// was built from a quiescent store.
    pub fn status_total(&self) -> u64 {
        self.orders_by_status.values().sum()
    }
}
