//! Order aggregate as read from the store.

use common::{Money, OrderId, OrderItemId, OrderStatus};
use store::{Order, Product, User};

/// An order item joined with its product.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub id: OrderItemId,
    pub product: Product,
    pub quantity: u32,
    pub personalization: String,
}

impl LineItem {
    /// `quantity × product.price`, using the product's current price.
    pub fn subtotal(&self) -> Money {
        self.product.price.multiply(self.quantity)
    }
}

/// Sums the item subtotals. Zero for no items.
pub fn compute_total(items: &[LineItem]) -> Money {
    items.iter().map(LineItem::subtotal).sum()
}

/// An order with its customer and items, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetails {
    pub order: Order,
    pub customer: User,
    pub items: Vec<LineItem>,
}

impl OrderDetails {
    pub fn id(&self) -> OrderId {
        self.order.id
    }

    pub fn status(&self) -> OrderStatus {
        self.order.status
    }

    /// Number of line items (not the summed quantity).
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total(&self) -> Money {
        compute_total(&self.items)
    }
}
