//! Row types read from and written to the store.

use chrono::{DateTime, NaiveDate, Utc};
use common::{MessageId, Money, OrderId, OrderItemId, OrderStatus, ProductId, Role, UserId};
use serde::{Deserialize, Serialize};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a product about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub image: String,
}

/// Partial product update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
    pub image: Option<String>,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Full name when one is set, the email otherwise.
    pub fn display_name(&self) -> String {
        let full_name = format!("{} {}", self.first_name, self.last_name);
        let full_name = full_name.trim();
        if full_name.is_empty() {
            self.email.clone()
        } else {
            full_name.to_string()
        }
    }
}

/// Fields for a user about to be inserted. The email must already be
/// normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// Partial user update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
}

/// An order row, without its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub delivery_date: Option<NaiveDate>,
    pub notes: String,
}

/// A line item row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub personalization: String,
}

/// A line item about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub personalization: String,
}

/// An order and its items about to be inserted in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: UserId,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub delivery_date: Option<NaiveDate>,
    pub notes: String,
    pub items: Vec<NewOrderItem>,
}

/// Partial order update applied in one transaction.
///
/// Scalar fields merge; `items`, when present, replaces every existing item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderChanges {
    pub customer_id: Option<UserId>,
    pub delivery_date: Option<Option<NaiveDate>>,
    pub notes: Option<String>,
    pub items: Option<Vec<NewOrderItem>>,
}

impl OrderChanges {
    /// Returns true when applying the changes would leave the row as is.
    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none()
            && self.delivery_date.is_none()
            && self.notes.is_none()
            && self.items.is_none()
    }
}

/// Outcome of a status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Status before the update.
    pub previous: OrderStatus,
    /// The order after the update.
    pub order: Order,
}

/// A message left through the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: MessageId,
    pub customer_id: Option<UserId>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A contact message about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContactMessage {
    pub customer_id: Option<UserId>,
    pub message: String,
}

/// Number of orders placed in one calendar month (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyOrderCount {
    /// Month formatted as `YYYY-MM`.
    pub month: String,
    pub total: u64,
}

/// Total quantity sold of one product across all order items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub name: String,
    pub total_sold: u64,
}
