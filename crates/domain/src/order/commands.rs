//! Order commands.

use chrono::NaiveDate;
use common::UserId;

use super::ItemSpec;

/// Command to place a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrder {
    /// Target customer. Only honored for admins; everyone else orders for
    /// themselves.
    pub customer_id: Option<UserId>,

    pub delivery_date: Option<NaiveDate>,

    pub notes: String,

    /// Requested items. Must not be empty.
    pub items: Vec<ItemSpec>,
}

impl CreateOrder {
    /// Creates a command for the calling customer.
    pub fn new(items: Vec<ItemSpec>) -> Self {
        Self {
            customer_id: None,
            delivery_date: None,
            notes: String::new(),
            items,
        }
    }

    /// Places the order on behalf of `customer_id`.
    pub fn for_customer(mut self, customer_id: UserId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_delivery_date(mut self, date: NaiveDate) -> Self {
        self.delivery_date = Some(date);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Command to change an existing order.
///
/// `None` leaves a field untouched. `items`, when present, replaces every
/// existing item. The status is changed through `set_status` only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOrder {
    /// New owner. Admin only, except that a customer may restate
    /// themselves as owner.
    pub customer_id: Option<UserId>,

    /// `Some(None)` clears the delivery date.
    pub delivery_date: Option<Option<NaiveDate>>,

    pub notes: Option<String>,

    pub items: Option<Vec<ItemSpec>>,
}

impl UpdateOrder {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reassign_to(mut self, customer_id: UserId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn delivery_date(mut self, date: Option<NaiveDate>) -> Self {
        self.delivery_date = Some(date);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn replace_items(mut self, items: Vec<ItemSpec>) -> Self {
        self.items = Some(items);
        self
    }
}
