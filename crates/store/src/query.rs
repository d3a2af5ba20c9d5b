use common::UserId;

/// Shapes an order listing.
///
/// Listings are always ordered most recent first (`order_date` descending,
/// then id descending). The only filter is the owning customer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Restrict to orders owned by this customer.
    pub customer_id: Option<UserId>,
}

impl OrderQuery {
    /// Matches every order.
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches only orders owned by `customer_id`.
    pub fn for_customer(customer_id: UserId) -> Self {
        Self {
            customer_id: Some(customer_id),
        }
    }

    /// Returns true if an order owned by `owner` passes the filter.
    pub fn matches(&self, owner: UserId) -> bool {
        self.customer_id.is_none_or(|id| id == owner)
    }
}
