//! Notification texts for order events.

use common::OrderStatus;
use notifications::Notification;

use super::OrderDetails;

/// "New order" notification sent after an order is placed.
pub fn order_created(details: &OrderDetails) -> Notification {
    Notification::new(format!(
        "Order #{} created by {}. Items: {}. Estimated total: {}.",
        details.id(),
        details.customer.display_name(),
        details.item_count(),
        details.total(),
    ))
    .with_title("New order")
    .with_tag("bell")
}

/// "Order status" notification sent after a status change.
pub fn status_changed(details: &OrderDetails, previous: OrderStatus) -> Notification {
    Notification::new(format!(
        "Order #{} updated for {}: {} → {}.",
        details.id(),
        details.customer.display_name(),
        previous.label(),
        details.status().label(),
    ))
    .with_title("Order status")
    .with_tag("information")
}
