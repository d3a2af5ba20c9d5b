//! Order lifecycle service.

use chrono::Utc;
use common::{OrderId, OrderStatus, ProductId};
use notifications::Notifier;
use store::{NewOrder, Order, OrderChanges, Store, StoreError};

use crate::error::{DomainError, ValidationError};
use crate::policy::{self, Caller};

use super::{
    CreateOrder, ItemSpec, LineItem, OrderDetails, UpdateOrder, notices, validate_items,
};

/// Service for managing orders.
///
/// Every operation checks the access policy before it writes. Each write is
/// one store transaction; notifications are dispatched after it commits and
/// never affect the outcome.
pub struct OrderLifecycleService<S: Store> {
    store: S,
    notifier: Notifier,
}

impl<S: Store> OrderLifecycleService<S> {
    /// Creates a new order service.
    pub fn new(store: S, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order.
    ///
    /// Non-admins always order for themselves. Admins may name any existing
    /// customer.
    #[tracing::instrument(skip(self, cmd), fields(caller = %caller.id))]
    pub async fn create_order(
        &self,
        caller: &Caller,
        cmd: CreateOrder,
    ) -> Result<OrderDetails, DomainError> {
        let customer_id = match cmd.customer_id {
            Some(target) if policy::can_reassign_order(caller) => target,
            _ => caller.id,
        };
        let items = validate_items(cmd.items)?;

        let order = self
            .store
            .insert_order(NewOrder {
                customer_id,
                status: OrderStatus::New,
                order_date: Utc::now(),
                delivery_date: cmd.delivery_date,
                notes: cmd.notes,
                items,
            })
            .await?;
        let details = self.load_details(order).await?;

        tracing::info!(order_id = %details.id(), customer_id = %customer_id, "Order created");
        metrics::counter!("orders_created_total").increment(1);
        self.notifier.dispatch(notices::order_created(&details));

        Ok(details)
    }

    /// Applies a partial update.
    ///
    /// Fields left as `None` are untouched. Items, when given, replace the
    /// existing ones and must not be empty.
    #[tracing::instrument(skip(self, cmd), fields(caller = %caller.id))]
    pub async fn update_order(
        &self,
        caller: &Caller,
        order_id: OrderId,
        cmd: UpdateOrder,
    ) -> Result<OrderDetails, DomainError> {
        let current = self.load_order(order_id).await?;
        if !policy::can_write_order(caller, current.customer_id) {
            return Err(DomainError::forbidden(format!(
                "Order {order_id} belongs to another customer"
            )));
        }

        let customer_id = match cmd.customer_id {
            Some(target) if target == current.customer_id => None,
            Some(target) if policy::can_reassign_order(caller) => Some(target),
            Some(_) => {
                return Err(DomainError::forbidden(
                    "Only administrators can reassign orders",
                ));
            }
            None => None,
        };
        let items = cmd.items.map(validate_items).transpose()?;

        let changes = OrderChanges {
            customer_id,
            delivery_date: cmd.delivery_date,
            notes: cmd.notes,
            items,
        };
        let order = self
            .store
            .update_order(order_id, policy::owner_guard(caller), changes)
            .await?;
        let details = self.load_details(order).await?;

        tracing::info!(order_id = %order_id, "Order updated");
        metrics::counter!("orders_updated_total").increment(1);

        Ok(details)
    }

    /// Replaces every item of an order in one transaction.
    pub async fn replace_items(
        &self,
        caller: &Caller,
        order_id: OrderId,
        items: Vec<ItemSpec>,
    ) -> Result<OrderDetails, DomainError> {
        self.update_order(caller, order_id, UpdateOrder::new().replace_items(items))
            .await
    }

    /// Sets the status of an order. Admin only.
    ///
    /// Any status may follow any other, including itself.
    #[tracing::instrument(skip(self), fields(caller = %caller.id))]
    pub async fn set_status(
        &self,
        caller: &Caller,
        order_id: OrderId,
        status: &str,
    ) -> Result<OrderDetails, DomainError> {
        if !policy::can_assign_order_status(caller) {
            return Err(DomainError::forbidden(
                "Only administrators can change the order status",
            ));
        }
        let status: OrderStatus = status
            .parse()
            .map_err(|_| ValidationError::InvalidStatus(status.to_string()))?;

        let change = self.store.set_order_status(order_id, status).await?;
        let details = self.load_details(change.order).await?;

        tracing::info!(
            order_id = %order_id,
            previous = %change.previous,
            status = %status,
            "Order status changed"
        );
        metrics::counter!("order_status_changes_total").increment(1);
        self.notifier
            .dispatch(notices::status_changed(&details, change.previous));

        Ok(details)
    }

    /// Loads an order the caller may read.
    #[tracing::instrument(skip(self), fields(caller = %caller.id))]
    pub async fn get_order(
        &self,
        caller: &Caller,
        order_id: OrderId,
    ) -> Result<OrderDetails, DomainError> {
        let order = self.load_order(order_id).await?;
        if !policy::can_read_order(caller, order.customer_id) {
            return Err(DomainError::forbidden(format!(
                "Order {order_id} belongs to another customer"
            )));
        }
        self.load_details(order).await
    }

    /// Lists the orders visible to the caller, most recent first.
    #[tracing::instrument(skip(self), fields(caller = %caller.id))]
    pub async fn list_orders(&self, caller: &Caller) -> Result<Vec<OrderDetails>, DomainError> {
        let orders = self.store.list_orders(policy::order_scope(caller)).await?;

        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            match self.load_details(order).await {
                Ok(order) => details.push(order),
                Err(DomainError::NotFound { entity, id }) => {
                    tracing::debug!(entity, id, "Order vanished while listing, skipping");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(details)
    }

    /// Deletes an order and its items.
    #[tracing::instrument(skip(self), fields(caller = %caller.id))]
    pub async fn delete_order(&self, caller: &Caller, order_id: OrderId) -> Result<(), DomainError> {
        let order = self.load_order(order_id).await?;
        if !policy::can_write_order(caller, order.customer_id) {
            return Err(DomainError::forbidden(format!(
                "Order {order_id} belongs to another customer"
            )));
        }

        self.store
            .delete_order(order_id, policy::owner_guard(caller))
            .await?;
        tracing::info!(order_id = %order_id, "Order deleted");
        Ok(())
    }

    async fn load_order(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "order",
                id: order_id.as_i64(),
            })
    }

    /// Joins the customer and items onto an order row.
    ///
    /// Runs after the write has committed, so the customer may have been
    /// deleted in between. That cascades to the order and surfaces as
    /// `NotFound`.
    async fn load_details(&self, order: Order) -> Result<OrderDetails, DomainError> {
        let customer = self
            .store
            .get_user(order.customer_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "customer",
                id: order.customer_id.as_i64(),
            })?;

        let rows = self.store.items_for_order(order.id).await?;
        let mut product_ids: Vec<ProductId> = rows.iter().map(|row| row.product_id).collect();
        product_ids.sort();
        product_ids.dedup();
        let products = self.store.products_by_ids(&product_ids).await?;

        let items = rows
            .into_iter()
            .map(|row| -> Result<LineItem, StoreError> {
                let product = products
                    .iter()
                    .find(|p| p.id == row.product_id)
                    .cloned()
                    .ok_or_else(|| {
                        StoreError::DataCorruption(format!(
                            "order item {} references missing product {}",
                            row.id, row.product_id
                        ))
                    })?;
                Ok(LineItem {
                    id: row.id,
                    product,
                    quantity: row.quantity,
                    personalization: row.personalization,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OrderDetails {
            order,
            customer,
            items,
        })
    }
}
