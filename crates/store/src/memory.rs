use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{MessageId, Money, OrderId, OrderItemId, OrderStatus, ProductId, Role, UserId};
use tokio::sync::RwLock;

use crate::{
    ContactMessage, MonthlyOrderCount, NewContactMessage, NewOrder, NewOrderItem, NewProduct,
    NewUser, Order, OrderChanges, OrderItem, OrderQuery, Product, ProductChanges, ProductSales,
    Result, StatusChange, StoreError, User, UserChanges,
    store::{AccountStore, CatalogStore, ContactStore, OrderStore, OwnerGuard, ReportStore},
};

#[derive(Debug, Default)]
struct Sequences {
    product: i64,
    user: i64,
    order: i64,
    item: i64,
    message: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct MemoryState {
    products: BTreeMap<ProductId, Product>,
    users: BTreeMap<UserId, User>,
    orders: BTreeMap<OrderId, Order>,
    /// All order items in insertion order.
    items: Vec<OrderItem>,
    messages: BTreeMap<MessageId, ContactMessage>,
    sequences: Sequences,
}

impl MemoryState {
    fn check_user(&self, id: UserId) -> Result<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::InvalidReference {
                entity: "user",
                id: id.as_i64(),
            })
        }
    }

    fn check_products(&self, items: &[NewOrderItem]) -> Result<()> {
        match items
            .iter()
            .find(|item| !self.products.contains_key(&item.product_id))
        {
            Some(missing) => Err(StoreError::InvalidReference {
                entity: "product",
                id: missing.product_id.as_i64(),
            }),
            None => Ok(()),
        }
    }

    fn insert_items(&mut self, order_id: OrderId, items: Vec<NewOrderItem>) {
        for item in items {
            let id = OrderItemId::new(next(&mut self.sequences.item));
            self.items.push(OrderItem {
                id,
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                personalization: item.personalization,
            });
        }
    }

    fn locked_order(&self, id: OrderId, guard: OwnerGuard) -> Result<&Order> {
        let order = self.orders.get(&id).ok_or(StoreError::NotFound {
            entity: "order",
            id: id.as_i64(),
        })?;
        if !guard.allows(order.customer_id) {
            return Err(StoreError::OwnerMismatch { order_id: id });
        }
        Ok(order)
    }
}

/// In-memory store implementation.
///
/// Used by tests and when no database is configured. Every write holds
/// the single write lock for its whole duration, which gives the same
/// all-or-nothing behavior as a database transaction.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of order items stored.
    pub async fn item_count(&self) -> usize {
        self.state.read().await.items.len()
    }

    /// Clears every table.
    pub async fn clear(&self) {
        *self.state.write().await = MemoryState::default();
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<_> = state.products.values().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(products)
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn count_products(&self) -> Result<u64> {
        Ok(self.state.read().await.products.len() as u64)
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(next(&mut state.sequences.product)),
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            image: product.image,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, changes: ProductChanges) -> Result<Product> {
        let mut state = self.state.write().await;
        let product = state.products.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "product",
            id: id.as_i64(),
        })?;

        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(description) = changes.description {
            product.description = description;
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(stock) = changes.stock {
            product.stock = stock;
        }
        if let Some(image) = changes.image {
            product.image = image;
        }
        product.updated_at = Utc::now();

        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.products.contains_key(&id) {
            return Err(StoreError::NotFound {
                entity: "product",
                id: id.as_i64(),
            });
        }
        if state.items.iter().any(|item| item.product_id == id) {
            return Err(StoreError::ProtectedReference {
                entity: "product",
                id: id.as_i64(),
                referenced_by: "order items",
            });
        }
        state.products.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation {
                field: "email",
                value: user.email,
            });
        }

        let user = User {
            id: UserId::new(next(&mut state.sequences.user)),
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<User> {
        let mut state = self.state.write().await;
        let user = state.users.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "user",
            id: id.as_i64(),
        })?;

        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }

        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Err(StoreError::NotFound {
                entity: "user",
                id: id.as_i64(),
            });
        }

        state.orders.retain(|_, order| order.customer_id != id);
        let MemoryState { orders, items, .. } = &mut *state;
        items.retain(|item| orders.contains_key(&item.order_id));
        for message in state.messages.values_mut() {
            if message.customer_id == Some(id) {
                message.customer_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        let mut state = self.state.write().await;
        state.check_user(order.customer_id)?;
        state.check_products(&order.items)?;

        let record = Order {
            id: OrderId::new(next(&mut state.sequences.order)),
            customer_id: order.customer_id,
            status: order.status,
            order_date: order.order_date,
            delivery_date: order.delivery_date,
            notes: order.notes,
        };
        state.orders.insert(record.id, record.clone());
        state.insert_items(record.id, order.items);

        Ok(record)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| query.matches(o.customer_id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn items_for_order(&self, id: OrderId) -> Result<Vec<OrderItem>> {
        let state = self.state.read().await;
        Ok(state
            .items
            .iter()
            .filter(|item| item.order_id == id)
            .cloned()
            .collect())
    }

    async fn update_order(
        &self,
        id: OrderId,
        guard: OwnerGuard,
        changes: OrderChanges,
    ) -> Result<Order> {
        let mut state = self.state.write().await;
        let current = state.locked_order(id, guard)?;
        if changes.is_empty() {
            return Ok(current.clone());
        }

        // Validate everything before the first write.
        if let Some(customer_id) = changes.customer_id {
            state.check_user(customer_id)?;
        }
        if let Some(items) = &changes.items {
            state.check_products(items)?;
        }

        if let Some(items) = changes.items {
            state.items.retain(|item| item.order_id != id);
            state.insert_items(id, items);
        }

        let order = state.orders.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "order",
            id: id.as_i64(),
        })?;
        if let Some(customer_id) = changes.customer_id {
            order.customer_id = customer_id;
        }
        if let Some(delivery_date) = changes.delivery_date {
            order.delivery_date = delivery_date;
        }
        if let Some(notes) = changes.notes {
            order.notes = notes;
        }

        Ok(order.clone())
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<StatusChange> {
        let mut state = self.state.write().await;
        let order = state.orders.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "order",
            id: id.as_i64(),
        })?;

        let previous = order.status;
        order.status = status;

        Ok(StatusChange {
            previous,
            order: order.clone(),
        })
    }

    async fn delete_order(&self, id: OrderId, guard: OwnerGuard) -> Result<()> {
        let mut state = self.state.write().await;
        state.locked_order(id, guard)?;
        state.orders.remove(&id);
        state.items.retain(|item| item.order_id != id);
        Ok(())
    }
}

#[async_trait]
impl ContactStore for InMemoryStore {
    async fn create_contact_message(&self, message: NewContactMessage) -> Result<ContactMessage> {
        let mut state = self.state.write().await;
        let message = ContactMessage {
            id: MessageId::new(next(&mut state.sequences.message)),
            customer_id: message.customer_id,
            message: message.message,
            created_at: Utc::now(),
        };
        state.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn get_contact_message(&self, id: MessageId) -> Result<Option<ContactMessage>> {
        Ok(self.state.read().await.messages.get(&id).cloned())
    }

    async fn list_contact_messages(&self) -> Result<Vec<ContactMessage>> {
        let state = self.state.read().await;
        let mut messages: Vec<_> = state.messages.values().cloned().collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(messages)
    }

    async fn delete_contact_message(&self, id: MessageId) -> Result<()> {
        let mut state = self.state.write().await;
        match state.messages.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                entity: "contact message",
                id: id.as_i64(),
            }),
        }
    }
}

#[async_trait]
impl ReportStore for InMemoryStore {
    async fn count_orders(&self) -> Result<u64> {
        Ok(self.state.read().await.orders.len() as u64)
    }

    async fn total_revenue(&self) -> Result<Money> {
        let state = self.state.read().await;
        let mut total = Money::zero();
        for item in &state.items {
            let product = state.products.get(&item.product_id).ok_or_else(|| {
                StoreError::DataCorruption(format!(
                    "order item {} references missing product {}",
                    item.id, item.product_id
                ))
            })?;
            total += product.price.multiply(item.quantity);
        }
        Ok(total)
    }

    async fn count_orders_by_status(&self) -> Result<Vec<(OrderStatus, u64)>> {
        let state = self.state.read().await;
        let mut counts: BTreeMap<&'static str, (OrderStatus, u64)> = BTreeMap::new();
        for order in state.orders.values() {
            counts.entry(order.status.as_str()).or_insert((order.status, 0)).1 += 1;
        }
        Ok(counts.into_values().collect())
    }

    async fn count_orders_by_month(&self) -> Result<Vec<MonthlyOrderCount>> {
        let state = self.state.read().await;
        let mut months: BTreeMap<String, u64> = BTreeMap::new();
        for order in state.orders.values() {
            *months
                .entry(order.order_date.format("%Y-%m").to_string())
                .or_default() += 1;
        }
        Ok(months
            .into_iter()
            .map(|(month, total)| MonthlyOrderCount { month, total })
            .collect())
    }

    async fn sum_quantity_by_product(&self, limit: usize) -> Result<Vec<ProductSales>> {
        let state = self.state.read().await;
        let mut sold: HashMap<ProductId, u64> = HashMap::new();
        for item in &state.items {
            *sold.entry(item.product_id).or_default() += u64::from(item.quantity);
        }

        let mut sales: Vec<_> = sold
            .into_iter()
            .filter_map(|(product_id, total_sold)| {
                state.products.get(&product_id).map(|p| ProductSales {
                    product_id,
                    name: p.name.clone(),
                    total_sold,
                })
            })
            .collect();
        sales.sort_by(|a, b| {
            b.total_sold
                .cmp(&a.total_sold)
                .then(a.product_id.cmp(&b.product_id))
        });
        sales.truncate(limit);
        Ok(sales)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone};

    use super::*;

    fn new_product(name: &str, cents: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: String::new(),
            price: Money::from_cents(cents),
            stock: 10,
            image: String::new(),
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: email.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::Customer,
        }
    }

    fn item(product_id: ProductId, quantity: u32) -> NewOrderItem {
        NewOrderItem {
            product_id,
            quantity,
            personalization: String::new(),
        }
    }

    fn new_order(customer_id: UserId, at: DateTime<Utc>, items: Vec<NewOrderItem>) -> NewOrder {
        NewOrder {
            customer_id,
            status: OrderStatus::New,
            order_date: at,
            delivery_date: None,
            notes: String::new(),
            items,
        }
    }

    async fn seeded() -> (InMemoryStore, UserId, ProductId, ProductId) {
        let store = InMemoryStore::new();
        let user = store.create_user(new_user("u1@example.com")).await.unwrap();
        let a = store.create_product(new_product("A", 1000)).await.unwrap();
        let b = store.create_product(new_product("B", 350)).await.unwrap();
        (store, user.id, a.id, b.id)
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let (store, _, a, b) = seeded().await;
        assert_eq!(a, ProductId::new(1));
        assert_eq!(b, ProductId::new(2));
        let c = store.create_product(new_product("C", 1)).await.unwrap();
        assert_eq!(c.id, ProductId::new(3));
    }

    #[tokio::test]
    async fn test_insert_order_with_items() {
        let (store, user, a, b) = seeded().await;
        let order = store
            .insert_order(new_order(user, Utc::now(), vec![item(a, 2), item(b, 1)]))
            .await
            .unwrap();

        let items = store.items_for_order(order.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product_id, a);
        assert_eq!(items[1].product_id, b);
    }

    #[tokio::test]
    async fn test_insert_order_rejects_unknown_product_without_writing() {
        let (store, user, a, _) = seeded().await;
        let result = store
            .insert_order(new_order(
                user,
                Utc::now(),
                vec![item(a, 1), item(ProductId::new(99), 1)],
            ))
            .await;

        assert!(matches!(
            result,
            Err(StoreError::InvalidReference { entity: "product", id: 99 })
        ));
        assert_eq!(store.count_orders().await.unwrap(), 0);
        assert_eq!(store.item_count().await, 0);
    }

    #[tokio::test]
    async fn test_insert_order_rejects_unknown_customer() {
        let (store, _, a, _) = seeded().await;
        let result = store
            .insert_order(new_order(UserId::new(42), Utc::now(), vec![item(a, 1)]))
            .await;
        assert!(matches!(
            result,
            Err(StoreError::InvalidReference { entity: "user", .. })
        ));
    }

    #[tokio::test]
    async fn test_update_order_replaces_items() {
        let (store, user, a, b) = seeded().await;
        let order = store
            .insert_order(new_order(user, Utc::now(), vec![item(a, 2)]))
            .await
            .unwrap();

        let changes = OrderChanges {
            items: Some(vec![item(b, 5)]),
            ..Default::default()
        };
        store
            .update_order(order.id, OwnerGuard::Any, changes)
            .await
            .unwrap();

        let items = store.items_for_order(order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, b);
        assert_eq!(items[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_update_order_without_items_keeps_items() {
        let (store, user, a, _) = seeded().await;
        let order = store
            .insert_order(new_order(user, Utc::now(), vec![item(a, 2)]))
            .await
            .unwrap();

        let changes = OrderChanges {
            notes: Some("ring the bell".to_string()),
            ..Default::default()
        };
        let updated = store
            .update_order(order.id, OwnerGuard::Any, changes)
            .await
            .unwrap();

        assert_eq!(updated.notes, "ring the bell");
        assert_eq!(store.items_for_order(order.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_order_is_all_or_nothing() {
        let (store, user, a, _) = seeded().await;
        let order = store
            .insert_order(new_order(user, Utc::now(), vec![item(a, 2)]))
            .await
            .unwrap();

        let changes = OrderChanges {
            notes: Some("changed".to_string()),
            items: Some(vec![item(ProductId::new(99), 1)]),
            ..Default::default()
        };
        let result = store
            .update_order(order.id, OwnerGuard::Any, changes)
            .await;
        assert!(result.is_err());

        let unchanged = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(unchanged.notes, "");
        assert_eq!(store.items_for_order(order.id).await.unwrap()[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_owner_guard_mismatch() {
        let (store, user, a, _) = seeded().await;
        let order = store
            .insert_order(new_order(user, Utc::now(), vec![item(a, 1)]))
            .await
            .unwrap();

        let result = store
            .update_order(
                order.id,
                OwnerGuard::Owner(UserId::new(77)),
                OrderChanges::default(),
            )
            .await;
        assert!(matches!(result, Err(StoreError::OwnerMismatch { .. })));

        let result = store
            .delete_order(order.id, OwnerGuard::Owner(UserId::new(77)))
            .await;
        assert!(matches!(result, Err(StoreError::OwnerMismatch { .. })));
    }

    #[tokio::test]
    async fn test_set_status_returns_previous() {
        let (store, user, a, _) = seeded().await;
        let order = store
            .insert_order(new_order(user, Utc::now(), vec![item(a, 1)]))
            .await
            .unwrap();

        let change = store
            .set_order_status(order.id, OrderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(change.previous, OrderStatus::New);
        assert_eq!(change.order.status, OrderStatus::Completed);

        let change = store
            .set_order_status(order.id, OrderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(change.previous, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_delete_referenced_product_is_protected() {
        let (store, user, a, b) = seeded().await;
        store
            .insert_order(new_order(user, Utc::now(), vec![item(a, 1)]))
            .await
            .unwrap();

        let result = store.delete_product(a).await;
        assert!(matches!(result, Err(StoreError::ProtectedReference { .. })));
        assert!(store.get_product(a).await.unwrap().is_some());

        store.delete_product(b).await.unwrap();
        assert!(store.get_product(b).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_order_cascades_items() {
        let (store, user, a, _) = seeded().await;
        let order = store
            .insert_order(new_order(user, Utc::now(), vec![item(a, 1), item(a, 2)]))
            .await
            .unwrap();

        store.delete_order(order.id, OwnerGuard::Any).await.unwrap();
        assert!(store.get_order(order.id).await.unwrap().is_none());
        assert_eq!(store.item_count().await, 0);
        // Nothing references the product any more.
        store.delete_product(a).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_user_cascades_orders_and_detaches_messages() {
        let (store, user, a, _) = seeded().await;
        store
            .insert_order(new_order(user, Utc::now(), vec![item(a, 1)]))
            .await
            .unwrap();
        let message = store
            .create_contact_message(NewContactMessage {
                customer_id: Some(user),
                message: "hello".to_string(),
            })
            .await
            .unwrap();

        store.delete_user(user).await.unwrap();

        assert_eq!(store.count_orders().await.unwrap(), 0);
        assert_eq!(store.item_count().await, 0);
        let message = store.get_contact_message(message.id).await.unwrap().unwrap();
        assert_eq!(message.customer_id, None);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (store, _, _, _) = seeded().await;
        let result = store.create_user(new_user("u1@example.com")).await;
        assert!(matches!(result, Err(StoreError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn test_list_orders_most_recent_first() {
        let (store, user, a, _) = seeded().await;
        let other = store.create_user(new_user("u2@example.com")).await.unwrap();
        let jan = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let feb = Utc.with_ymd_and_hms(2024, 2, 10, 12, 0, 0).unwrap();

        let old = store
            .insert_order(new_order(user, jan, vec![item(a, 1)]))
            .await
            .unwrap();
        let new = store
            .insert_order(new_order(user, feb, vec![item(a, 1)]))
            .await
            .unwrap();
        let foreign = store
            .insert_order(new_order(other.id, feb, vec![item(a, 1)]))
            .await
            .unwrap();

        let all = store.list_orders(OrderQuery::all()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![foreign.id, new.id, old.id]);

        let mine = store
            .list_orders(OrderQuery::for_customer(user))
            .await
            .unwrap();
        let ids: Vec<_> = mine.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);
    }

    #[tokio::test]
    async fn test_report_aggregates() {
        let (store, user, a, b) = seeded().await;
        let jan = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 0).unwrap();
        let mar = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        let first = store
            .insert_order(new_order(user, jan, vec![item(a, 2), item(b, 1)]))
            .await
            .unwrap();
        store
            .insert_order(new_order(user, mar, vec![item(b, 4)]))
            .await
            .unwrap();
        store
            .set_order_status(first.id, OrderStatus::Completed)
            .await
            .unwrap();

        assert_eq!(store.count_orders().await.unwrap(), 2);
        // 2 × 10.00 + 1 × 3.50 + 4 × 3.50
        assert_eq!(store.total_revenue().await.unwrap(), Money::from_cents(3750));
        assert_eq!(
            store.count_orders_by_status().await.unwrap(),
            vec![(OrderStatus::Completed, 1), (OrderStatus::New, 1)]
        );

        let months = store.count_orders_by_month().await.unwrap();
        assert_eq!(
            months,
            vec![
                MonthlyOrderCount {
                    month: "2024-01".to_string(),
                    total: 1
                },
                MonthlyOrderCount {
                    month: "2024-03".to_string(),
                    total: 1
                },
            ]
        );

        let top = store.sum_quantity_by_product(5).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].product_id, b);
        assert_eq!(top[0].total_sold, 5);
        assert_eq!(top[1].product_id, a);
        assert_eq!(top[1].total_sold, 2);
    }

    #[tokio::test]
    async fn test_revenue_of_empty_store_is_zero() {
        let store = InMemoryStore::new();
        assert!(store.total_revenue().await.unwrap().is_zero());
        assert!(store.count_orders_by_status().await.unwrap().is_empty());
        assert!(store.sum_quantity_by_product(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_top_products_ties_break_by_id() {
        let (store, user, a, b) = seeded().await;
        store
            .insert_order(new_order(user, Utc::now(), vec![item(b, 3), item(a, 3)]))
            .await
            .unwrap();

        let top = store.sum_quantity_by_product(1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].product_id, a);
    }

    #[tokio::test]
    async fn test_empty_update_returns_order_unchanged() {
        let (store, user, a, _) = seeded().await;
        let order = store
            .insert_order(new_order(user, Utc::now(), vec![item(a, 2)]))
            .await
            .unwrap();

        let same = store
            .update_order(order.id, OwnerGuard::Owner(user), OrderChanges::default())
            .await
            .unwrap();
        assert_eq!(same, order);
        assert_eq!(store.items_for_order(order.id).await.unwrap().len(), 1);

        let missing = store
            .update_order(OrderId::new(99), OwnerGuard::Any, OrderChanges::default())
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_item_replace_and_status_change_both_land_whole() {
        let (store, user, a, b) = seeded().await;

        for _ in 0..25 {
            let order = store
                .insert_order(new_order(user, Utc::now(), vec![item(a, 2), item(b, 1)]))
                .await
                .unwrap();
            let id = order.id;

            let writer = store.clone();
            let update = tokio::spawn(async move {
                let changes = OrderChanges {
                    notes: Some("replaced".to_string()),
                    items: Some(vec![item(b, 7)]),
                    ..Default::default()
                };
                writer
                    .update_order(id, OwnerGuard::Owner(user), changes)
                    .await
            });
            let writer = store.clone();
            let status = tokio::spawn(async move {
                writer
                    .set_order_status(id, OrderStatus::InProgress)
                    .await
            });
            update.await.unwrap().unwrap();
            status.await.unwrap().unwrap();

            let stored = store.get_order(id).await.unwrap().unwrap();
            assert_eq!(stored.status, OrderStatus::InProgress);
            assert_eq!(stored.notes, "replaced");

            let items = store.items_for_order(id).await.unwrap();
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].product_id, b);
            assert_eq!(items[0].quantity, 7);
        }
    }
}
