//! Integration tests for the order lifecycle.
//!
//! These run the services together against the in-memory store, the way
//! the HTTP layer wires them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use common::{Money, OrderStatus, Role};
use domain::{
    AccountService, Caller, CatalogService, CreateOrder, DomainError, ItemSpec, NewAccount,
    OrderLifecycleService, ProductInput, UpdateOrder, ValidationError,
};
use notifications::{InMemorySink, Notifier};
use store::{InMemoryStore, NewOrder, NewOrderItem, OrderStore};

struct World {
    store: InMemoryStore,
    orders: OrderLifecycleService<InMemoryStore>,
    catalog: CatalogService<InMemoryStore>,
    accounts: AccountService<InMemoryStore>,
    sink: InMemorySink,
    admin: Caller,
}

async fn world() -> World {
    let store = InMemoryStore::new();
    let sink = InMemorySink::new();
    let accounts = AccountService::new(store.clone());
    let admin = accounts
        .ensure_admin("admin@example.com", "admin")
        .await
        .unwrap();

    World {
        orders: OrderLifecycleService::new(store.clone(), Notifier::new(Arc::new(sink.clone()))),
        catalog: CatalogService::new(store.clone()),
        accounts,
        store,
        sink,
        admin: Caller::from(&admin),
    }
}

impl World {
    async fn customer(&self, email: &str, first: &str, last: &str) -> Caller {
        let user = self
            .accounts
            .create_customer(
                &self.admin,
                NewAccount {
                    email: email.to_string(),
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        Caller::from(&user)
    }

    async fn product(&self, name: &str, cents: i64) -> common::ProductId {
        self.catalog
            .create_product(&self.admin, ProductInput::new(name, Money::from_cents(cents)))
            .await
            .unwrap()
            .id
    }
}

mod totals {
    use super::*;

    #[tokio::test]
    async fn two_products_total() {
        let w = world().await;
        let u1 = w.customer("u1@example.com", "", "").await;
        let a = w.product("A", 1000).await;
        let b = w.product("B", 350).await;

        let order = w
            .orders
            .create_order(
                &u1,
                CreateOrder::new(vec![ItemSpec::new(a).with_quantity(2), ItemSpec::new(b)]),
            )
            .await
            .unwrap();

        assert_eq!(order.total().to_plain_string(), "23.50");
        let subtotals: Vec<_> = order.items.iter().map(|i| i.subtotal()).collect();
        assert_eq!(
            subtotals,
            vec![Money::from_cents(2000), Money::from_cents(350)]
        );
    }

    #[tokio::test]
    async fn total_follows_live_price() {
        let w = world().await;
        let u1 = w.customer("u1@example.com", "", "").await;
        let a = w.product("A", 1000).await;
        let order = w
            .orders
            .create_order(&u1, CreateOrder::new(vec![ItemSpec::new(a).with_quantity(2)]))
            .await
            .unwrap();

        w.catalog
            .update_product(
                &w.admin,
                a,
                store::ProductChanges {
                    price: Some(Money::from_cents(1250)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let reloaded = w.orders.get_order(&u1, order.id()).await.unwrap();
        assert_eq!(reloaded.total(), Money::from_cents(2500));
    }
}

mod ownership {
    use super::*;

    #[tokio::test]
    async fn admin_reassigns_and_customer_cannot() {
        let w = world().await;
        let u1 = w.customer("u1@example.com", "", "").await;
        let u2 = w.customer("u2@example.com", "", "").await;
        let a = w.product("A", 1000).await;

        let order = w
            .orders
            .create_order(&u1, CreateOrder::new(vec![ItemSpec::new(a)]))
            .await
            .unwrap();

        let result = w
            .orders
            .update_order(&u1, order.id(), UpdateOrder::new().reassign_to(u2.id))
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));

        let moved = w
            .orders
            .update_order(&w.admin, order.id(), UpdateOrder::new().reassign_to(u2.id))
            .await
            .unwrap();
        assert_eq!(moved.customer.id, u2.id);

        // The previous owner has lost access.
        assert!(matches!(
            w.orders.get_order(&u1, order.id()).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(w.orders.get_order(&u2, order.id()).await.is_ok());
    }

    #[tokio::test]
    async fn listing_is_filtered_and_most_recent_first() {
        let w = world().await;
        let u1 = w.customer("u1@example.com", "", "").await;
        let u2 = w.customer("u2@example.com", "", "").await;
        let a = w.product("A", 1000).await;

        // Insert directly to control order dates.
        let mut ids = Vec::new();
        for (customer, day) in [(u1.id, 1), (u2.id, 2), (u1.id, 3)] {
            let order = w
                .store
                .insert_order(NewOrder {
                    customer_id: customer,
                    status: OrderStatus::New,
                    order_date: Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap(),
                    delivery_date: None,
                    notes: String::new(),
                    items: vec![NewOrderItem {
                        product_id: a,
                        quantity: 1,
                        personalization: String::new(),
                    }],
                })
                .await
                .unwrap();
            ids.push(order.id);
        }

        let mine: Vec<_> = w
            .orders
            .list_orders(&u1)
            .await
            .unwrap()
            .iter()
            .map(|o| o.id())
            .collect();
        assert_eq!(mine, vec![ids[2], ids[0]]);

        let all: Vec<_> = w
            .orders
            .list_orders(&w.admin)
            .await
            .unwrap()
            .iter()
            .map(|o| o.id())
            .collect();
        assert_eq!(all, vec![ids[2], ids[1], ids[0]]);
    }

    #[tokio::test]
    async fn customer_promoted_to_admin_sees_everything() {
        let w = world().await;
        let u1 = w.customer("u1@example.com", "", "").await;
        let u2 = w.customer("u2@example.com", "", "").await;
        let a = w.product("A", 1000).await;
        w.orders
            .create_order(&u2, CreateOrder::new(vec![ItemSpec::new(a)]))
            .await
            .unwrap();

        w.accounts.set_role(&w.admin, u1.id, Role::Admin).await.unwrap();
        let promoted = w.accounts.resolve_caller(u1.id).await.unwrap().unwrap();

        assert!(promoted.is_admin());
        assert_eq!(w.orders.list_orders(&promoted).await.unwrap().len(), 1);
    }
}

mod items {
    use super::*;

    #[tokio::test]
    async fn replace_items_is_full_replacement() {
        let w = world().await;
        let u1 = w.customer("u1@example.com", "", "").await;
        let a = w.product("A", 1000).await;
        let b = w.product("B", 350).await;
        let order = w
            .orders
            .create_order(
                &u1,
                CreateOrder::new(vec![ItemSpec::new(a), ItemSpec::new(b)]),
            )
            .await
            .unwrap();

        let replaced = w
            .orders
            .replace_items(&u1, order.id(), vec![ItemSpec::new(b).with_quantity(4)])
            .await
            .unwrap();

        assert_eq!(replaced.items.len(), 1);
        assert_eq!(replaced.items[0].product.id, b);
        assert_eq!(replaced.total(), Money::from_cents(1400));
        assert_eq!(w.store.item_count().await, 1);
    }

    #[tokio::test]
    async fn failed_replacement_keeps_old_items() {
        let w = world().await;
        let u1 = w.customer("u1@example.com", "", "").await;
        let a = w.product("A", 1000).await;
        let order = w
            .orders
            .create_order(&u1, CreateOrder::new(vec![ItemSpec::new(a).with_quantity(2)]))
            .await
            .unwrap();

        let result = w
            .orders
            .replace_items(
                &u1,
                order.id(),
                vec![ItemSpec::new(a), ItemSpec::new(common::ProductId::new(999))],
            )
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::UnknownProduct(_)))
        ));

        let unchanged = w.orders.get_order(&u1, order.id()).await.unwrap();
        assert_eq!(unchanged.items.len(), 1);
        assert_eq!(unchanged.items[0].quantity, 2);
    }
}

mod notifications_flow {
    use super::*;

    #[tokio::test]
    async fn created_and_status_notifications_use_display_name() {
        let w = world().await;
        let u1 = w.customer("u1@example.com", "Ana", "Lopez").await;
        let a = w.product("A", 1000).await;
        let b = w.product("B", 350).await;

        let order = w
            .orders
            .create_order(
                &u1,
                CreateOrder::new(vec![ItemSpec::new(a).with_quantity(2), ItemSpec::new(b)]),
            )
            .await
            .unwrap();
        w.orders
            .set_status(&w.admin, order.id(), "in_progress")
            .await
            .unwrap();

        assert!(w.sink.wait_for_count(2, Duration::from_secs(2)).await);
        let messages: Vec<_> = w.sink.sent().await.into_iter().map(|n| n.message).collect();
        assert!(messages.contains(&format!(
            "Order #{} created by Ana Lopez. Items: 2. Estimated total: $23.50.",
            order.id()
        )));
        assert!(messages.contains(&format!(
            "Order #{} updated for Ana Lopez: New → In progress.",
            order.id()
        )));
    }

    #[tokio::test]
    async fn unreliable_sink_never_fails_operations() {
        let w = world().await;
        w.sink.set_fail(true);
        let u1 = w.customer("u1@example.com", "", "").await;
        let a = w.product("A", 1000).await;

        let order = w
            .orders
            .create_order(&u1, CreateOrder::new(vec![ItemSpec::new(a)]))
            .await
            .unwrap();
        let done = w
            .orders
            .set_status(&w.admin, order.id(), "completed")
            .await
            .unwrap();
        assert_eq!(done.status(), OrderStatus::Completed);
    }

    #[tokio::test]
    async fn disabled_notifier_is_silent() {
        let store = InMemoryStore::new();
        let accounts = AccountService::new(store.clone());
        let admin = accounts.ensure_admin("a@example.com", "a").await.unwrap();
        let catalog = CatalogService::new(store.clone());
        let product = catalog
            .create_product(
                &Caller::from(&admin),
                ProductInput::new("A", Money::from_cents(100)),
            )
            .await
            .unwrap();
        let orders = OrderLifecycleService::new(store, Notifier::disabled());

        let order = orders
            .create_order(
                &Caller::from(&admin),
                CreateOrder::new(vec![ItemSpec::new(product.id)]),
            )
            .await
            .unwrap();
        assert_eq!(order.customer.id, admin.id);
    }
}
