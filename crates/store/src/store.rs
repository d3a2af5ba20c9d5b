use async_trait::async_trait;
use common::{Money, MessageId, OrderId, OrderStatus, ProductId, Role, UserId};

use crate::{
    ContactMessage, MonthlyOrderCount, NewContactMessage, NewOrder, NewProduct, NewUser, Order,
    OrderChanges, OrderItem, OrderQuery, Product, ProductChanges, ProductSales, Result,
    StatusChange, User, UserChanges,
};

/// Ownership precondition checked inside an order write transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OwnerGuard {
    /// No ownership check (admin callers).
    #[default]
    Any,

    /// The order must still be owned by this customer when the row is
    /// locked, otherwise the write fails with `OwnerMismatch`.
    Owner(UserId),
}

impl OwnerGuard {
    /// Returns true if an order owned by `owner` satisfies the guard.
    pub fn allows(&self, owner: UserId) -> bool {
        match self {
            OwnerGuard::Any => true,
            OwnerGuard::Owner(expected) => *expected == owner,
        }
    }
}

/// Product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Retrieves a product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Lists every product, most recently created first.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Retrieves the products among `ids` that exist, in id order.
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>>;

    /// Returns the number of products.
    async fn count_products(&self) -> Result<u64>;

    /// Inserts a product.
    async fn create_product(&self, product: NewProduct) -> Result<Product>;

    /// Applies a partial update and bumps `updated_at`.
    async fn update_product(&self, id: ProductId, changes: ProductChanges) -> Result<Product>;

    /// Deletes a product.
    ///
    /// Fails with `ProtectedReference` while any order item references it.
    async fn delete_product(&self, id: ProductId) -> Result<()>;
}

/// User accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Retrieves a user by id.
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Retrieves a user by normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Lists users, optionally restricted to one role, in id order.
    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>>;

    /// Inserts a user. Fails with `UniqueViolation` if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Applies a partial update.
    async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<User>;

    /// Deletes a user, their orders and items, and detaches their contact
    /// messages.
    async fn delete_user(&self, id: UserId) -> Result<()>;
}

/// Orders and their items.
///
/// Every method that writes runs as one transaction.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts an order with its items.
    ///
    /// Fails with `InvalidReference` if the customer or any product does
    /// not exist.
    async fn insert_order(&self, order: NewOrder) -> Result<Order>;

    /// Retrieves an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists orders matching the query, most recent first.
    async fn list_orders(&self, query: OrderQuery) -> Result<Vec<Order>>;

    /// Retrieves the items of an order in insertion order.
    async fn items_for_order(&self, id: OrderId) -> Result<Vec<OrderItem>>;

    /// Locks the order, checks the guard, merges scalar changes and
    /// replaces the items when `changes.items` is present.
    async fn update_order(
        &self,
        id: OrderId,
        guard: OwnerGuard,
        changes: OrderChanges,
    ) -> Result<Order>;

    /// Locks the order and sets its status, returning the previous one.
    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<StatusChange>;

    /// Deletes an order and its items.
    async fn delete_order(&self, id: OrderId, guard: OwnerGuard) -> Result<()>;
}

/// Contact form messages.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Inserts a message.
    async fn create_contact_message(&self, message: NewContactMessage) -> Result<ContactMessage>;

    /// Retrieves a message by id.
    async fn get_contact_message(&self, id: MessageId) -> Result<Option<ContactMessage>>;

    /// Lists messages, newest first.
    async fn list_contact_messages(&self) -> Result<Vec<ContactMessage>>;

    /// Deletes a message.
    async fn delete_contact_message(&self, id: MessageId) -> Result<()>;
}

/// Grouped aggregation queries used by the reporting engine.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Number of orders.
    async fn count_orders(&self) -> Result<u64>;

    /// Sum of `quantity × price` over every order item, using the current
    /// product price.
    async fn total_revenue(&self) -> Result<Money>;

    /// Order count per status present in the data, sorted by status value.
    async fn count_orders_by_status(&self) -> Result<Vec<(OrderStatus, u64)>>;

    /// Order count per UTC calendar month, oldest month first.
    async fn count_orders_by_month(&self) -> Result<Vec<MonthlyOrderCount>>;

    /// Products with the highest summed item quantity, at most `limit`,
    /// descending by quantity then ascending by product id.
    async fn sum_quantity_by_product(&self, limit: usize) -> Result<Vec<ProductSales>>;
}

/// The complete store consumed by the services.
pub trait Store: CatalogStore + AccountStore + OrderStore + ContactStore + ReportStore {}

impl<T> Store for T where T: CatalogStore + AccountStore + OrderStore + ContactStore + ReportStore {}
