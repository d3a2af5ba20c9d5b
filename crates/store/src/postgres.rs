use async_trait::async_trait;
use chrono::NaiveDate;
use common::{MessageId, Money, OrderId, OrderItemId, OrderStatus, ProductId, Role, UserId};
use rust_decimal::Decimal;
use sqlx::{
    PgPool, Postgres, Row, Transaction,
    postgres::{PgPoolOptions, PgRow},
};

use crate::{
    ContactMessage, MonthlyOrderCount, NewContactMessage, NewOrder, NewOrderItem, NewProduct,
    NewUser, Order, OrderChanges, OrderItem, OrderQuery, Product, ProductChanges, ProductSales,
    Result, StatusChange, StoreError, User, UserChanges,
    store::{AccountStore, CatalogStore, ContactStore, OrderStore, OwnerGuard, ReportStore},
};

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, image, created_at, updated_at";
const USER_COLUMNS: &str = "id, email, username, first_name, last_name, role, created_at";
const ORDER_COLUMNS: &str = "id, customer_id, status, order_date, delivery_date, notes";
const ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, personalization";
const MESSAGE_COLUMNS: &str = "id, customer_id, message, created_at";

/// PostgreSQL-backed store implementation.
///
/// Each write runs in its own transaction. Order rows are locked with
/// `SELECT ... FOR UPDATE` before they are checked and modified, and rows
/// referenced by new items are held with `FOR KEY SHARE` so they cannot be
/// deleted before commit.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        tracing::debug!(max_connections, "PostgreSQL pool opened");
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::new(row.try_get::<Decimal, _>("price")?),
            stock: to_u32("stock", row.try_get("stock")?)?,
            image: row.try_get("image")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        let role: String = row.try_get("role")?;
        Ok(User {
            id: UserId::new(row.try_get("id")?),
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            role: role
                .parse::<Role>()
                .map_err(|e| StoreError::DataCorruption(e.to_string()))?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            customer_id: UserId::new(row.try_get("customer_id")?),
            status: parse_status(&status)?,
            order_date: row.try_get("order_date")?,
            delivery_date: row.try_get::<Option<NaiveDate>, _>("delivery_date")?,
            notes: row.try_get("notes")?,
        })
    }

    fn row_to_item(row: PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            id: OrderItemId::new(row.try_get("id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: to_u32("quantity", row.try_get("quantity")?)?,
            personalization: row.try_get("personalization")?,
        })
    }

    fn row_to_message(row: PgRow) -> Result<ContactMessage> {
        Ok(ContactMessage {
            id: MessageId::new(row.try_get("id")?),
            customer_id: row.try_get::<Option<i64>, _>("customer_id")?.map(UserId::new),
            message: row.try_get("message")?,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn lock_order(
        tx: &mut Transaction<'_, Postgres>,
        id: OrderId,
        guard: OwnerGuard,
    ) -> Result<Order> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_i64())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "order",
            id: id.as_i64(),
        })?;

        let order = Self::row_to_order(row)?;
        if !guard.allows(order.customer_id) {
            return Err(StoreError::OwnerMismatch { order_id: id });
        }
        Ok(order)
    }

    async fn check_user(tx: &mut Transaction<'_, Postgres>, id: UserId) -> Result<()> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR KEY SHARE")
                .bind(id.as_i64())
                .fetch_optional(&mut **tx)
                .await?;

        match found {
            Some(_) => Ok(()),
            None => Err(StoreError::InvalidReference {
                entity: "user",
                id: id.as_i64(),
            }),
        }
    }

    async fn check_products(
        tx: &mut Transaction<'_, Postgres>,
        items: &[NewOrderItem],
    ) -> Result<()> {
        let ids: Vec<i64> = items.iter().map(|item| item.product_id.as_i64()).collect();
        let found: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM products WHERE id = ANY($1) FOR KEY SHARE")
                .bind(&ids)
                .fetch_all(&mut **tx)
                .await?;

        match ids.into_iter().find(|id| !found.contains(id)) {
            Some(missing) => Err(StoreError::InvalidReference {
                entity: "product",
                id: missing,
            }),
            None => Ok(()),
        }
    }

    async fn insert_items(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        items: &[NewOrderItem],
    ) -> Result<()> {
        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, personalization)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id.as_i64())
            .bind(item.product_id.as_i64())
            .bind(to_i32("quantity", item.quantity)?)
            .bind(&item.personalization)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

fn parse_status(value: &str) -> Result<OrderStatus> {
    value
        .parse::<OrderStatus>()
        .map_err(|e| StoreError::DataCorruption(e.to_string()))
}

fn to_u32(column: &str, value: i32) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::DataCorruption(format!("negative {column}: {value}")))
}

fn to_i32(column: &str, value: u32) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| StoreError::DataCorruption(format!("{column} out of range: {value}")))
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let ids: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn count_products(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(to_u64(count))
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (name, description, price, stock, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(to_i32("stock", product.stock)?)
        .bind(&product.image)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(row)
    }

    async fn update_product(&self, id: ProductId, changes: ProductChanges) -> Result<Product> {
        let stock = changes.stock.map(|s| to_i32("stock", s)).transpose()?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                stock = COALESCE($5, stock),
                image = COALESCE($6, image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_i64())
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.price.map(|p| p.amount()))
        .bind(stock)
        .bind(changes.image)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "product",
            id: id.as_i64(),
        })?;

        Self::row_to_product(row)
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return StoreError::ProtectedReference {
                        entity: "product",
                        id: id.as_i64(),
                        referenced_by: "order items",
                    };
                }
                StoreError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "product",
                id: id.as_i64(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for PostgresStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE ($1::TEXT IS NULL OR role = $1) ORDER BY id"
        ))
        .bind(role.map(|r| r.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_user).collect()
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (email, username, first_name, last_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::UniqueViolation {
                    field: "email",
                    value: user.email.clone(),
                };
            }
            StoreError::Database(e)
        })?;

        Self::row_to_user(row)
    }

    async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<User> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                role = COALESCE($5, role)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id.as_i64())
        .bind(changes.username)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.role.map(|r| r.as_str()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "user",
            id: id.as_i64(),
        })?;

        Self::row_to_user(row)
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        // Orders and items cascade; contact messages are detached by the
        // foreign key's ON DELETE SET NULL.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "user",
                id: id.as_i64(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        Self::check_user(&mut tx, order.customer_id).await?;
        Self::check_products(&mut tx, &order.items).await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (customer_id, status, order_date, delivery_date, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.customer_id.as_i64())
        .bind(order.status.as_str())
        .bind(order.order_date)
        .bind(order.delivery_date)
        .bind(&order.notes)
        .fetch_one(&mut *tx)
        .await?;
        let record = Self::row_to_order(row)?;

        Self::insert_items(&mut tx, record.id, &order.items).await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE ($1::BIGINT IS NULL OR customer_id = $1)
            ORDER BY order_date DESC, id DESC
            "#
        ))
        .bind(query.customer_id.map(|id| id.as_i64()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn items_for_order(&self, id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn update_order(
        &self,
        id: OrderId,
        guard: OwnerGuard,
        changes: OrderChanges,
    ) -> Result<Order> {
        let mut tx = self.pool.begin().await?;
        let current = Self::lock_order(&mut tx, id, guard).await?;
        if changes.is_empty() {
            tx.commit().await?;
            return Ok(current);
        }

        if let Some(customer_id) = changes.customer_id {
            Self::check_user(&mut tx, customer_id).await?;
        }
        if let Some(items) = &changes.items {
            Self::check_products(&mut tx, items).await?;
            sqlx::query("DELETE FROM order_items WHERE order_id = $1")
                .bind(id.as_i64())
                .execute(&mut *tx)
                .await?;
            Self::insert_items(&mut tx, id, items).await?;
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE orders SET customer_id = $2, delivery_date = $3, notes = $4
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id.as_i64())
        .bind(changes.customer_id.unwrap_or(current.customer_id).as_i64())
        .bind(changes.delivery_date.unwrap_or(current.delivery_date))
        .bind(changes.notes.unwrap_or(current.notes))
        .fetch_one(&mut *tx)
        .await?;
        let order = Self::row_to_order(row)?;

        tx.commit().await?;
        Ok(order)
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<StatusChange> {
        let mut tx = self.pool.begin().await?;
        let current = Self::lock_order(&mut tx, id, OwnerGuard::Any).await?;

        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_i64())
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;
        let order = Self::row_to_order(row)?;

        tx.commit().await?;
        Ok(StatusChange {
            previous: current.status,
            order,
        })
    }

    async fn delete_order(&self, id: OrderId, guard: OwnerGuard) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::lock_order(&mut tx, id, guard).await?;

        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ContactStore for PostgresStore {
    async fn create_contact_message(&self, message: NewContactMessage) -> Result<ContactMessage> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO contact_messages (customer_id, message)
            VALUES ($1, $2)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(message.customer_id.map(|id| id.as_i64()))
        .bind(&message.message)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_message(row)
    }

    async fn get_contact_message(&self, id: MessageId) -> Result<Option<ContactMessage>> {
        let row = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM contact_messages WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_message).transpose()
    }

    async fn list_contact_messages(&self) -> Result<Vec<ContactMessage>> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM contact_messages ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_message).collect()
    }

    async fn delete_contact_message(&self, id: MessageId) -> Result<()> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "contact message",
                id: id.as_i64(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ReportStore for PostgresStore {
    async fn count_orders(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(to_u64(count))
    }

    async fn total_revenue(&self) -> Result<Money> {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(oi.quantity * p.price), 0)::NUMERIC
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::new(total))
    }

    async fn count_orders_by_status(&self) -> Result<Vec<(OrderStatus, u64)>> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS total FROM orders GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<(OrderStatus, u64)> {
                let status: String = row.try_get("status")?;
                let total: i64 = row.try_get("total")?;
                Ok((parse_status(&status)?, to_u64(total)))
            })
            .collect()
    }

    async fn count_orders_by_month(&self) -> Result<Vec<MonthlyOrderCount>> {
        let rows = sqlx::query(
            r#"
            SELECT to_char(date_trunc('month', order_date AT TIME ZONE 'UTC'), 'YYYY-MM') AS month,
                   COUNT(*) AS total
            FROM orders
            GROUP BY month
            ORDER BY month
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<MonthlyOrderCount> {
                Ok(MonthlyOrderCount {
                    month: row.try_get("month")?,
                    total: to_u64(row.try_get("total")?),
                })
            })
            .collect()
    }

    async fn sum_quantity_by_product(&self, limit: usize) -> Result<Vec<ProductSales>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, SUM(oi.quantity)::BIGINT AS total_sold
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            GROUP BY p.id, p.name
            ORDER BY total_sold DESC, p.id ASC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<ProductSales> {
                Ok(ProductSales {
                    product_id: ProductId::new(row.try_get("id")?),
                    name: row.try_get("name")?,
                    total_sold: to_u64(row.try_get("total_sold")?),
                })
            })
            .collect()
    }
}
