use common::OrderId;
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed row does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A write referenced a row that does not exist (e.g. an order item
    /// pointing at an unknown product).
    #[error("Referenced {entity} {id} does not exist")]
    InvalidReference { entity: &'static str, id: i64 },

    /// A delete was rejected because other rows still reference the target.
    #[error("Cannot delete {entity} {id}: still referenced by {referenced_by}")]
    ProtectedReference {
        entity: &'static str,
        id: i64,
        referenced_by: &'static str,
    },

    /// The order changed owner between the authorization check and the write.
    #[error("Order {order_id} is not owned by the expected customer")]
    OwnerMismatch { order_id: OrderId },

    /// A unique column already holds the value.
    #[error("Duplicate {field}: {value}")]
    UniqueViolation { field: &'static str, value: String },

    /// A stored value could not be mapped back to a domain type.
    #[error("Data corruption: {0}")]
    DataCorruption(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
