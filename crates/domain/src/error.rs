//! Domain error types.

use common::{ProductId, UserId};
use store::StoreError;
use thiserror::Error;

/// Input rejected before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// An order needs at least one item.
    #[error("An order must include at least one item")]
    NoItems,

    /// Item quantities start at 1.
    #[error("Item {index}: quantity must be at least 1")]
    InvalidQuantity { index: usize },

    /// An item references a product that does not exist.
    #[error("Product {0} does not exist")]
    UnknownProduct(ProductId),

    /// The target customer does not exist.
    #[error("Customer {0} does not exist")]
    UnknownCustomer(UserId),

    /// The status is not one of `new`, `in_progress`, `completed`.
    #[error("Invalid status: {0:?}")]
    InvalidStatus(String),

    /// A field failed a format or range check.
    #[error("{field}: {message}")]
    Field {
        field: &'static str,
        message: String,
    },
}

impl ValidationError {
    /// Creates a field-level validation error.
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError::Field {
            field,
            message: message.into(),
        }
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The addressed resource does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The caller may not perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The operation conflicts with existing data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        DomainError::Forbidden(message.into())
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, id } => DomainError::NotFound { entity, id },
            StoreError::InvalidReference {
                entity: "product",
                id,
            } => ValidationError::UnknownProduct(ProductId::new(id)).into(),
            StoreError::InvalidReference { entity: "user", id } => {
                ValidationError::UnknownCustomer(UserId::new(id)).into()
            }
            StoreError::ProtectedReference { .. } | StoreError::UniqueViolation { .. } => {
                DomainError::Conflict(e.to_string())
            }
            StoreError::OwnerMismatch { order_id } => {
                DomainError::Forbidden(format!("Order {order_id} belongs to another customer"))
            }
            other => DomainError::Store(other),
        }
    }
}
