//! Product catalog management.

use common::{Money, ProductId};
use store::{NewProduct, Product, ProductChanges, Store};

use crate::error::{DomainError, ValidationError};
use crate::policy::{self, Caller};

/// Longest accepted product name, in characters.
pub const MAX_NAME_LEN: usize = 150;

/// Fields of a product to create.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub image: String,
}

impl ProductInput {
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price,
            stock: 0,
            image: String::new(),
        }
    }
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::field("name", "must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::field(
            "name",
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(name.to_string())
}

/// Price must be non-negative, have at most 2 decimal places and fit in
/// 10 digits.
fn normalize_image(image: &str) -> String {
    image.trim().to_string()
}

fn validate_price(price: Money) -> Result<Money, ValidationError> {
    if price.is_negative() {
        return Err(ValidationError::field("price", "must not be negative"));
    }
    if price.exceeds_scale() {
        return Err(ValidationError::field(
            "price",
            "must have at most 2 decimal places",
        ));
    }
    if price >= Money::from_cents(10_000_000_000) {
        return Err(ValidationError::field("price", "must have at most 10 digits"));
    }
    Ok(price)
}

/// Service for reading and managing the product catalog.
///
/// Reads are open to everyone; writes are admin only.
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists products, newest first.
    pub async fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        Ok(self.store.list_products().await?)
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Product, DomainError> {
        self.store
            .get_product(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "product",
                id: id.as_i64(),
            })
    }

    #[tracing::instrument(skip(self, input), fields(caller = %caller.id))]
    pub async fn create_product(
        &self,
        caller: &Caller,
        input: ProductInput,
    ) -> Result<Product, DomainError> {
        if !policy::can_manage_catalog(caller) {
            return Err(DomainError::forbidden("Only administrators can manage products"));
        }
        let product = self.insert(input).await?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    #[tracing::instrument(skip(self, changes), fields(caller = %caller.id))]
    pub async fn update_product(
        &self,
        caller: &Caller,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product, DomainError> {
        if !policy::can_manage_catalog(caller) {
            return Err(DomainError::forbidden("Only administrators can manage products"));
        }

        let changes = ProductChanges {
            name: changes.name.as_deref().map(validate_name).transpose()?,
            price: changes.price.map(validate_price).transpose()?,
            image: changes.image.as_deref().map(normalize_image),
            ..changes
        };
        Ok(self.store.update_product(id, changes).await?)
    }

    /// Deletes a product. Fails with `Conflict` while orders reference it.
    #[tracing::instrument(skip(self), fields(caller = %caller.id))]
    pub async fn delete_product(&self, caller: &Caller, id: ProductId) -> Result<(), DomainError> {
        if !policy::can_manage_catalog(caller) {
            return Err(DomainError::forbidden("Only administrators can manage products"));
        }
        self.store.delete_product(id).await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Loads `products` when the catalog is empty. Returns how many were
    /// inserted.
    pub async fn seed_if_empty(&self, products: Vec<ProductInput>) -> Result<usize, DomainError> {
        if self.store.count_products().await? > 0 {
            tracing::debug!("Catalog already populated, skipping seed");
            return Ok(0);
        }

        let count = products.len();
        for input in products {
            self.insert(input).await?;
        }
        tracing::info!(count, "Seeded product catalog");
        Ok(count)
    }

    async fn insert(&self, input: ProductInput) -> Result<Product, DomainError> {
        let product = NewProduct {
            name: validate_name(&input.name)?,
            description: input.description,
            price: validate_price(input.price)?,
            stock: input.stock,
            image: normalize_image(&input.image),
        };
        Ok(self.store.create_product(product).await?)
    }
}
