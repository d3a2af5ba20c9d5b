use common::ProductId;
use store::NewOrderItem;

use crate::error::ValidationError;

/// Largest accepted item quantity.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// A requested order item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpec {
    pub product: ProductId,
    pub quantity: u32,
    pub personalization: String,
}

impl ItemSpec {
    /// One unit of `product`, without personalization.
    pub fn new(product: ProductId) -> Self {
        Self {
            product,
            quantity: 1,
            personalization: String::new(),
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_personalization(mut self, personalization: impl Into<String>) -> Self {
        self.personalization = personalization.into();
        self
    }
}

/// Checks item specs and converts them to store rows.
///
/// The list must be non-empty and every quantity in `1..=MAX_QUANTITY`.
/// Product existence is checked by the store inside the write transaction.
pub fn validate_items(specs: Vec<ItemSpec>) -> Result<Vec<NewOrderItem>, ValidationError> {
    if specs.is_empty() {
        return Err(ValidationError::NoItems);
    }

    specs
        .into_iter()
        .enumerate()
        .map(|(index, spec)| {
            if spec.quantity == 0 || spec.quantity > MAX_QUANTITY {
                return Err(ValidationError::InvalidQuantity { index });
            }
            Ok(NewOrderItem {
                product_id: spec.product,
                quantity: spec.quantity,
                personalization: spec.personalization,
            })
        })
        .collect()
}
