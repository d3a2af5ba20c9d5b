use serde::{Deserialize, Serialize};

/// Declares an integer-backed identifier newtype.
///
/// Identifiers are assigned by the store (sequence values starting at 1) and
/// wrapped so that an order id can never be passed where a product id is
/// expected.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from its raw value.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw value.
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_type!(
    /// Identifier of a user account (customer or admin).
    UserId
);

id_type!(
    /// Identifier of a catalog product.
    ProductId
);

id_type!(
    /// Identifier of an order.
    OrderId
);

id_type!(
    /// Identifier of a single line item within an order.
    OrderItemId
);

id_type!(
    /// Identifier of a contact message.
    MessageId
);
