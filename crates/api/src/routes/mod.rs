//! HTTP handlers, grouped by resource.

pub mod contact;
pub mod customers;
pub mod orders;
pub mod products;
pub mod reports;
pub mod system;

use common::{Role, UserId};
use serde::{Deserialize, Deserializer, Serialize};
use store::User;

/// Public view of an account.
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl From<User> for CustomerResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`). Use with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
