//! Startup tasks: admin account and initial catalog.

use common::Money;
use domain::{DomainError, ProductInput};
use serde::Deserialize;
use store::Store;
use thiserror::Error;

use crate::config::Config;
use crate::state::AppState;

/// Products loaded into an empty catalog when seeding is enabled.
const SEED_PRODUCTS: &str = include_str!("../seed/products.json");

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Bootstrap failed: {0}")]
    Domain(#[from] DomainError),

    #[error("Invalid product seed file: {0}")]
    Seed(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    #[serde(default)]
    description: String,
    price: Money,
    #[serde(default)]
    stock: u32,
    #[serde(default)]
    image: String,
}

/// Parses the bundled product seed.
pub fn seed_products() -> Result<Vec<ProductInput>, serde_json::Error> {
    let seed: Vec<SeedProduct> = serde_json::from_str(SEED_PRODUCTS)?;
    Ok(seed
        .into_iter()
        .map(|p| ProductInput {
            name: p.name,
            description: p.description,
            price: p.price,
            stock: p.stock,
            image: p.image,
        })
        .collect())
}

/// Ensures the configured admin exists and seeds the catalog if asked to.
pub async fn run<S: Store + Clone>(
    state: &AppState<S>,
    config: &Config,
) -> Result<(), BootstrapError> {
    if let Some(admin) = &config.admin {
        let user = state
            .accounts
            .ensure_admin(&admin.email, &admin.username)
            .await?;
        tracing::info!(user_id = %user.id, email = %user.email, "Admin account ready");
    }

    if config.seed_products {
        let inserted = state.catalog.seed_if_empty(seed_products()?).await?;
        tracing::info!(inserted, "Product seed applied");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use domain::Caller;
    use notifications::Notifier;
    use store::InMemoryStore;

    use super::*;
    use crate::config::AdminAccount;

    #[test]
    fn test_bundled_seed_parses() {
        let products = seed_products().unwrap();
        assert!(!products.is_empty());
        assert!(products.iter().all(|p| !p.price.is_negative()));
    }

    #[tokio::test]
    async fn test_run_creates_admin_and_seeds_once() {
        let state = AppState::new(InMemoryStore::new(), Notifier::disabled());
        let config = Config {
            admin: Some(AdminAccount {
                email: "root@example.com".to_string(),
                username: "root".to_string(),
            }),
            seed_products: true,
            ..Config::default()
        };

        run(&state, &config).await.unwrap();
        run(&state, &config).await.unwrap();

        let expected = seed_products().unwrap().len();
        assert_eq!(state.catalog.list_products().await.unwrap().len(), expected);

        let admin = state
            .accounts
            .ensure_admin("root@example.com", "root")
            .await
            .unwrap();
        assert!(Caller::from(&admin).is_admin());
    }

    #[tokio::test]
    async fn test_run_without_settings_is_noop() {
        let state = AppState::new(InMemoryStore::new(), Notifier::disabled());
        run(&state, &Config::default()).await.unwrap();
        assert!(state.catalog.list_products().await.unwrap().is_empty());
    }
}
