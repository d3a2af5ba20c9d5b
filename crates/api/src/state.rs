//! Shared application state.

use domain::{AccountService, CatalogService, ContactService, OrderLifecycleService};
use notifications::Notifier;
use reporting::ReportingEngine;
use store::Store;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub orders: OrderLifecycleService<S>,
    pub catalog: CatalogService<S>,
    pub accounts: AccountService<S>,
    pub contact: ContactService<S>,
    pub reports: ReportingEngine<S>,
}

impl<S: Store + Clone> AppState<S> {
    /// Wires every service to the same store.
    pub fn new(store: S, notifier: Notifier) -> Self {
        Self {
            orders: OrderLifecycleService::new(store.clone(), notifier),
            catalog: CatalogService::new(store.clone()),
            accounts: AccountService::new(store.clone()),
            contact: ContactService::new(store.clone()),
            reports: ReportingEngine::new(store),
        }
    }
}
