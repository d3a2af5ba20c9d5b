//! Report builder.

use std::collections::BTreeMap;

use domain::policy::{self, Caller};
use domain::DomainError;
use store::Store;

use crate::report::{Report, TopProduct};

/// Number of entries in `Report::top_products`.
pub const TOP_PRODUCTS_LIMIT: usize = 5;

/// Builds reports from grouped store queries.
///
/// Nothing is cached; the queries run without locks, so a report may
/// straddle a concurrent write.
pub struct ReportingEngine<S: Store> {
    store: S,
}

impl<S: Store> ReportingEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Builds the overview report. Admin only.
    #[tracing::instrument(skip(self), fields(caller = %caller.id))]
    pub async fn build_report(&self, caller: &Caller) -> Result<Report, DomainError> {
        if !policy::can_view_report(caller) {
            return Err(DomainError::Forbidden(
                "Only administrators can view reports".to_string(),
            ));
        }

        let total_orders = self.store.count_orders().await?;
        let total_revenue = self.store.total_revenue().await?;
        let orders_by_status: BTreeMap<String, u64> = self
            .store
            .count_orders_by_status()
            .await?
            .into_iter()
            .map(|(status, count)| (status.as_str().to_string(), count))
            .collect();
        let monthly_sales = self.store.count_orders_by_month().await?;
        let top_products = self
            .store
            .sum_quantity_by_product(TOP_PRODUCTS_LIMIT)
            .await?
            .into_iter()
            .map(TopProduct::from)
            .collect();

        tracing::debug!(total_orders, revenue = %total_revenue, "Report built");
        metrics::counter!("reports_built_total").increment(1);

        Ok(Report {
            total_orders,
            total_revenue,
            orders_by_status,
            monthly_sales,
            top_products,
        })
    }
}
