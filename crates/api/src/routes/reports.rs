//! Reporting endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use reporting::Report;
use store::Store;

use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /reports/overview — admin only.
pub async fn overview<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
) -> Result<Json<Report>, ApiError> {
    Ok(Json(state.reports.build_report(&caller).await?))
}
