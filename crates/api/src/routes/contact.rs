//! Contact form endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{MessageId, UserId};
use domain::ContactDetails;
use serde::{Deserialize, Serialize};
use store::Store;

use super::CustomerResponse;
use crate::auth::{Authenticated, MaybeCaller};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub id: MessageId,
    pub customer: Option<UserId>,
    pub customer_detail: Option<CustomerResponse>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<ContactDetails> for ContactResponse {
    fn from(details: ContactDetails) -> Self {
        Self {
            id: details.message.id,
            customer: details.message.customer_id,
            customer_detail: details.customer.map(Into::into),
            message: details.message.message,
            created_at: details.message.created_at,
        }
    }
}

/// POST /contact — open to anonymous visitors.
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    MaybeCaller(caller): MaybeCaller,
    Json(req): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ContactResponse>), ApiError> {
    let details = state
        .contact
        .create_message(caller.as_ref(), &req.message)
        .await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

/// GET /contact
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
) -> Result<Json<Vec<ContactResponse>>, ApiError> {
    let messages = state.contact.list_messages(&caller).await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

/// GET /contact/{id}
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<ContactResponse>, ApiError> {
    let details = state
        .contact
        .get_message(&caller, MessageId::new(id))
        .await?;
    Ok(Json(details.into()))
}

/// DELETE /contact/{id}
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .contact
        .delete_message(&caller, MessageId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
