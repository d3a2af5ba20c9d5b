//! Customer account endpoints. Admin only.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Role, UserId};
use domain::{NewAccount, ValidationError};
use serde::Deserialize;
use store::{Store, UserChanges};

use super::CustomerResponse;
use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCustomerRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

/// GET /customers — accounts with the customer role.
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    let customers = state.accounts.list_customers(&caller).await?;
    Ok(Json(customers.into_iter().map(Into::into).collect()))
}

/// GET /customers/{id}
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let user = state
        .accounts
        .get_customer(&caller, UserId::new(id))
        .await?;
    Ok(Json(user.into()))
}

/// POST /customers
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let account = NewAccount {
        email: req.email,
        username: req.username,
        first_name: req.first_name,
        last_name: req.last_name,
    };
    let user = state.accounts.create_customer(&caller, account).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PATCH /customers/{id}
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let changes = UserChanges {
        username: req.username,
        first_name: req.first_name,
        last_name: req.last_name,
        role: None,
    };
    let user = state
        .accounts
        .update_customer(&caller, UserId::new(id), changes)
        .await?;
    Ok(Json(user.into()))
}

/// PUT /customers/{id}/role
pub async fn set_role<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
    Json(req): Json<SetRoleRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let role: Role = req
        .role
        .parse()
        .map_err(|e: common::ParseEnumError| ValidationError::field("role", e.to_string()))
        .map_err(domain::DomainError::from)?;
    let user = state
        .accounts
        .set_role(&caller, UserId::new(id), role)
        .await?;
    Ok(Json(user.into()))
}

/// DELETE /customers/{id} — also deletes the customer's orders.
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .accounts
        .delete_customer(&caller, UserId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
