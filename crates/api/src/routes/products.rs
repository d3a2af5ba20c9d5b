//! Product catalog endpoints. Reads are public; writes are admin only.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Money, ProductId};
use domain::ProductInput;
use serde::Deserialize;
use store::{Product, ProductChanges, Store};

use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub image: String,
}

impl From<CreateProductRequest> for ProductInput {
    fn from(req: CreateProductRequest) -> Self {
        ProductInput {
            name: req.name,
            description: req.description,
            price: req.price,
            stock: req.stock,
            image: req.image,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
    pub image: Option<String>,
}

/// GET /products
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalog.list_products().await?))
}

/// GET /products/{id}
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.catalog.get_product(ProductId::new(id)).await?))
}

/// POST /products
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.catalog.create_product(&caller, req.into()).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH /products/{id}
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    let changes = ProductChanges {
        name: req.name,
        description: req.description,
        price: req.price,
        stock: req.stock,
        image: req.image,
    };
    let product = state
        .catalog
        .update_product(&caller, ProductId::new(id), changes)
        .await?;
    Ok(Json(product))
}

/// DELETE /products/{id} — 409 while any order item references it.
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .catalog
        .delete_product(&caller, ProductId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
