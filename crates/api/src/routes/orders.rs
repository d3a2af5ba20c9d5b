//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use common::{Money, OrderId, OrderItemId, OrderStatus, ProductId, UserId};
use domain::{
    CreateOrder, DomainError, ItemSpec, LineItem, OrderDetails, UpdateOrder, ValidationError,
};
use serde::{Deserialize, Serialize};
use store::{Product, Store};

use super::{CustomerResponse, double_option};
use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub personalization: String,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Option<UserId>,
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub customer_id: Option<UserId>,
    #[serde(default, deserialize_with = "double_option")]
    pub delivery_date: Option<Option<NaiveDate>>,
    pub notes: Option<String>,
    pub items: Option<Vec<OrderItemRequest>>,
    /// Only accepted through `set_status`; rejected here.
    pub status: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product: ProductId,
    pub product_detail: Product,
    pub quantity: u32,
    pub personalization: String,
    pub subtotal: Money,
}

impl From<LineItem> for OrderItemResponse {
    fn from(item: LineItem) -> Self {
        Self {
            id: item.id,
            product: item.product.id,
            subtotal: item.subtotal(),
            quantity: item.quantity,
            personalization: item.personalization,
            product_detail: item.product,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub customer: CustomerResponse,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub order_date: DateTime<Utc>,
    pub delivery_date: Option<NaiveDate>,
    pub notes: String,
    pub items: Vec<OrderItemResponse>,
    pub total: Money,
}

impl From<OrderDetails> for OrderResponse {
    fn from(details: OrderDetails) -> Self {
        let total = details.total();
        let order = details.order;
        Self {
            id: order.id,
            customer: details.customer.into(),
            status: order.status,
            status_label: order.status.label(),
            order_date: order.order_date,
            delivery_date: order.delivery_date,
            notes: order.notes,
            items: details.items.into_iter().map(Into::into).collect(),
            total,
        }
    }
}

fn item_specs(items: Vec<OrderItemRequest>) -> Result<Vec<ItemSpec>, DomainError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let quantity = u32::try_from(item.quantity)
                .ok()
                .filter(|q| *q > 0)
                .ok_or(ValidationError::InvalidQuantity { index })?;
            Ok(ItemSpec::new(item.product)
                .with_quantity(quantity)
                .with_personalization(item.personalization))
        })
        .collect()
}

// -- Handlers --

/// POST /orders
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let mut cmd = CreateOrder::new(item_specs(req.items)?).with_notes(req.notes);
    cmd.customer_id = req.customer_id;
    cmd.delivery_date = req.delivery_date;

    let details = state.orders.create_order(&caller, cmd).await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

/// GET /orders — the caller's orders, or all of them for admins.
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders(&caller).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/{id}
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let details = state.orders.get_order(&caller, OrderId::new(id)).await?;
    Ok(Json(details.into()))
}

/// PATCH /orders/{id} — partial update; `items` replaces all items.
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    if req.status.is_some() {
        return Err(ApiError::BadRequest(format!(
            "Use POST /orders/{id}/set_status to change the status"
        )));
    }

    let cmd = UpdateOrder {
        customer_id: req.customer_id,
        delivery_date: req.delivery_date,
        notes: req.notes,
        items: req.items.map(item_specs).transpose()?,
    };
    let details = state
        .orders
        .update_order(&caller, OrderId::new(id), cmd)
        .await?;
    Ok(Json(details.into()))
}

/// DELETE /orders/{id}
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.orders.delete_order(&caller, OrderId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /orders/{id}/set_status — admin only.
pub async fn set_status<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let details = state
        .orders
        .set_status(&caller, OrderId::new(id), &req.status)
        .await?;
    Ok(Json(details.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64) -> OrderItemRequest {
        OrderItemRequest {
            product: ProductId::new(1),
            quantity,
            personalization: String::new(),
        }
    }

    #[test]
    fn test_item_specs_reject_non_positive_quantity() {
        assert!(item_specs(vec![item(2)]).is_ok());
        for bad in [0, -3, i64::from(u32::MAX) + 1] {
            let err = item_specs(vec![item(1), item(bad)]).unwrap_err();
            assert!(matches!(
                err,
                DomainError::Validation(ValidationError::InvalidQuantity { index: 1 })
            ));
        }
    }

    #[test]
    fn test_update_request_distinguishes_null_delivery_date() {
        let absent: UpdateOrderRequest = serde_json::from_str(r#"{"notes":"x"}"#).unwrap();
        assert_eq!(absent.delivery_date, None);

        let cleared: UpdateOrderRequest =
            serde_json::from_str(r#"{"delivery_date":null}"#).unwrap();
        assert_eq!(cleared.delivery_date, Some(None));

        let set: UpdateOrderRequest =
            serde_json::from_str(r#"{"delivery_date":"2024-06-01"}"#).unwrap();
        assert_eq!(
            set.delivery_date,
            Some(NaiveDate::from_ymd_opt(2024, 6, 1))
        );
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateOrderRequest =
            serde_json::from_str(r#"{"items":[{"product":4}]}"#).unwrap();
        assert_eq!(req.items[0].quantity, 1);
        assert!(req.notes.is_empty());
        assert!(req.customer_id.is_none());
    }
}
