//! Order creation and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::{OrderTracking, PlaceOrderRequest};
use common::{Money, OrderId, UserId};
use domain::{Order, OrderNumber, OrderStatus, PaymentStatus, ShippingAddress};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub user_id: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderItemResponse>,
    pub total_amount: Money,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub subtotal: Money,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            id: order.id().to_string(),
            order_number: order.order_number().to_string(),
            user_id: order.user_id().as_i64(),
            status: order.status(),
            payment_status: order.payment_status(),
            items: order
                .lines()
                .iter()
                .map(|line| OrderItemResponse {
                    product_id: line.product_id.as_i64(),
                    product_name: line.product_name.clone(),
                    unit_price: line.unit_price,
                    quantity: line.quantity,
                    subtotal: line.subtotal,
                })
                .collect(),
            total_amount: order.total_amount(),
            shipping_address: order.shipping_address().clone(),
            payment_method: order.payment_method().to_string(),
            created_at: order.created_at().to_rfc3339(),
            updated_at: order.updated_at().to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /api/orders — place a new order.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state.order_service.place_order(req).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /api/orders/:id — load an order by id.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.order_service.get_order(parse_order_id(&id)?).await?;
    Ok(Json(order.into()))
}

/// GET /api/orders/number/:order_number — load an order by number.
#[tracing::instrument(skip(state))]
pub async fn get_by_number(
    State(state): State<Arc<AppState>>,
    Path(order_number): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .order_service
        .get_order_by_number(&OrderNumber::from(order_number))
        .await?;
    Ok(Json(order.into()))
}

/// GET /api/orders/users/:user_id — the user's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state
        .order_service
        .user_orders(UserId::new(user_id))
        .await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// PUT /api/orders/:id/status — move the order to a new status.
#[tracing::instrument(skip(state, req))]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .order_service
        .update_order_status(parse_order_id(&id)?, req.status)
        .await?;
    Ok(Json(order.into()))
}

/// PUT /api/orders/number/:order_number/payment-status — record a
/// payment outcome, applying the status coupling.
#[tracing::instrument(skip(state, req))]
pub async fn update_payment_status(
    State(state): State<Arc<AppState>>,
    Path(order_number): Path<String>,
    Json(req): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .order_service
        .update_payment_status(&OrderNumber::from(order_number), req.payment_status)
        .await?;
    Ok(Json(order.into()))
}

/// GET /api/orders/number/:order_number/tracking — customer tracking view.
#[tracing::instrument(skip(state))]
pub async fn tracking(
    State(state): State<Arc<AppState>>,
    Path(order_number): Path<String>,
) -> Result<Json<OrderTracking>, ApiError> {
    let tracking = state
        .order_service
        .order_tracking(&OrderNumber::from(order_number))
        .await?;
    Ok(Json(tracking))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
