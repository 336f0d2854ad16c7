//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Money, ProductId, UserId};
use domain::Cart;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: i64,
    pub quantity: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub cart_id: String,
    pub user_id: i64,
    pub items: Vec<CartItemResponse>,
    pub total_amount: Money,
    pub item_count: usize,
    pub updated_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub subtotal: Money,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        CartResponse {
            cart_id: cart.id().to_string(),
            user_id: cart.user_id().as_i64(),
            items: cart
                .lines()
                .iter()
                .map(|line| CartItemResponse {
                    product_id: line.product_id.as_i64(),
                    product_name: line.product_name.clone(),
                    unit_price: line.unit_price,
                    quantity: line.quantity,
                    subtotal: line.subtotal,
                })
                .collect(),
            total_amount: cart.total_amount(),
            item_count: cart.item_count(),
            updated_at: cart.updated_at().to_rfc3339(),
        }
    }
}

// -- Handlers --

/// GET /api/cart/users/:user_id — the user's cart (empty if untouched).
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.cart_service.get_cart(UserId::new(user_id)).await?;
    Ok(Json(cart.into()))
}

/// POST /api/cart/users/:user_id/items — add a product to the cart.
#[tracing::instrument(skip(state, req))]
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartResponse>), ApiError> {
    let cart = state
        .cart_service
        .add_to_cart(
            UserId::new(user_id),
            ProductId::new(req.product_id),
            req.quantity,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(cart.into())))
}

/// PUT /api/cart/users/:user_id/items/:product_id — set a line's quantity.
#[tracing::instrument(skip(state, req))]
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path((user_id, product_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .cart_service
        .update_item(
            UserId::new(user_id),
            ProductId::new(product_id),
            req.quantity,
        )
        .await?;
    Ok(Json(cart.into()))
}

/// DELETE /api/cart/users/:user_id/items/:product_id — drop a line.
#[tracing::instrument(skip(state))]
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Path((user_id, product_id)): Path<(i64, i64)>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .cart_service
        .remove_item(UserId::new(user_id), ProductId::new(product_id))
        .await?;
    Ok(Json(cart.into()))
}

/// DELETE /api/cart/users/:user_id — delete the whole cart.
#[tracing::instrument(skip(state))]
pub async fn clear(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.cart_service.clear_cart(UserId::new(user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
