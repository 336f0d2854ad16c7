//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::{CartError, OrderError};
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client (malformed ids and the like).
    BadRequest(String),
    /// Checkout service error.
    Checkout(CheckoutError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    let status = match &err {
        CheckoutError::ProductNotFound { .. }
        | CheckoutError::CartNotFound { .. }
        | CheckoutError::OrderNotFound { .. } => StatusCode::NOT_FOUND,

        CheckoutError::Cart(CartError::InvalidQuantity { .. })
        | CheckoutError::Order(OrderError::InvalidQuantity { .. })
        | CheckoutError::Order(OrderError::NoItems) => StatusCode::BAD_REQUEST,

        CheckoutError::Cart(CartError::ItemNotFound { .. }) => StatusCode::NOT_FOUND,

        CheckoutError::Order(OrderError::InvalidStatusTransition { .. })
        | CheckoutError::Order(OrderError::InvalidPaymentTransition { .. })
        | CheckoutError::Store(StoreError::VersionConflict { .. })
        | CheckoutError::Store(StoreError::DuplicateOrderNumber { .. }) => StatusCode::CONFLICT,

        CheckoutError::Store(StoreError::OrderNotFound { .. }) => StatusCode::NOT_FOUND,

        CheckoutError::Upstream { .. } => StatusCode::BAD_GATEWAY,
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "upstream failure surfaced to client");
    }
    (status, err.to_string())
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}
