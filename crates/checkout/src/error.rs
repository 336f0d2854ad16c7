//! Checkout error taxonomy.

use common::{ProductId, UserId};
use domain::{CartError, OrderError};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the checkout services.
///
/// NotFound/Validation/Conflict are reported synchronously and never
/// retried here (cart version conflicts are retried internally first).
/// `Upstream` covers transport failures and timeouts on the mandatory
/// product-resolution path; best-effort steps swallow their failures
/// instead of producing this error.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A requested product does not exist in the catalog.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// No persisted cart exists for the user.
    #[error("Cart not found for user {user_id}")]
    CartNotFound { user_id: UserId },

    /// No order matches the given id or order number.
    #[error("Order not found: {reference}")]
    OrderNotFound { reference: String },

    /// Cart validation failure.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Order validation or state-machine failure.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Store-level failure (version conflict after exhausted retries,
    /// duplicate order number).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A required remote dependency failed or timed out.
    #[error("Upstream service '{service}' unavailable: {reason}")]
    Upstream {
        service: &'static str,
        reason: String,
    },
}
