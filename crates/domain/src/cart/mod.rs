//! Cart aggregate and related types.

mod aggregate;

pub use aggregate::{Cart, CartLine, ProductSnapshot};

use common::ProductId;
use thiserror::Error;

/// Errors that can occur during cart mutations.
///
/// These are local validation failures. They are reported to the caller
/// and never retried by the aggregate.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity must be at least 1.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// No line exists for the given product.
    #[error("Item not found in cart: {product_id}")]
    ItemNotFound { product_id: ProductId },
}
