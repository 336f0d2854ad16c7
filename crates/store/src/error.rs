//! Store error types.

use common::{OrderId, UserId};
use domain::OrderNumber;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The cart was modified by a concurrent writer since it was loaded.
    #[error(
        "Version conflict on cart for user {user_id}: attempted save at version {attempted}, current is {current}"
    )]
    VersionConflict {
        user_id: UserId,
        attempted: u64,
        current: u64,
    },

    /// An order with the same order number already exists.
    #[error("Duplicate order number: {order_number}")]
    DuplicateOrderNumber { order_number: OrderNumber },

    /// Update targeted an order that does not exist.
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
