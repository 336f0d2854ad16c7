//! Order aggregate and related types.

mod address;
mod aggregate;
mod number;
mod status;

pub use address::ShippingAddress;
pub use aggregate::{Order, OrderLine};
pub use number::OrderNumber;
pub use status::{OrderStatus, PaymentStatus};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order has no line items.
    #[error("Order has no items")]
    NoItems,

    /// Invalid quantity on a line item.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Requested order status is not reachable from the current one.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// Requested payment status is not reachable from the current one.
    #[error("Invalid payment status transition: {from} -> {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },
}
