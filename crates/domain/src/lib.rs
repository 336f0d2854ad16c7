//! Domain layer for the commerce services.
//!
//! This crate provides the two consistency units of the system:
//! - Cart aggregate: per-user line items with derived totals
//! - Order aggregate: immutable line snapshots plus the order/payment
//!   status state machines
//!
//! It also defines the typed domain events published to the broker.

pub mod cart;
pub mod events;
pub mod order;

pub use cart::{Cart, CartError, CartLine, ProductSnapshot};
pub use events::{CartEvent, DomainEvent, OrderEvent, PaymentEvent};
pub use order::{
    Order, OrderError, OrderLine, OrderNumber, OrderStatus, PaymentStatus, ShippingAddress,
};
