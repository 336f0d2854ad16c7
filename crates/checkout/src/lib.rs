//! Cart mutation flow and order creation orchestration.
//!
//! `CartService` drives the read-modify-write cycle on a user's cart
//! (with optimistic-conflict retries and cache invalidation handled by
//! the store layer); `OrderService` runs the order creation workflow:
//! validate every product up front, commit the order once, then run the
//! best-effort steps (cart clear, event emission) that must never fail
//! the request.

pub mod cart_service;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod order_service;

pub use cart_service::CartService;
pub use catalog::{CatalogError, InMemoryProductCatalog, ProductCatalog};
pub use config::CheckoutConfig;
pub use error::CheckoutError;
pub use gateway::{CartGateway, GatewayError, RecordingCartGateway};
pub use order_service::{OrderItemRequest, OrderService, OrderTracking, PlaceOrderRequest};
