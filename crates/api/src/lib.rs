//! HTTP API server for the cart and order services.
//!
//! Exposes REST endpoints for cart mutations, order creation, and order
//! lifecycle transitions, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use checkout::{CartService, InMemoryProductCatalog, OrderService};
use messaging::{InMemoryEventPublisher, Outbox, OutboxDispatcher};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{CachedCartStore, InMemoryCartStore, InMemoryOrderStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Cart persistence used by the server: in-memory store behind the
/// read-through cache.
pub type Carts = CachedCartStore<InMemoryCartStore>;

/// Cart service as wired by the server.
pub type AppCartService = CartService<Carts, InMemoryProductCatalog>;

/// Order service as wired by the server. The cart service doubles as
/// the cart gateway so order creation can clear carts.
pub type AppOrderService =
    OrderService<InMemoryOrderStore, InMemoryProductCatalog, Arc<AppCartService>>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub cart_service: Arc<AppCartService>,
    pub order_service: AppOrderService,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/cart/users/{user_id}", get(routes::cart::get))
        .route("/api/cart/users/{user_id}", delete(routes::cart::clear))
        .route("/api/cart/users/{user_id}/items", post(routes::cart::add_item))
        .route(
            "/api/cart/users/{user_id}/items/{product_id}",
            put(routes::cart::update_item),
        )
        .route(
            "/api/cart/users/{user_id}/items/{product_id}",
            delete(routes::cart::remove_item),
        )
        .route("/api/orders", post(routes::orders::create))
        .route("/api/orders/{id}", get(routes::orders::get))
        .route("/api/orders/{id}/status", put(routes::orders::update_status))
        .route("/api/orders/number/{order_number}", get(routes::orders::get_by_number))
        .route(
            "/api/orders/number/{order_number}/payment-status",
            put(routes::orders::update_payment_status),
        )
        .route(
            "/api/orders/number/{order_number}/tracking",
            get(routes::orders::tracking),
        )
        .route("/api/orders/users/{user_id}", get(routes::orders::list_for_user))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state wired to in-memory stores.
///
/// Returns the state plus the outbox dispatcher and its publisher; the
/// caller decides whether to spawn the dispatch loop (the server does)
/// or drive it manually (tests do).
pub fn create_default_state(
    catalog: InMemoryProductCatalog,
) -> (
    Arc<AppState>,
    OutboxDispatcher<InMemoryEventPublisher>,
    InMemoryEventPublisher,
) {
    let outbox = Outbox::new();
    let publisher = InMemoryEventPublisher::new();
    let dispatcher = OutboxDispatcher::new(outbox.clone(), publisher.clone());

    let carts = CachedCartStore::new(InMemoryCartStore::new());
    let cart_service = Arc::new(CartService::new(carts, catalog.clone(), outbox.clone()));
    let order_service = OrderService::new(
        InMemoryOrderStore::new(),
        catalog,
        cart_service.clone(),
        outbox,
    );

    let state = Arc::new(AppState {
        cart_service,
        order_service,
    });

    (state, dispatcher, publisher)
}
