//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use checkout::InMemoryProductCatalog;
use common::Money;
use domain::ProductSnapshot;
use messaging::{InMemoryEventPublisher, OutboxDispatcher};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn catalog() -> InMemoryProductCatalog {
    let catalog = InMemoryProductCatalog::new();
    catalog.insert(ProductSnapshot::new(5, "Widget", Money::from_cents(1500)));
    catalog.insert(ProductSnapshot::new(6, "Gadget", Money::from_cents(250)));
    catalog
}

fn setup() -> axum::Router {
    let (state, _, _) = api::create_default_state(catalog());
    api::create_app(state, get_metrics_handle())
}

fn setup_with_events() -> (
    axum::Router,
    OutboxDispatcher<InMemoryEventPublisher>,
    InMemoryEventPublisher,
) {
    let (state, dispatcher, publisher) = api::create_default_state(catalog());
    let app = api::create_app(state, get_metrics_handle());
    (app, dispatcher, publisher)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn shipping_address() -> serde_json::Value {
    serde_json::json!({
        "fullName": "Grace Hopper",
        "addressLine1": "1 Compiler Ct",
        "city": "Arlington",
        "state": "VA",
        "postalCode": "22202",
        "country": "US"
    })
}

#[tokio::test]
async fn health_check() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "commerce-api");
    assert!(json["version"].as_str().is_some());
}

#[tokio::test]
async fn empty_cart_for_new_user() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/api/cart/users/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["userId"], 1);
    assert_eq!(json["itemCount"], 0);
    assert_eq!(json["totalAmount"], 0);
}

#[tokio::test]
async fn cart_add_update_remove_flow() {
    let app = setup();

    let (status, json) = send(
        &app,
        "POST",
        "/api/cart/users/1/items",
        Some(serde_json::json!({"productId": 5, "quantity": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["totalAmount"], 3000);
    assert_eq!(json["items"][0]["productName"], "Widget");
    assert_eq!(json["items"][0]["subtotal"], 3000);

    // Adding the same product again accumulates on one line
    let (_, json) = send(
        &app,
        "POST",
        "/api/cart/users/1/items",
        Some(serde_json::json!({"productId": 5, "quantity": 1})),
    )
    .await;
    assert_eq!(json["itemCount"], 1);
    assert_eq!(json["items"][0]["quantity"], 3);

    let (status, json) = send(
        &app,
        "PUT",
        "/api/cart/users/1/items/5",
        Some(serde_json::json!({"quantity": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalAmount"], 15000);

    let (status, json) = send(&app, "DELETE", "/api/cart/users/1/items/5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["itemCount"], 0);

    let (status, _) = send(&app, "DELETE", "/api/cart/users/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn cart_rejects_zero_quantity_and_unknown_product() {
    let app = setup();

    let (status, _) = send(
        &app,
        "POST",
        "/api/cart/users/1/items",
        Some(serde_json::json!({"productId": 5, "quantity": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &app,
        "POST",
        "/api/cart/users/1/items",
        Some(serde_json::json!({"productId": 999, "quantity": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("999"));
}

#[tokio::test]
async fn updating_item_in_missing_cart_is_not_found() {
    let app = setup();
    let (status, _) = send(
        &app,
        "PUT",
        "/api/cart/users/1/items/5",
        Some(serde_json::json!({"quantity": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_order_and_fetch_it_back() {
    let app = setup();

    let (status, created) = send(
        &app,
        "POST",
        "/api/orders",
        Some(serde_json::json!({
            "userId": 1,
            "items": [
                {"productId": 5, "quantity": 2},
                {"productId": 6, "quantity": 4}
            ],
            "shippingAddress": shipping_address(),
            "paymentMethod": "CREDIT_CARD"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["totalAmount"], 4000);
    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["paymentStatus"], "PENDING");
    assert!(created["orderNumber"].as_str().unwrap().starts_with("ORD-"));

    let id = created["id"].as_str().unwrap();
    let (status, json) = send(&app, "GET", &format!("/api/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], created["id"]);
    assert_eq!(json["items"].as_array().unwrap().len(), 2);
    assert_eq!(json["shippingAddress"]["fullName"], "Grace Hopper");

    let number = created["orderNumber"].as_str().unwrap();
    let (status, json) = send(&app, "GET", &format!("/api/orders/number/{number}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["orderNumber"], created["orderNumber"]);
}

#[tokio::test]
async fn placing_an_order_clears_the_cart() {
    let app = setup();

    send(
        &app,
        "POST",
        "/api/cart/users/1/items",
        Some(serde_json::json!({"productId": 5, "quantity": 2})),
    )
    .await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/orders",
        Some(serde_json::json!({
            "userId": 1,
            "items": [{"productId": 5, "quantity": 2}],
            "shippingAddress": shipping_address(),
            "paymentMethod": "CREDIT_CARD"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, cart) = send(&app, "GET", "/api/cart/users/1", None).await;
    assert_eq!(cart["itemCount"], 0);
}

#[tokio::test]
async fn order_with_unknown_product_is_rejected_whole() {
    let app = setup();

    let (status, _) = send(
        &app,
        "POST",
        "/api/orders",
        Some(serde_json::json!({
            "userId": 1,
            "items": [
                {"productId": 5, "quantity": 1},
                {"productId": 999, "quantity": 1}
            ],
            "shippingAddress": shipping_address(),
            "paymentMethod": "CREDIT_CARD"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, orders) = send(&app, "GET", "/api/orders/users/1", None).await;
    assert_eq!(orders.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn empty_order_is_bad_request() {
    let app = setup();
    let (status, _) = send(
        &app,
        "POST",
        "/api/orders",
        Some(serde_json::json!({
            "userId": 1,
            "items": [],
            "shippingAddress": shipping_address(),
            "paymentMethod": "CREDIT_CARD"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_order_id_format_is_bad_request() {
    let app = setup();
    let (status, _) = send(&app, "GET", "/api/orders/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_order_is_not_found() {
    let app = setup();
    let id = uuid::Uuid::new_v4();
    let (status, _) = send(&app, "GET", &format!("/api/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/api/orders/number/ORD-0-XXXXXXXX", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_transitions_respect_the_state_machine() {
    let app = setup();
    let (_, created) = send(
        &app,
        "POST",
        "/api/orders",
        Some(serde_json::json!({
            "userId": 1,
            "items": [{"productId": 5, "quantity": 1}],
            "shippingAddress": shipping_address(),
            "paymentMethod": "CREDIT_CARD"
        })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/orders/{id}/status"),
        Some(serde_json::json!({"status": "CONFIRMED"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "CONFIRMED");

    // Skipping straight to DELIVERED conflicts with the state machine
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/orders/{id}/status"),
        Some(serde_json::json!({"status": "DELIVERED"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn completed_payment_confirms_the_order() {
    let app = setup();
    let (_, created) = send(
        &app,
        "POST",
        "/api/orders",
        Some(serde_json::json!({
            "userId": 1,
            "items": [{"productId": 5, "quantity": 1}],
            "shippingAddress": shipping_address(),
            "paymentMethod": "CREDIT_CARD"
        })),
    )
    .await;
    let number = created["orderNumber"].as_str().unwrap();

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/orders/number/{number}/payment-status"),
        Some(serde_json::json!({"paymentStatus": "COMPLETED"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["paymentStatus"], "COMPLETED");
    assert_eq!(json["status"], "CONFIRMED");
}

#[tokio::test]
async fn failed_payment_cancels_the_order() {
    let app = setup();
    let (_, created) = send(
        &app,
        "POST",
        "/api/orders",
        Some(serde_json::json!({
            "userId": 1,
            "items": [{"productId": 5, "quantity": 1}],
            "shippingAddress": shipping_address(),
            "paymentMethod": "CREDIT_CARD"
        })),
    )
    .await;
    let number = created["orderNumber"].as_str().unwrap();

    let (_, json) = send(
        &app,
        "PUT",
        &format!("/api/orders/number/{number}/payment-status"),
        Some(serde_json::json!({"paymentStatus": "FAILED"})),
    )
    .await;
    assert_eq!(json["status"], "CANCELLED");

    // Payment cannot recover after failing
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/orders/number/{number}/payment-status"),
        Some(serde_json::json!({"paymentStatus": "COMPLETED"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn tracking_view_has_delivery_estimate() {
    let app = setup();
    let (_, created) = send(
        &app,
        "POST",
        "/api/orders",
        Some(serde_json::json!({
            "userId": 1,
            "items": [{"productId": 5, "quantity": 1}],
            "shippingAddress": shipping_address(),
            "paymentMethod": "CREDIT_CARD"
        })),
    )
    .await;
    let number = created["orderNumber"].as_str().unwrap();

    let (status, json) = send(
        &app,
        "GET",
        &format!("/api/orders/number/{number}/tracking"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["orderNumber"], created["orderNumber"]);
    assert_eq!(json["status"], "PENDING");
    assert_eq!(json["statusDescription"], "Order is being processed");
    // yyyy-mm-dd
    let estimate = json["estimatedDelivery"].as_str().unwrap();
    assert_eq!(estimate.len(), 10);
    assert_eq!(&estimate[4..5], "-");
}

#[tokio::test]
async fn user_order_history_is_newest_first() {
    let app = setup();
    for product in [5, 6] {
        send(
            &app,
            "POST",
            "/api/orders",
            Some(serde_json::json!({
                "userId": 1,
                "items": [{"productId": product, "quantity": 1}],
                "shippingAddress": shipping_address(),
                "paymentMethod": "CREDIT_CARD"
            })),
        )
        .await;
    }

    let (status, json) = send(&app, "GET", "/api/orders/users/1", None).await;
    assert_eq!(status, StatusCode::OK);
    let orders = json.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["totalAmount"], 250);
    assert_eq!(orders[1]["totalAmount"], 1500);
}

#[tokio::test]
async fn api_writes_flow_through_the_outbox() {
    let (app, dispatcher, publisher) = setup_with_events();

    send(
        &app,
        "POST",
        "/api/cart/users/1/items",
        Some(serde_json::json!({"productId": 5, "quantity": 2})),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/orders",
        Some(serde_json::json!({
            "userId": 1,
            "items": [{"productId": 5, "quantity": 2}],
            "shippingAddress": shipping_address(),
            "paymentMethod": "CREDIT_CARD"
        })),
    )
    .await;

    dispatcher.run_once().await;

    let cart_events = publisher.published_to("cart-events");
    assert_eq!(cart_events.len(), 2);
    assert_eq!(cart_events[0].payload["eventType"], "CART_UPDATED");
    assert_eq!(cart_events[1].payload["eventType"], "CART_CLEARED");

    let order_events = publisher.published_to("order-events");
    assert_eq!(order_events.len(), 1);
    assert_eq!(order_events[0].payload["eventType"], "ORDER_CREATED");
    assert_eq!(order_events[0].payload["totalAmount"], 3000);
}

#[tokio::test]
async fn metrics_endpoint_renders_prometheus_text() {
    let app = setup();

    // Generate some traffic first
    send(&app, "GET", "/api/cart/users/1", None).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("text/plain"));
}
