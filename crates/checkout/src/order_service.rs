//! Order creation orchestration and lifecycle transitions.
//!
//! Order creation has one durable effect, the order insert. Everything
//! before it (product resolution) must succeed for all items or nothing
//! is persisted; everything after it (cart clear, event emission) is
//! best-effort and never fails the request.

use chrono::{DateTime, Duration, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{
    Order, OrderError, OrderEvent, OrderLine, OrderNumber, OrderStatus, PaymentEvent,
    PaymentStatus, ShippingAddress,
};
use messaging::Outbox;
use serde::{Deserialize, Serialize};
use store::OrderStore;

use crate::catalog::{resolve_product, ProductCatalog};
use crate::config::CheckoutConfig;
use crate::error::CheckoutError;
use crate::gateway::CartGateway;

/// One requested line of a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Everything needed to place an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub user_id: UserId,
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
}

/// Customer-facing tracking view of an order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTracking {
    pub order_number: String,
    pub status: OrderStatus,
    pub status_description: String,
    pub last_updated: DateTime<Utc>,
    pub estimated_delivery: String,
}

/// Order workflow over a store, catalog, and cart gateway.
pub struct OrderService<O, C, G> {
    orders: O,
    catalog: C,
    cart_gateway: G,
    outbox: Outbox,
    config: CheckoutConfig,
}

impl<O, C, G> OrderService<O, C, G>
where
    O: OrderStore,
    C: ProductCatalog,
    G: CartGateway,
{
    /// Creates a service with default timeouts.
    pub fn new(orders: O, catalog: C, cart_gateway: G, outbox: Outbox) -> Self {
        Self::with_config(orders, catalog, cart_gateway, outbox, CheckoutConfig::default())
    }

    pub fn with_config(
        orders: O,
        catalog: C,
        cart_gateway: G,
        outbox: Outbox,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            orders,
            catalog,
            cart_gateway,
            outbox,
            config,
        }
    }

    /// Places a new order.
    ///
    /// Every requested product is resolved against the catalog up front;
    /// any missing product or catalog failure aborts the whole request
    /// with nothing persisted. After the insert the user's cart is
    /// cleared and an ORDER_CREATED event recorded, both best-effort.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<Order, CheckoutError> {
        if request.items.is_empty() {
            return Err(OrderError::NoItems.into());
        }
        for item in &request.items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    quantity: item.quantity,
                }
                .into());
            }
        }

        // All-or-nothing product resolution before anything is persisted.
        let mut lines = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let snapshot = resolve_product(
                &self.catalog,
                item.product_id,
                self.config.product_lookup_timeout,
            )
            .await?;
            lines.push(OrderLine::new(
                snapshot.product_id,
                snapshot.name,
                snapshot.unit_price,
                item.quantity,
            ));
        }

        let order = Order::place(
            request.user_id,
            lines,
            request.shipping_address,
            request.payment_method,
        )?;

        self.orders.insert(&order).await?;
        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(
            order_number = %order.order_number(),
            total = %order.total_amount(),
            "order placed"
        );

        self.clear_cart_best_effort(request.user_id).await;
        self.outbox.record(&OrderEvent::created(&order)).await;

        Ok(order)
    }

    /// Loads an order by id.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, CheckoutError> {
        self.orders
            .get(order_id)
            .await?
            .ok_or_else(|| CheckoutError::OrderNotFound {
                reference: order_id.to_string(),
            })
    }

    /// Loads an order by its order number.
    pub async fn get_order_by_number(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Order, CheckoutError> {
        self.orders
            .get_by_number(order_number)
            .await?
            .ok_or_else(|| CheckoutError::OrderNotFound {
                reference: order_number.to_string(),
            })
    }

    /// Returns a user's orders, newest first.
    pub async fn user_orders(&self, user_id: UserId) -> Result<Vec<Order>, CheckoutError> {
        Ok(self.orders.list_for_user(user_id).await?)
    }

    /// Moves an order to a new fulfillment status and emits the
    /// corresponding event.
    #[tracing::instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, CheckoutError> {
        let mut order = self.get_order(order_id).await?;
        order.update_status(status)?;
        self.orders.update(&order).await?;

        self.outbox.record(&OrderEvent::status_updated(&order)).await;
        Ok(order)
    }

    /// Moves an order to a new payment status, applying the coupling to
    /// the fulfillment status, and emits payment and (if the coupling
    /// fired) order status events.
    #[tracing::instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        order_number: &OrderNumber,
        payment_status: PaymentStatus,
    ) -> Result<Order, CheckoutError> {
        let mut order = self.get_order_by_number(order_number).await?;
        let status_before = order.status();
        order.update_payment_status(payment_status)?;
        self.orders.update(&order).await?;

        self.outbox.record(&PaymentEvent::status_updated(&order)).await;
        if order.status() != status_before {
            self.outbox.record(&OrderEvent::status_updated(&order)).await;
        }
        Ok(order)
    }

    /// Returns the tracking view for an order number.
    pub async fn order_tracking(
        &self,
        order_number: &OrderNumber,
    ) -> Result<OrderTracking, CheckoutError> {
        let order = self.get_order_by_number(order_number).await?;
        Ok(OrderTracking {
            order_number: order.order_number().to_string(),
            status: order.status(),
            status_description: order.status().description().to_string(),
            last_updated: order.updated_at(),
            estimated_delivery: (order.created_at() + Duration::days(7))
                .format("%Y-%m-%d")
                .to_string(),
        })
    }

    async fn clear_cart_best_effort(&self, user_id: UserId) {
        let clear = self.cart_gateway.clear_cart(user_id);
        match tokio::time::timeout(self.config.cart_clear_timeout, clear).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                metrics::counter!("order_cart_clear_failures_total").increment(1);
                tracing::warn!(%user_id, error = %e, "cart clear after order failed");
            }
            Err(_) => {
                metrics::counter!("order_cart_clear_failures_total").increment(1);
                tracing::warn!(%user_id, "cart clear after order timed out");
            }
        }
    }
}
