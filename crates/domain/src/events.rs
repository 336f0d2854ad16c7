//! Typed domain events published to the broker.
//!
//! Each topic gets a tagged union with one variant per eventType, so
//! payload schemas are fixed at compile time and serialized only at the
//! broker boundary.

use chrono::{DateTime, Utc};
use common::{CartId, Money, OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::order::{Order, OrderNumber, OrderStatus, PaymentStatus};

/// Trait for events that can be routed to a broker topic.
pub trait DomainEvent: Serialize + Send + Sync {
    /// Returns the destination topic.
    fn topic(&self) -> &'static str;

    /// Returns the partition/routing key.
    fn partition_key(&self) -> String;

    /// Returns the eventType tag.
    fn event_type(&self) -> &'static str;
}

/// Events on the `cart-events` topic, keyed by user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum CartEvent {
    #[serde(rename = "CART_UPDATED", rename_all = "camelCase")]
    Updated {
        user_id: UserId,
        cart_id: CartId,
        total_amount: Money,
        item_count: usize,
        timestamp: DateTime<Utc>,
    },

    #[serde(rename = "CART_CLEARED", rename_all = "camelCase")]
    Cleared {
        user_id: UserId,
        timestamp: DateTime<Utc>,
    },
}

impl CartEvent {
    /// Builds a CART_UPDATED event from the cart's current state.
    pub fn updated(cart: &Cart) -> Self {
        CartEvent::Updated {
            user_id: cart.user_id(),
            cart_id: cart.id(),
            total_amount: cart.total_amount(),
            item_count: cart.item_count(),
            timestamp: Utc::now(),
        }
    }

    /// Builds a CART_CLEARED event.
    pub fn cleared(user_id: UserId) -> Self {
        CartEvent::Cleared {
            user_id,
            timestamp: Utc::now(),
        }
    }

    fn user_id(&self) -> UserId {
        match self {
            CartEvent::Updated { user_id, .. } | CartEvent::Cleared { user_id, .. } => *user_id,
        }
    }
}

impl DomainEvent for CartEvent {
    fn topic(&self) -> &'static str {
        "cart-events"
    }

    fn partition_key(&self) -> String {
        self.user_id().to_string()
    }

    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::Updated { .. } => "CART_UPDATED",
            CartEvent::Cleared { .. } => "CART_CLEARED",
        }
    }
}

/// Events on the `order-events` topic, keyed by order number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum OrderEvent {
    #[serde(rename = "ORDER_CREATED", rename_all = "camelCase")]
    Created {
        order_id: OrderId,
        order_number: OrderNumber,
        user_id: UserId,
        total_amount: Money,
        payment_method: String,
        timestamp: DateTime<Utc>,
    },

    #[serde(rename = "ORDER_STATUS_UPDATED", rename_all = "camelCase")]
    StatusUpdated {
        order_id: OrderId,
        order_number: OrderNumber,
        user_id: UserId,
        status: OrderStatus,
        timestamp: DateTime<Utc>,
    },
}

impl OrderEvent {
    /// Builds an ORDER_CREATED event from a freshly persisted order.
    pub fn created(order: &Order) -> Self {
        OrderEvent::Created {
            order_id: order.id(),
            order_number: order.order_number().clone(),
            user_id: order.user_id(),
            total_amount: order.total_amount(),
            payment_method: order.payment_method().to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Builds an ORDER_STATUS_UPDATED event from the order's current state.
    pub fn status_updated(order: &Order) -> Self {
        OrderEvent::StatusUpdated {
            order_id: order.id(),
            order_number: order.order_number().clone(),
            user_id: order.user_id(),
            status: order.status(),
            timestamp: Utc::now(),
        }
    }

    fn order_number(&self) -> &OrderNumber {
        match self {
            OrderEvent::Created { order_number, .. }
            | OrderEvent::StatusUpdated { order_number, .. } => order_number,
        }
    }
}

impl DomainEvent for OrderEvent {
    fn topic(&self) -> &'static str {
        "order-events"
    }

    fn partition_key(&self) -> String {
        self.order_number().to_string()
    }

    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Created { .. } => "ORDER_CREATED",
            OrderEvent::StatusUpdated { .. } => "ORDER_STATUS_UPDATED",
        }
    }
}

/// Events on the `payment-events` topic, keyed by order number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum PaymentEvent {
    #[serde(rename = "PAYMENT_STATUS_UPDATED", rename_all = "camelCase")]
    StatusUpdated {
        order_id: OrderId,
        order_number: OrderNumber,
        user_id: UserId,
        payment_status: PaymentStatus,
        total_amount: Money,
        timestamp: DateTime<Utc>,
    },
}

impl PaymentEvent {
    /// Builds a PAYMENT_STATUS_UPDATED event from the order's current state.
    pub fn status_updated(order: &Order) -> Self {
        PaymentEvent::StatusUpdated {
            order_id: order.id(),
            order_number: order.order_number().clone(),
            user_id: order.user_id(),
            payment_status: order.payment_status(),
            total_amount: order.total_amount(),
            timestamp: Utc::now(),
        }
    }
}

impl DomainEvent for PaymentEvent {
    fn topic(&self) -> &'static str {
        "payment-events"
    }

    fn partition_key(&self) -> String {
        let PaymentEvent::StatusUpdated { order_number, .. } = self;
        order_number.to_string()
    }

    fn event_type(&self) -> &'static str {
        "PAYMENT_STATUS_UPDATED"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::ProductSnapshot;
    use crate::order::{OrderLine, ShippingAddress};

    fn sample_order() -> Order {
        Order::place(
            UserId::new(9),
            vec![OrderLine::new(5, "Widget", Money::from_cents(1500), 2)],
            ShippingAddress {
                full_name: "Test User".to_string(),
                address_line1: "1 Test St".to_string(),
                address_line2: None,
                city: "Testville".to_string(),
                state: "TS".to_string(),
                postal_code: "00000".to_string(),
                country: "US".to_string(),
                phone_number: None,
            },
            "CREDIT_CARD",
        )
        .unwrap()
    }

    #[test]
    fn cart_updated_carries_tag_and_camel_case_fields() {
        let mut cart = Cart::new(UserId::new(3));
        cart.add_item(&ProductSnapshot::new(7, "Widget", Money::from_cents(1000)), 2)
            .unwrap();

        let event = CartEvent::updated(&cart);
        assert_eq!(event.topic(), "cart-events");
        assert_eq!(event.partition_key(), "3");
        assert_eq!(event.event_type(), "CART_UPDATED");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["eventType"], "CART_UPDATED");
        assert_eq!(json["userId"], 3);
        assert_eq!(json["totalAmount"], 2000);
        assert_eq!(json["itemCount"], 1);
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn cart_cleared_routes_by_user() {
        let event = CartEvent::cleared(UserId::new(12));
        assert_eq!(event.partition_key(), "12");
        assert_eq!(event.event_type(), "CART_CLEARED");
    }

    #[test]
    fn order_created_routes_by_order_number() {
        let order = sample_order();
        let event = OrderEvent::created(&order);
        assert_eq!(event.topic(), "order-events");
        assert_eq!(event.partition_key(), order.order_number().to_string());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["eventType"], "ORDER_CREATED");
        assert_eq!(json["userId"], 9);
        assert_eq!(json["totalAmount"], 3000);
        assert_eq!(json["paymentMethod"], "CREDIT_CARD");
    }

    #[test]
    fn status_updated_carries_wire_status() {
        let mut order = sample_order();
        order.update_status(OrderStatus::Confirmed).unwrap();

        let json = serde_json::to_value(OrderEvent::status_updated(&order)).unwrap();
        assert_eq!(json["eventType"], "ORDER_STATUS_UPDATED");
        assert_eq!(json["status"], "CONFIRMED");
    }

    #[test]
    fn payment_event_carries_payment_status_and_total() {
        let mut order = sample_order();
        order.update_payment_status(PaymentStatus::Completed).unwrap();

        let event = PaymentEvent::status_updated(&order);
        assert_eq!(event.topic(), "payment-events");
        assert_eq!(event.partition_key(), order.order_number().to_string());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["eventType"], "PAYMENT_STATUS_UPDATED");
        assert_eq!(json["paymentStatus"], "COMPLETED");
        assert_eq!(json["totalAmount"], 3000);
    }
}
