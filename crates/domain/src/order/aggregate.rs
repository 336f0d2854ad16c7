//! Order aggregate implementation.

use chrono::{DateTime, Duration, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderNumber, OrderStatus, PaymentStatus, ShippingAddress};

/// A line item in an order.
///
/// All fields are snapshots captured at order-creation time; later
/// catalog changes never flow back into a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub subtotal: Money,
}

impl OrderLine {
    /// Creates a new order line, deriving the subtotal.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            unit_price,
            quantity,
            subtotal: unit_price.multiply(quantity),
        }
    }
}

/// Order aggregate root.
///
/// Created once, atomically, by the order creation orchestrator; only
/// `status`, `payment_status`, and `updated_at` mutate afterward, and
/// both status fields only move forward through their transition tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    order_number: OrderNumber,
    user_id: UserId,
    lines: Vec<OrderLine>,
    total_amount: Money,
    status: OrderStatus,
    shipping_address: ShippingAddress,
    payment_method: String,
    payment_status: PaymentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// Query methods
impl Order {
    /// Returns the order identifier.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the generated order number.
    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    /// Returns the user who placed the order.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the line items.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Returns the fixed total.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Returns the current fulfillment status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the shipping address snapshot.
    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    /// Returns the payment method string.
    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    /// Returns the current payment status.
    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    /// Returns the creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last-mutation timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

// Creation and state transitions
impl Order {
    /// Builds a new order from validated line items.
    ///
    /// The total is fixed here as the sum of line subtotals and the order
    /// starts at (Pending, Pending) with a freshly generated order number.
    pub fn place(
        user_id: UserId,
        lines: Vec<OrderLine>,
        shipping_address: ShippingAddress,
        payment_method: impl Into<String>,
    ) -> Result<Self, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::NoItems);
        }
        for line in &lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    quantity: line.quantity,
                });
            }
        }

        let total_amount = lines.iter().map(|l| l.subtotal).sum();
        let now = Utc::now();

        Ok(Self {
            id: OrderId::new(),
            order_number: OrderNumber::generate(),
            user_id,
            lines,
            total_amount,
            status: OrderStatus::Pending,
            shipping_address,
            payment_method: payment_method.into(),
            payment_status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Moves the order to a new fulfillment status.
    ///
    /// Re-asserting the current status is a no-op success; anything not in
    /// the adjacency table is rejected and leaves the order unmodified.
    pub fn update_status(&mut self, status: OrderStatus) -> Result<(), OrderError> {
        if status == self.status {
            return Ok(());
        }
        if !self.status.can_transition_to(status) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: status,
            });
        }

        self.status = status;
        self.touch();
        Ok(())
    }

    /// Moves the order to a new payment status, applying the coupling rule.
    ///
    /// A Completed payment confirms a still-Pending order; a Failed payment
    /// cancels the order. Both forced moves go through the status table, so
    /// an impossible forced move fails closed without mutating anything.
    pub fn update_payment_status(&mut self, payment_status: PaymentStatus) -> Result<(), OrderError> {
        if payment_status == self.payment_status {
            return Ok(());
        }
        if !self.payment_status.can_transition_to(payment_status) {
            return Err(OrderError::InvalidPaymentTransition {
                from: self.payment_status,
                to: payment_status,
            });
        }

        let forced_status = match payment_status {
            PaymentStatus::Completed if self.status == OrderStatus::Pending => {
                Some(OrderStatus::Confirmed)
            }
            PaymentStatus::Failed => Some(OrderStatus::Cancelled),
            _ => None,
        };

        if let Some(next) = forced_status
            && next != self.status
            && !self.status.can_transition_to(next)
        {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }

        self.payment_status = payment_status;
        if let Some(next) = forced_status {
            self.status = next;
        }
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::nanoseconds(1)
        };
    }
}
