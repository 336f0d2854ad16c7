//! Order store contract.

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{Order, OrderNumber};

use crate::Result;

/// Persistence boundary for orders.
///
/// An order and its lines are inserted as one atomic unit; the order
/// number carries a unique index as a backstop to the generation scheme.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order atomically.
    ///
    /// Fails with `DuplicateOrderNumber` if the number is already taken.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Loads an order by id.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Loads an order by its order number.
    async fn get_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>>;

    /// Returns all orders for a user, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Replaces a stored order after a status/payment transition.
    ///
    /// Fails with `OrderNotFound` if the order was never inserted.
    async fn update(&self, order: &Order) -> Result<()>;
}
