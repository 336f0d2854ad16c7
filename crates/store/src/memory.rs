//! In-memory store implementations for testing and the demo binary.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{Cart, Order, OrderNumber};
use tokio::sync::RwLock;

use crate::{CartStore, OrderStore, Result, StoreError};

/// In-memory cart store keyed by user id.
///
/// Provides the same version-checked save semantics as a real store
/// with a conditional write.
#[derive(Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<UserId, Cart>>>,
}

impl InMemoryCartStore {
    /// Creates a new empty cart store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persisted carts.
    pub async fn cart_count(&self) -> usize {
        self.carts.read().await.len()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn load(&self, user_id: UserId) -> Result<Option<Cart>> {
        Ok(self.carts.read().await.get(&user_id).cloned())
    }

    async fn save(&self, cart: &Cart) -> Result<u64> {
        let mut carts = self.carts.write().await;

        let current = carts.get(&cart.user_id()).map(|c| c.version()).unwrap_or(0);
        if current != cart.version() {
            return Err(StoreError::VersionConflict {
                user_id: cart.user_id(),
                attempted: cart.version(),
                current,
            });
        }

        let new_version = current + 1;
        let mut stored = cart.clone();
        stored.set_version(new_version);
        carts.insert(cart.user_id(), stored);

        Ok(new_version)
    }

    async fn delete(&self, user_id: UserId) -> Result<bool> {
        Ok(self.carts.write().await.remove(&user_id).is_some())
    }
}

/// In-memory order store with a unique index on order numbers.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    inner: Arc<RwLock<OrderStoreState>>,
}

#[derive(Default)]
struct OrderStoreState {
    orders: HashMap<OrderId, Order>,
    by_number: HashMap<OrderNumber, OrderId>,
}

impl InMemoryOrderStore {
    /// Creates a new empty order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut state = self.inner.write().await;

        if state.by_number.contains_key(order.order_number()) {
            return Err(StoreError::DuplicateOrderNumber {
                order_number: order.order_number().clone(),
            });
        }

        state
            .by_number
            .insert(order.order_number().clone(), order.id());
        state.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&order_id).cloned())
    }

    async fn get_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>> {
        let state = self.inner.read().await;
        Ok(state
            .by_number
            .get(order_number)
            .and_then(|id| state.orders.get(id))
            .cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let state = self.inner.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.user_id() == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let mut state = self.inner.write().await;

        if !state.orders.contains_key(&order.id()) {
            return Err(StoreError::OrderNotFound {
                order_id: order.id(),
            });
        }

        state.orders.insert(order.id(), order.clone());
        Ok(())
    }
}
