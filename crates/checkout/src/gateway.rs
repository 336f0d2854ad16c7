//! Cart gateway used by the order workflow.
//!
//! Order creation clears the user's cart through this seam rather than
//! reaching into the cart store directly, so the clear stays
//! best-effort and the order side never learns cart internals.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::UserId;
use thiserror::Error;

/// Failure clearing a cart on behalf of the order workflow.
#[derive(Debug, Error)]
#[error("cart clear failed: {0}")]
pub struct GatewayError(pub String);

/// Clears a user's cart after their order is committed.
#[async_trait]
pub trait CartGateway: Send + Sync {
    async fn clear_cart(&self, user_id: UserId) -> Result<(), GatewayError>;
}

#[async_trait]
impl<G: CartGateway + ?Sized> CartGateway for Arc<G> {
    async fn clear_cart(&self, user_id: UserId) -> Result<(), GatewayError> {
        (**self).clear_cart(user_id).await
    }
}

#[derive(Default)]
struct RecordingState {
    cleared: Vec<UserId>,
    fail_on_clear: bool,
    clear_delay: Option<Duration>,
}

/// Test double that records clears and can be told to fail or stall.
#[derive(Clone, Default)]
pub struct RecordingCartGateway {
    state: Arc<RwLock<RecordingState>>,
}

impl RecordingCartGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the users whose carts were cleared, in order.
    pub fn cleared_users(&self) -> Vec<UserId> {
        self.state.read().unwrap().cleared.clone()
    }

    pub fn set_fail_on_clear(&self, fail: bool) {
        self.state.write().unwrap().fail_on_clear = fail;
    }

    pub fn set_clear_delay(&self, delay: Option<Duration>) {
        self.state.write().unwrap().clear_delay = delay;
    }
}

#[async_trait]
impl CartGateway for RecordingCartGateway {
    async fn clear_cart(&self, user_id: UserId) -> Result<(), GatewayError> {
        let (delay, fail) = {
            let state = self.state.read().unwrap();
            (state.clear_delay, state.fail_on_clear)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(GatewayError("simulated clear failure".to_string()));
        }

        self.state.write().unwrap().cleared.push(user_id);
        Ok(())
    }
}
