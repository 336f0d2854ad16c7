//! Cart store contract.

use async_trait::async_trait;
use common::UserId;
use domain::Cart;

use crate::Result;

/// Exclusive owner of one cart aggregate per user.
///
/// Saves are conditional on the cart's version token: a save succeeds
/// only if the stored version still equals the version the caller
/// loaded, which turns concurrent read-modify-write races into
/// `VersionConflict` errors instead of silent lost updates.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Loads the cart for a user. Returns None if no cart is persisted.
    async fn load(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Saves a cart, checking its version against the stored one.
    ///
    /// A cart at version 0 must not already exist; an existing cart must
    /// still be at `cart.version()`. Returns the new stored version.
    async fn save(&self, cart: &Cart) -> Result<u64>;

    /// Deletes the cart for a user entirely.
    ///
    /// Returns true if a cart existed. Deleting an absent cart is not an
    /// error.
    async fn delete(&self, user_id: UserId) -> Result<bool>;
}
