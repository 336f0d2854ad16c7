//! Read-through cache decorator for the cart load path.

use std::time::Duration;

use async_trait::async_trait;
use common::UserId;
use domain::Cart;
use moka::future::Cache;

use crate::{CartStore, Result, StoreError};

const DEFAULT_CAPACITY: u64 = 10_000;
const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Caches cart loads in front of another `CartStore`.
///
/// Writes invalidate the cached entry after the inner store commits
/// (never update it in place), so the next read repopulates from the
/// store. A version-conflicted save also invalidates: the conflict
/// proves the cached entry is stale, and keeping it would feed the
/// same stale state to every retry until the TTL expires. Combined
/// with the store's version-checked save, a stale entry can at worst
/// serve one old read; it can never cause a lost update or pin a
/// writer. Absent carts are not cached.
#[derive(Clone)]
pub struct CachedCartStore<S> {
    inner: S,
    cache: Cache<UserId, Cart>,
}

impl<S: CartStore> CachedCartStore<S> {
    /// Wraps a cart store with default capacity and a 5 minute TTL.
    pub fn new(inner: S) -> Self {
        Self::with_ttl(inner, DEFAULT_TTL)
    }

    /// Wraps a cart store with an explicit entry TTL.
    pub fn with_ttl(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(DEFAULT_CAPACITY)
                .time_to_live(ttl)
                .build(),
        }
    }

}

#[async_trait]
impl<S: CartStore> CartStore for CachedCartStore<S> {
    async fn load(&self, user_id: UserId) -> Result<Option<Cart>> {
        if let Some(cart) = self.cache.get(&user_id).await {
            return Ok(Some(cart));
        }

        let loaded = self.inner.load(user_id).await?;
        if let Some(ref cart) = loaded {
            self.cache.insert(user_id, cart.clone()).await;
        }
        Ok(loaded)
    }

    async fn save(&self, cart: &Cart) -> Result<u64> {
        match self.inner.save(cart).await {
            Ok(version) => {
                self.cache.invalidate(&cart.user_id()).await;
                Ok(version)
            }
            Err(e) => {
                // The cart the caller saved was loaded through this cache;
                // a conflict means that entry no longer matches the store.
                // Drop it so the retry reloads the committed state instead
                // of conflicting again until the TTL expires.
                if matches!(e, StoreError::VersionConflict { .. }) {
                    self.cache.invalidate(&cart.user_id()).await;
                }
                Err(e)
            }
        }
    }

    async fn delete(&self, user_id: UserId) -> Result<bool> {
        let existed = self.inner.delete(user_id).await?;
        self.cache.invalidate(&user_id).await;
        Ok(existed)
    }
}
