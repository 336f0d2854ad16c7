//! Cart mutation service.
//!
//! Every mutation is a full read-modify-write cycle against the cart
//! store: load the latest cart, apply the change, save with the loaded
//! version. A concurrent writer makes the save fail with a version
//! conflict, and the whole cycle is retried from a fresh load so no
//! lines are lost.

use async_trait::async_trait;
use common::{ProductId, UserId};
use domain::{Cart, CartError, CartEvent};
use messaging::Outbox;
use store::{CartStore, StoreError};

use crate::catalog::{resolve_product, ProductCatalog};
use crate::config::CheckoutConfig;
use crate::error::CheckoutError;
use crate::gateway::{CartGateway, GatewayError};

/// Cart operations for one store/catalog pair.
pub struct CartService<S, C> {
    carts: S,
    catalog: C,
    outbox: Outbox,
    config: CheckoutConfig,
}

impl<S: CartStore, C: ProductCatalog> CartService<S, C> {
    /// Creates a service with default timeouts and retry budget.
    pub fn new(carts: S, catalog: C, outbox: Outbox) -> Self {
        Self::with_config(carts, catalog, outbox, CheckoutConfig::default())
    }

    pub fn with_config(carts: S, catalog: C, outbox: Outbox, config: CheckoutConfig) -> Self {
        Self {
            carts,
            catalog,
            outbox,
            config,
        }
    }

    /// Returns the user's cart, or a fresh empty one if none is stored.
    ///
    /// The fresh cart is not persisted; it exists so reads of an
    /// untouched cart return an empty cart rather than a 404.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, user_id: UserId) -> Result<Cart, CheckoutError> {
        Ok(self
            .carts
            .load(user_id)
            .await?
            .unwrap_or_else(|| Cart::new(user_id)))
    }

    /// Adds a quantity of a product to the user's cart, creating the
    /// cart if it does not exist yet.
    ///
    /// The product is resolved against the catalog first (under the
    /// configured timeout) so the stored line carries the price at the
    /// moment of adding.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, CheckoutError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity }.into());
        }

        let snapshot =
            resolve_product(&self.catalog, product_id, self.config.product_lookup_timeout).await?;

        let cart = self
            .mutate(user_id, true, |cart| cart.add_item(&snapshot, quantity))
            .await?;

        metrics::counter!("cart_items_added_total").increment(u64::from(quantity));
        self.outbox.record(&CartEvent::updated(&cart)).await;
        Ok(cart)
    }

    /// Replaces the quantity of an existing line.
    #[tracing::instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, CheckoutError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity }.into());
        }

        let cart = self
            .mutate(user_id, false, |cart| {
                cart.update_item_quantity(product_id, quantity)
            })
            .await?;

        self.outbox.record(&CartEvent::updated(&cart)).await;
        Ok(cart)
    }

    /// Removes a line from the cart. Removing an absent line succeeds
    /// and leaves the cart untouched.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, CheckoutError> {
        let cart = self
            .mutate(user_id, false, |cart| {
                cart.remove_item(product_id);
                Ok(())
            })
            .await?;

        self.outbox.record(&CartEvent::updated(&cart)).await;
        Ok(cart)
    }

    /// Deletes the user's stored cart. Idempotent: clearing an absent
    /// cart succeeds.
    #[tracing::instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: UserId) -> Result<(), CheckoutError> {
        self.carts.delete(user_id).await?;
        self.outbox.record(&CartEvent::cleared(user_id)).await;
        Ok(())
    }

    /// Load-mutate-save cycle with conflict retries.
    async fn mutate<F>(
        &self,
        user_id: UserId,
        create_if_missing: bool,
        apply: F,
    ) -> Result<Cart, CheckoutError>
    where
        F: Fn(&mut Cart) -> Result<(), CartError>,
    {
        let mut attempts = 0;
        loop {
            let mut cart = match self.carts.load(user_id).await? {
                Some(cart) => cart,
                None if create_if_missing => Cart::new(user_id),
                None => return Err(CheckoutError::CartNotFound { user_id }),
            };

            apply(&mut cart)?;

            match self.carts.save(&cart).await {
                Ok(version) => {
                    cart.set_version(version);
                    return Ok(cart);
                }
                Err(StoreError::VersionConflict { .. })
                    if attempts < self.config.max_cart_retries =>
                {
                    attempts += 1;
                    metrics::counter!("cart_save_conflicts_total").increment(1);
                    tracing::debug!(%user_id, attempts, "cart version conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// The order workflow clears carts through the same service.
#[async_trait]
impl<S: CartStore, C: ProductCatalog> CartGateway for CartService<S, C> {
    async fn clear_cart(&self, user_id: UserId) -> Result<(), GatewayError> {
        CartService::clear_cart(self, user_id)
            .await
            .map_err(|e| GatewayError(e.to_string()))
    }
}
