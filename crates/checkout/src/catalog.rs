//! Product catalog client boundary.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::ProductId;
use domain::ProductSnapshot;
use thiserror::Error;

use crate::error::CheckoutError;

/// Failure talking to the catalog service.
#[derive(Debug, Error)]
#[error("catalog lookup failed: {0}")]
pub struct CatalogError(pub String);

/// Resolves product ids against the catalog service.
///
/// `Ok(None)` means the catalog answered and the product does not
/// exist; `Err` means the catalog could not be reached.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn product(&self, product_id: ProductId) -> Result<Option<ProductSnapshot>, CatalogError>;
}

#[derive(Default)]
struct CatalogState {
    products: HashMap<ProductId, ProductSnapshot>,
    fail_on_lookup: bool,
    lookup_delay: Option<Duration>,
}

/// In-memory catalog for tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryProductCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryProductCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a product.
    pub fn insert(&self, snapshot: ProductSnapshot) {
        self.state
            .write()
            .unwrap()
            .products
            .insert(snapshot.product_id, snapshot);
    }

    /// Makes every lookup fail, simulating an unreachable catalog.
    pub fn set_fail_on_lookup(&self, fail: bool) {
        self.state.write().unwrap().fail_on_lookup = fail;
    }

    /// Delays every lookup, for exercising timeout paths.
    pub fn set_lookup_delay(&self, delay: Option<Duration>) {
        self.state.write().unwrap().lookup_delay = delay;
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn product(&self, product_id: ProductId) -> Result<Option<ProductSnapshot>, CatalogError> {
        let (delay, fail, found) = {
            let state = self.state.read().unwrap();
            (
                state.lookup_delay,
                state.fail_on_lookup,
                state.products.get(&product_id).cloned(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(CatalogError("simulated catalog failure".to_string()));
        }
        Ok(found)
    }
}

/// Resolves a product under a timeout, mapping every failure mode to a
/// checkout error.
pub(crate) async fn resolve_product<C: ProductCatalog>(
    catalog: &C,
    product_id: ProductId,
    timeout: Duration,
) -> Result<ProductSnapshot, CheckoutError> {
    match tokio::time::timeout(timeout, catalog.product(product_id)).await {
        Err(_) => Err(CheckoutError::Upstream {
            service: "product-catalog",
            reason: format!("lookup of product {product_id} timed out"),
        }),
        Ok(Err(e)) => Err(CheckoutError::Upstream {
            service: "product-catalog",
            reason: e.to_string(),
        }),
        Ok(Ok(None)) => Err(CheckoutError::ProductNotFound { product_id }),
        Ok(Ok(Some(snapshot))) => Ok(snapshot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;

    #[tokio::test]
    async fn lookup_returns_registered_snapshot() {
        let catalog = InMemoryProductCatalog::new();
        catalog.insert(ProductSnapshot::new(5, "Widget", Money::from_cents(1500)));

        let snapshot = catalog.product(ProductId::new(5)).await.unwrap().unwrap();
        assert_eq!(snapshot.name, "Widget");
        assert!(catalog.product(ProductId::new(6)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resolve_maps_missing_product() {
        let catalog = InMemoryProductCatalog::new();
        let err = resolve_product(&catalog, ProductId::new(1), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::ProductNotFound { .. }));
    }

    #[tokio::test]
    async fn resolve_maps_slow_catalog_to_upstream() {
        let catalog = InMemoryProductCatalog::new();
        catalog.insert(ProductSnapshot::new(5, "Widget", Money::from_cents(1500)));
        catalog.set_lookup_delay(Some(Duration::from_millis(200)));

        let err = resolve_product(&catalog, ProductId::new(5), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Upstream {
                service: "product-catalog",
                ..
            }
        ));
    }
}
