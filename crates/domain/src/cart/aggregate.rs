//! Cart aggregate implementation.

use chrono::{DateTime, Duration, Utc};
use common::{CartId, Money, ProductId, UserId};
use serde::{Deserialize, Serialize};

use super::CartError;

/// Authoritative name/price for a product, resolved by the product
/// lookup client at the moment an item is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
}

impl ProductSnapshot {
    /// Creates a new product snapshot.
    pub fn new(product_id: impl Into<ProductId>, name: impl Into<String>, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
        }
    }
}

/// A line item in a cart.
///
/// Name and unit price are snapshots taken when the item was first
/// added; later catalog changes do not flow back into the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub subtotal: Money,
}

impl CartLine {
    fn from_snapshot(snapshot: &ProductSnapshot, quantity: u32) -> Self {
        Self {
            product_id: snapshot.product_id,
            product_name: snapshot.name.clone(),
            unit_price: snapshot.unit_price,
            quantity,
            subtotal: snapshot.unit_price.multiply(quantity),
        }
    }
}

/// Cart aggregate root: one per user, lazily created on first add.
///
/// Invariants held after every mutation:
/// - `total_amount` equals the sum of all line subtotals
/// - a product id identifies at most one line
/// - `updated_at` strictly increases
///
/// `version` is the optimistic-concurrency token checked by the cart
/// store on save; mutations never change it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    id: CartId,
    user_id: UserId,
    lines: Vec<CartLine>,
    total_amount: Money,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// Query methods
impl Cart {
    /// Creates a new, empty cart for a user at version 0 (not yet persisted).
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::new(),
            user_id,
            lines: Vec::new(),
            total_amount: Money::zero(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the cart identifier.
    pub fn id(&self) -> CartId {
        self.id
    }

    /// Returns the owning user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the line items in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns the line for a product, if present.
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Returns the number of distinct line items.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the derived total.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Returns the version as of the last load/save.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sets the version. Called by the cart store after a successful save.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
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

// Mutation methods
impl Cart {
    /// Adds a quantity of a product to the cart.
    ///
    /// If a line for the product already exists, the quantity accumulates
    /// and the subtotal is recomputed from the line's stored unit price;
    /// adding more of an already-carted item does not re-price it. A new
    /// line is appended otherwise, priced from the snapshot.
    pub fn add_item(&mut self, snapshot: &ProductSnapshot, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == snapshot.product_id)
        {
            line.quantity = line.quantity.saturating_add(quantity);
            line.subtotal = line.unit_price.multiply(line.quantity);
        } else {
            self.lines.push(CartLine::from_snapshot(snapshot, quantity));
        }

        self.recompute_total();
        self.touch();
        Ok(())
    }

    /// Replaces the quantity of an existing line.
    ///
    /// The subtotal is recomputed from the stored unit price. Fails with
    /// `ItemNotFound` (leaving the cart unmodified) if no line exists.
    pub fn update_item_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(CartError::ItemNotFound { product_id })?;

        line.quantity = quantity;
        line.subtotal = line.unit_price.multiply(quantity);

        self.recompute_total();
        self.touch();
        Ok(())
    }

    /// Removes the line for a product. A no-op (not an error) if absent.
    ///
    /// Returns true if a line was removed.
    pub fn remove_item(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == before {
            return false;
        }

        self.recompute_total();
        self.touch();
        true
    }

    fn recompute_total(&mut self) {
        self.total_amount = self.lines.iter().map(|l| l.subtotal).sum();
    }

    fn touch(&mut self) {
        let now = Utc::now();
        // updated_at must strictly increase even under coarse clocks
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::nanoseconds(1)
        };
    }
}
