//! Storage abstractions for carts and orders.
//!
//! Persistence technology is deliberately out of scope; this crate
//! specifies the store contracts (including the cart's optimistic
//! concurrency check) and ships in-memory implementations plus a
//! read-through cache decorator for the cart load path.

mod cache;
mod cart;
mod error;
mod memory;
mod order;

pub use cache::CachedCartStore;
pub use cart::CartStore;
pub use error::{Result, StoreError};
pub use memory::{InMemoryCartStore, InMemoryOrderStore};
pub use order::OrderStore;
