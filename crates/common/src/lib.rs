//! Shared types used across the commerce crates.
//!
//! Provides strongly-typed identifiers and a cents-based money type so
//! that user ids, product ids, and amounts cannot be mixed up.

mod money;
mod types;

pub use money::Money;
pub use types::{CartId, OrderId, ProductId, UserId};
