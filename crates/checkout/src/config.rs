//! Tunables for cross-boundary calls and conflict retries.

use std::time::Duration;

/// Timeouts and retry budgets for the checkout services.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Bound on a single product lookup; exceeding it fails the
    /// operation with `UpstreamUnavailable`.
    pub product_lookup_timeout: Duration,

    /// Bound on the best-effort cart clear after order creation;
    /// exceeding it is logged and swallowed.
    pub cart_clear_timeout: Duration,

    /// How many times a cart mutation is retried after a version
    /// conflict before surfacing it to the caller.
    pub max_cart_retries: u32,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            product_lookup_timeout: Duration::from_secs(2),
            cart_clear_timeout: Duration::from_secs(2),
            max_cart_retries: 5,
        }
    }
}
