//! Messaging error types.

use thiserror::Error;

/// Failure delivering a message to the broker.
///
/// Payloads are already-serialized JSON values by the time they reach a
/// publisher, so transport is the only thing left to fail here; the
/// dispatcher treats every occurrence as retryable.
#[derive(Debug, Error)]
#[error("broker transport error: {0}")]
pub struct PublishError(pub String);
