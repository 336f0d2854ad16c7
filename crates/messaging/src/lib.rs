//! Event notification for the commerce services.
//!
//! Business operations never publish to the broker inline. They enqueue
//! typed domain events on an [`Outbox`] after their state change commits;
//! a background [`OutboxDispatcher`] publishes the queue through an
//! [`EventPublisher`] with retries, so a broker outage can never fail or
//! roll back the triggering operation, yet delivery is at-least-once
//! rather than fire-and-forget.

mod error;
mod outbox;
mod publisher;

pub use error::PublishError;
pub use outbox::{Outbox, OutboxDispatcher, OutboxEntry};
pub use publisher::{EventPublisher, InMemoryEventPublisher, PublishedMessage};
