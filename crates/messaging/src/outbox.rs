//! Outbox queue and dispatching loop.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use domain::DomainEvent;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::EventPublisher;

const DEFAULT_MAX_RETRIES: u32 = 10;

/// A serialized event awaiting delivery to the broker.
#[derive(Debug, Clone)]
pub struct OutboxEntry {
    pub id: Uuid,
    pub topic: String,
    pub partition_key: String,
    pub payload: Value,
    pub enqueued_at: DateTime<Utc>,
    pub retry_count: u32,
}

#[derive(Default)]
struct OutboxState {
    pending: VecDeque<OutboxEntry>,
    dead_letter: Vec<OutboxEntry>,
}

/// Durable-intent queue for domain events.
///
/// `record` never fails the caller: the one unrecoverable case, a
/// payload that cannot be serialized, is logged and counted rather than
/// surfaced, because the triggering business operation has already
/// committed.
#[derive(Clone, Default)]
pub struct Outbox {
    state: Arc<RwLock<OutboxState>>,
}

impl Outbox {
    /// Creates a new empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event for eventual delivery.
    pub async fn record<E: DomainEvent>(&self, event: &E) {
        let payload = match serde_json::to_value(event) {
            Ok(payload) => payload,
            Err(e) => {
                metrics::counter!("outbox_serialization_failures_total").increment(1);
                tracing::error!(
                    topic = event.topic(),
                    event_type = event.event_type(),
                    error = %e,
                    "failed to serialize event, discarding"
                );
                return;
            }
        };

        let entry = OutboxEntry {
            id: Uuid::new_v4(),
            topic: event.topic().to_string(),
            partition_key: event.partition_key(),
            payload,
            enqueued_at: Utc::now(),
            retry_count: 0,
        };

        metrics::counter!("outbox_recorded_total").increment(1);
        self.state.write().await.pending.push_back(entry);
    }

    /// Returns the number of entries awaiting delivery.
    pub async fn pending_count(&self) -> usize {
        self.state.read().await.pending.len()
    }

    /// Returns the entries that exhausted their retries.
    pub async fn dead_letters(&self) -> Vec<OutboxEntry> {
        self.state.read().await.dead_letter.clone()
    }

    async fn take_batch(&self) -> Vec<OutboxEntry> {
        self.state.write().await.pending.drain(..).collect()
    }

    async fn requeue(&self, entry: OutboxEntry, max_retries: u32) {
        let mut state = self.state.write().await;
        if entry.retry_count > max_retries {
            metrics::counter!("outbox_dead_lettered_total").increment(1);
            tracing::error!(
                topic = %entry.topic,
                key = %entry.partition_key,
                retries = entry.retry_count,
                "event exhausted retries, moving to dead letter"
            );
            state.dead_letter.push(entry);
        } else {
            state.pending.push_back(entry);
        }
    }
}

/// Drains the outbox into an [`EventPublisher`], retrying failures.
pub struct OutboxDispatcher<P> {
    outbox: Outbox,
    publisher: P,
    max_retries: u32,
}

impl<P: EventPublisher> OutboxDispatcher<P> {
    /// Creates a dispatcher with the default retry budget.
    pub fn new(outbox: Outbox, publisher: P) -> Self {
        Self {
            outbox,
            publisher,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Overrides the retry budget before an entry is dead-lettered.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Attempts to deliver every pending entry once.
    ///
    /// Returns the number of entries successfully published. Failed
    /// entries stay pending with an incremented retry count until they
    /// exceed the retry budget.
    pub async fn run_once(&self) -> usize {
        let batch = self.outbox.take_batch().await;
        let mut delivered = 0;

        for mut entry in batch {
            match self
                .publisher
                .publish(&entry.topic, &entry.partition_key, &entry.payload)
                .await
            {
                Ok(()) => {
                    metrics::counter!("outbox_published_total").increment(1);
                    delivered += 1;
                }
                Err(e) => {
                    entry.retry_count += 1;
                    tracing::warn!(
                        topic = %entry.topic,
                        key = %entry.partition_key,
                        retries = entry.retry_count,
                        error = %e,
                        "event publish failed, will retry"
                    );
                    self.outbox.requeue(entry, self.max_retries).await;
                }
            }
        }

        delivered
    }

    /// Runs the dispatch loop forever. Intended for `tokio::spawn`.
    pub async fn run(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryEventPublisher;
    use common::UserId;
    use domain::CartEvent;

    #[tokio::test]
    async fn record_and_dispatch_delivers_to_topic() {
        let outbox = Outbox::new();
        let publisher = InMemoryEventPublisher::new();
        let dispatcher = OutboxDispatcher::new(outbox.clone(), publisher.clone());

        outbox.record(&CartEvent::cleared(UserId::new(42))).await;
        assert_eq!(outbox.pending_count().await, 1);

        assert_eq!(dispatcher.run_once().await, 1);
        assert_eq!(outbox.pending_count().await, 0);

        let messages = publisher.published_to("cart-events");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].key, "42");
        assert_eq!(messages[0].payload["eventType"], "CART_CLEARED");
    }

    #[tokio::test]
    async fn failed_publish_stays_pending_and_is_redelivered() {
        let outbox = Outbox::new();
        let publisher = InMemoryEventPublisher::new();
        let dispatcher = OutboxDispatcher::new(outbox.clone(), publisher.clone());

        outbox.record(&CartEvent::cleared(UserId::new(1))).await;

        publisher.set_fail_on_publish(true);
        assert_eq!(dispatcher.run_once().await, 0);
        assert_eq!(outbox.pending_count().await, 1);

        publisher.set_fail_on_publish(false);
        assert_eq!(dispatcher.run_once().await, 1);
        assert_eq!(outbox.pending_count().await, 0);
        assert_eq!(publisher.published().len(), 1);
    }

    #[tokio::test]
    async fn entries_dead_letter_after_exhausting_retries() {
        let outbox = Outbox::new();
        let publisher = InMemoryEventPublisher::new();
        let dispatcher =
            OutboxDispatcher::new(outbox.clone(), publisher.clone()).with_max_retries(2);

        outbox.record(&CartEvent::cleared(UserId::new(1))).await;
        publisher.set_fail_on_publish(true);

        for _ in 0..3 {
            dispatcher.run_once().await;
        }

        assert_eq!(outbox.pending_count().await, 0);
        let dead = outbox.dead_letters().await;
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].retry_count, 3);
    }

    #[tokio::test]
    async fn dispatch_preserves_order_within_a_run() {
        let outbox = Outbox::new();
        let publisher = InMemoryEventPublisher::new();
        let dispatcher = OutboxDispatcher::new(outbox.clone(), publisher.clone());

        outbox.record(&CartEvent::cleared(UserId::new(1))).await;
        outbox.record(&CartEvent::cleared(UserId::new(2))).await;
        outbox.record(&CartEvent::cleared(UserId::new(3))).await;

        dispatcher.run_once().await;

        let keys: Vec<String> = publisher.published().into_iter().map(|m| m.key).collect();
        assert_eq!(keys, vec!["1", "2", "3"]);
    }
}
