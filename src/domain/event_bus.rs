//! Broadcast channel for domain events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. The service
//! publishes a [`TesseraEvent`] for every handled request; the summary
//! reporter (and tests) subscribe to observe outcomes.

use tokio::sync::broadcast;

use super::TesseraEvent;

/// Broadcast bus for [`TesseraEvent`]s.
///
/// When the ring buffer is full, the oldest events are dropped for lagging
/// receivers. Publishing never blocks a connection handler.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TesseraEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    /// If there are no active receivers, the event is silently dropped.
    pub fn publish(&self, event: TesseraEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TesseraEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::net::SocketAddr;

    use chrono::Utc;

    use super::*;
    use crate::domain::PoolId;

    fn make_event(pool: PoolId) -> TesseraEvent {
        TesseraEvent::RegistrationRejected {
            pool,
            name: "Mario".to_string(),
            surname: "Rossi".to_string(),
            peer: SocketAddr::from(([127, 0, 0, 1], 5000)),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(make_event(PoolId::Type1)), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(make_event(PoolId::Type2));

        let Ok(event) = rx.recv().await else {
            panic!("expected to receive event");
        };
        assert_eq!(event.pool(), Some(PoolId::Type2));
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.publish(make_event(PoolId::Type3)), 2);

        let (Ok(e1), Ok(e2)) = (rx1.recv().await, rx2.recv().await) else {
            panic!("receivers failed");
        };
        assert_eq!(e1.pool(), e2.pool());
    }

    #[test]
    fn zero_capacity_is_accepted() {
        let bus = EventBus::new(0);
        let _rx = bus.subscribe();
        assert_eq!(bus.publish(make_event(PoolId::Type1)), 1);
    }
}
