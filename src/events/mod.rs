//! Event bus for connection notifications
//!
//! The BLE stack reports connections from its own execution context; the
//! pairing session and any application listeners observe them here.

pub mod types;

pub use types::ConnectionEvent;

use tokio::sync::broadcast;

/// Event channel capacity (ring buffer size)
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Broadcasts connection events to every subscriber
///
/// # Example
///
/// ```no_run
/// use ble_controller::events::{ConnectionEvent, EventBus};
/// use ble_controller::transport::PeerHandle;
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ConnectionEvent::Disconnected { peer: PeerHandle(0) });
///
/// tokio::spawn(async move {
///     while let Ok(event) = rx.recv().await {
///         println!("Received event: {:?}", event);
///     }
/// });
/// ```
pub struct EventBus {
    tx: broadcast::Sender<ConnectionEvent>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish an event to all subscribers
    ///
    /// With no active subscribers the event is dropped.
    pub fn publish(&self, event: ConnectionEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to events published from now on
    ///
    /// A subscriber that falls more than the channel capacity behind gets a
    /// `Lagged` error and misses events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{PeerAddress, PeerHandle};

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(ConnectionEvent::Connected {
            peer: PeerHandle(3),
            address: PeerAddress([1, 2, 3, 4, 5, 6]),
        });

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event,
            ConnectionEvent::Connected {
                peer: PeerHandle(3),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(ConnectionEvent::Disconnected { peer: PeerHandle(0) });

        let event1 = rx1.recv().await.unwrap();
        let event2 = rx2.recv().await.unwrap();

        assert!(matches!(event1, ConnectionEvent::Disconnected { .. }));
        assert!(matches!(event2, ConnectionEvent::Disconnected { .. }));
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::new();

        // No subscriber yet: dropped, not an error
        bus.publish(ConnectionEvent::Disconnected { peer: PeerHandle(0) });

        let mut rx = bus.subscribe();
        bus.publish(ConnectionEvent::Disconnected { peer: PeerHandle(1) });
        assert_eq!(
            rx.recv().await.unwrap(),
            ConnectionEvent::Disconnected { peer: PeerHandle(1) }
        );
        assert!(rx.try_recv().is_err());
    }
}
