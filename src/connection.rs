//! Connection and output-report handoff from the BLE stack
//!
//! The stack calls into [`ConnectionStatus`] from its own context. Inbound
//! output reports land in a snapshot buffer behind a lock; readers always get
//! a copy, never the buffer the next write goes into.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

use crate::events::{ConnectionEvent, EventBus};
use crate::transport::{PeerAddress, PeerHandle};

/// Connected peers, output-report snapshot and connection events
pub struct ConnectionStatus {
    /// Handles of the open connections; connected while non-empty
    peers: Mutex<BTreeSet<u16>>,
    events: EventBus,
    output: Mutex<Vec<u8>>,
    output_received: AtomicBool,
    /// 0 while output reports are disabled
    output_limit: AtomicUsize,
}

impl ConnectionStatus {
    pub fn new() -> Self {
        Self {
            peers: Mutex::new(BTreeSet::new()),
            events: EventBus::new(),
            output: Mutex::new(Vec::new()),
            output_received: AtomicBool::new(false),
            output_limit: AtomicUsize::new(0),
        }
    }

    /// A peer connected
    pub fn on_connect(&self, peer: PeerHandle, address: PeerAddress) {
        let count = {
            let mut peers = self.peers.lock();
            peers.insert(peer.0);
            peers.len()
        };
        info!(peer = peer.0, %address, count, "Peer connected");
        self.events.publish(ConnectionEvent::Connected { peer, address });
    }

    /// A peer disconnected
    ///
    /// Other connections stay up; the status only drops to disconnected once
    /// the last one goes.
    pub fn on_disconnect(&self, peer: PeerHandle) {
        let count = {
            let mut peers = self.peers.lock();
            peers.remove(&peer.0);
            peers.len()
        };
        info!(peer = peer.0, count, "Peer disconnected");
        self.events.publish(ConnectionEvent::Disconnected { peer });
    }

    /// Inbound output report bytes
    ///
    /// Ignored while output reports are disabled; longer writes are truncated
    /// to the declared report length.
    pub fn on_output_report(&self, bytes: &[u8]) {
        let limit = self.output_limit.load(Ordering::Acquire);
        if limit == 0 {
            trace!(len = bytes.len(), "Output report ignored, not declared");
            return;
        }

        let len = bytes.len().min(limit);
        {
            let mut output = self.output.lock();
            output.clear();
            output.extend_from_slice(&bytes[..len]);
        }
        self.output_received.store(true, Ordering::Release);
        debug!(len, "Output report received");
    }

    /// Accept output reports of up to `len` bytes (0 disables)
    pub fn set_output_capacity(&self, len: usize) {
        self.output_limit.store(len, Ordering::Release);
    }

    /// Replace the peer set with what the stack reports as open
    pub fn sync_peers(&self, connected: &[PeerHandle]) {
        let mut peers = self.peers.lock();
        *peers = connected.iter().map(|peer| peer.0).collect();
        debug!(count = peers.len(), "Peer set synchronized");
    }

    pub fn is_connected(&self) -> bool {
        !self.peers.lock().is_empty()
    }

    /// Whether an output report arrived since the last call
    pub fn is_output_received(&self) -> bool {
        self.output_received.swap(false, Ordering::AcqRel)
    }

    /// Copy of the last output report
    pub fn output_buffer(&self) -> Vec<u8> {
        self.output.lock().clone()
    }

    /// Publish an event on the connection bus
    pub fn publish(&self, event: ConnectionEvent) {
        self.events.publish(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_disconnect_events() {
        let status = ConnectionStatus::new();
        let mut rx = status.subscribe();
        let address: PeerAddress = "01:02:03:04:05:06".parse().unwrap();

        assert!(!status.is_connected());
        status.on_connect(PeerHandle(7), address);
        assert!(status.is_connected());
        assert_eq!(
            rx.recv().await.unwrap(),
            ConnectionEvent::Connected {
                peer: PeerHandle(7),
                address
            }
        );

        status.on_disconnect(PeerHandle(7));
        assert!(!status.is_connected());
        assert_eq!(
            rx.recv().await.unwrap(),
            ConnectionEvent::Disconnected { peer: PeerHandle(7) }
        );
    }

    #[test]
    fn test_connected_until_last_peer_leaves() {
        let status = ConnectionStatus::new();
        status.on_connect(PeerHandle(1), PeerAddress([0xAA; 6]));
        status.on_connect(PeerHandle(2), PeerAddress([0xBB; 6]));

        status.on_disconnect(PeerHandle(1));
        assert!(status.is_connected());

        // Repeated disconnect of a handle already gone
        status.on_disconnect(PeerHandle(1));
        assert!(status.is_connected());

        status.on_disconnect(PeerHandle(2));
        assert!(!status.is_connected());
    }

    #[test]
    fn test_sync_peers() {
        let status = ConnectionStatus::new();
        status.on_connect(PeerHandle(1), PeerAddress([0xAA; 6]));

        status.sync_peers(&[]);
        assert!(!status.is_connected());

        status.sync_peers(&[PeerHandle(4), PeerHandle(5)]);
        status.on_disconnect(PeerHandle(4));
        assert!(status.is_connected());
    }

    #[test]
    fn test_output_report_ignored_when_disabled() {
        let status = ConnectionStatus::new();
        status.on_output_report(&[1, 2, 3]);
        assert!(!status.is_output_received());
        assert!(status.output_buffer().is_empty());
    }

    #[test]
    fn test_output_report_edge_triggered() {
        let status = ConnectionStatus::new();
        status.set_output_capacity(4);

        status.on_output_report(&[9, 8, 7, 6, 5, 4]);
        assert!(status.is_output_received());
        assert!(!status.is_output_received());
        assert_eq!(status.output_buffer(), vec![9, 8, 7, 6]);

        status.on_output_report(&[1]);
        let snapshot = status.output_buffer();
        status.on_output_report(&[2, 2]);
        assert_eq!(snapshot, vec![1]);
        assert_eq!(status.output_buffer(), vec![2, 2]);
    }
}
