//! Connection event types
//!
//! Events the BLE stack reports through [`ConnectionStatus`](crate::connection::ConnectionStatus)
//! and the pairing session publishes while it runs.

use crate::pairing::PairingState;
use crate::transport::{PeerAddress, PeerHandle};

/// Connection lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A peer connected
    Connected {
        peer: PeerHandle,
        address: PeerAddress,
    },

    /// A peer disconnected
    Disconnected { peer: PeerHandle },

    /// Pairing session changed state
    PairingStateChanged { state: PairingState },
}
