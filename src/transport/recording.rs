//! In-memory transport
//!
//! Stands in for a real BLE stack: records the published descriptor, every
//! registered channel and every transmitted payload, and lets callers
//! simulate peers coming and going.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::{ChannelHandle, HidTransport, PeerAddress, PeerHandle, ReportDirection};
use crate::connection::ConnectionStatus;
use crate::error::{ControllerError, Result};

/// One payload handed to [`HidTransport::transmit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    pub channel: ChannelHandle,
    pub report_id: u8,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
struct Recorded {
    descriptor: Option<Vec<u8>>,
    descriptor_publications: usize,
    channels: Vec<(u8, ReportDirection)>,
    transmissions: Vec<Transmission>,
    peers: BTreeMap<u16, PeerAddress>,
    next_peer: u16,
    disconnect_requests: Vec<PeerHandle>,
    /// Address that reconnects when dropped, and how many more times
    sticky: Option<(PeerAddress, usize)>,
}

/// Transport that keeps everything in memory
pub struct RecordingTransport {
    status: Arc<ConnectionStatus>,
    inner: Mutex<Recorded>,
}

impl RecordingTransport {
    pub fn new(status: Arc<ConnectionStatus>) -> Self {
        Self {
            status,
            inner: Mutex::new(Recorded::default()),
        }
    }

    /// Simulate a peer connecting
    pub fn connect_peer(&self, address: PeerAddress) -> PeerHandle {
        let peer = {
            let mut inner = self.inner.lock();
            let peer = PeerHandle(inner.next_peer);
            inner.next_peer = inner.next_peer.wrapping_add(1);
            inner.peers.insert(peer.0, address);
            peer
        };
        self.status.on_connect(peer, address);
        peer
    }

    /// Simulate a peer dropping the link
    pub fn drop_peer(&self, peer: PeerHandle) {
        let removed = self.inner.lock().peers.remove(&peer.0).is_some();
        if removed {
            self.status.on_disconnect(peer);
        }
    }

    /// Make `address` reconnect right after the next `times` disconnects
    pub fn set_sticky_peer(&self, address: PeerAddress, times: usize) {
        self.inner.lock().sticky = Some((address, times));
    }

    pub fn descriptor(&self) -> Option<Vec<u8>> {
        self.inner.lock().descriptor.clone()
    }

    pub fn descriptor_publications(&self) -> usize {
        self.inner.lock().descriptor_publications
    }

    /// Registered channels as (report id, direction), in registration order
    pub fn channels(&self) -> Vec<(u8, ReportDirection)> {
        self.inner.lock().channels.clone()
    }

    pub fn transmissions(&self) -> Vec<Transmission> {
        self.inner.lock().transmissions.clone()
    }

    /// Payloads sent for one report id
    pub fn sent(&self, report_id: u8) -> Vec<Vec<u8>> {
        self.inner
            .lock()
            .transmissions
            .iter()
            .filter(|t| t.report_id == report_id)
            .map(|t| t.bytes.clone())
            .collect()
    }

    /// Remove and return everything transmitted so far
    pub fn take_transmissions(&self) -> Vec<Transmission> {
        std::mem::take(&mut self.inner.lock().transmissions)
    }

    pub fn disconnect_requests(&self) -> Vec<PeerHandle> {
        self.inner.lock().disconnect_requests.clone()
    }
}

#[async_trait]
impl HidTransport for RecordingTransport {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn transmit(&self, channel: ChannelHandle, bytes: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        let (report_id, _) = inner
            .channels
            .get(channel.0 as usize)
            .copied()
            .ok_or_else(|| ControllerError::Transport(format!("unknown channel {}", channel.0)))?;
        inner.transmissions.push(Transmission {
            channel,
            report_id,
            bytes: bytes.to_vec(),
        });
        Ok(())
    }

    async fn register_report_channel(
        &self,
        report_id: u8,
        direction: ReportDirection,
    ) -> Result<ChannelHandle> {
        let mut inner = self.inner.lock();
        let handle = ChannelHandle(inner.channels.len() as u16);
        inner.channels.push((report_id, direction));
        debug!(report_id, ?direction, channel = handle.0, "Registered report channel");
        Ok(handle)
    }

    async fn list_connected_peers(&self) -> Vec<PeerHandle> {
        self.inner.lock().peers.keys().map(|id| PeerHandle(*id)).collect()
    }

    async fn disconnect(&self, peer: PeerHandle) -> Result<()> {
        let (removed, sticky) = {
            let mut inner = self.inner.lock();
            inner.disconnect_requests.push(peer);
            let removed = inner.peers.remove(&peer.0);
            let sticky = match (removed, inner.sticky.as_mut()) {
                (Some(address), Some((sticky, times))) if address == *sticky && *times > 0 => {
                    *times -= 1;
                    Some(address)
                }
                _ => None,
            };
            (removed, sticky)
        };

        if removed.is_none() {
            return Err(ControllerError::Transport(format!("unknown peer {}", peer.0)));
        }
        self.status.on_disconnect(peer);

        if let Some(address) = sticky {
            self.connect_peer(address);
        }
        Ok(())
    }

    async fn peer_address(&self, peer: PeerHandle) -> Option<PeerAddress> {
        self.inner.lock().peers.get(&peer.0).copied()
    }

    async fn publish_descriptor(&self, descriptor: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.descriptor = Some(descriptor.to_vec());
        inner.descriptor_publications += 1;
        Ok(())
    }
}
