//! Seam to the Bluetooth LE stack
//!
//! The stack owns advertising, bonding, encryption and connection
//! supervision. The controller only needs the primitives of [`HidTransport`];
//! the stack reports connections and inbound output reports back through
//! [`ConnectionStatus`](crate::connection::ConnectionStatus).

mod recording;

pub use recording::{RecordingTransport, Transmission};

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::error::{ControllerError, Result};

/// Report characteristic registered with the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle(pub u16);

/// One live connection as numbered by the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerHandle(pub u16);

/// Direction of a report channel, seen from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportDirection {
    /// Device to host (notify)
    Input,
    /// Host to device (write)
    Output,
}

/// Bluetooth device address, most significant byte first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PeerAddress(pub [u8; 6]);

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

impl FromStr for PeerAddress {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ControllerError::Config(format!("invalid peer address: {}", s));
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self(bytes))
    }
}

/// Primitives the controller needs from the BLE stack
#[async_trait]
pub trait HidTransport: Send + Sync {
    /// Get transport name
    fn name(&self) -> &'static str;

    /// Push bytes on a channel to the connected peer (notify, no round-trip)
    ///
    /// Fire-and-forget: success means the stack accepted the bytes.
    async fn transmit(&self, channel: ChannelHandle, bytes: &[u8]) -> Result<()>;

    /// Create the report characteristic for a report id
    async fn register_report_channel(
        &self,
        report_id: u8,
        direction: ReportDirection,
    ) -> Result<ChannelHandle>;

    /// Connections currently open
    async fn list_connected_peers(&self) -> Vec<PeerHandle>;

    /// Drop one connection
    async fn disconnect(&self, peer: PeerHandle) -> Result<()>;

    /// Address of a connected peer
    async fn peer_address(&self, peer: PeerHandle) -> Option<PeerAddress>;

    /// Install the report map; called once, before any transmit
    async fn publish_descriptor(&self, descriptor: &[u8]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_address_round_trip() {
        let address: PeerAddress = "AA:bb:0C:dd:ee:01".parse().unwrap();
        assert_eq!(address.0, [0xAA, 0xBB, 0x0C, 0xDD, 0xEE, 0x01]);
        assert_eq!(address.to_string(), "aa:bb:0c:dd:ee:01");
        assert_eq!(address.to_string().parse::<PeerAddress>().unwrap(), address);
    }

    #[test]
    fn test_peer_address_rejects_malformed() {
        assert!("aa:bb:cc:dd:ee".parse::<PeerAddress>().is_err());
        assert!("aa:bb:cc:dd:ee:ff:00".parse::<PeerAddress>().is_err());
        assert!("aa:bb:cc:dd:ee:zz".parse::<PeerAddress>().is_err());
        assert!("aab:b:cc:dd:ee:ff".parse::<PeerAddress>().is_err());
    }
}
