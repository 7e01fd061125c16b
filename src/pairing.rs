//! Pairing mode: drop the current peer and wait for a different one
//!
//! While waiting, the previous peer is disconnected again every time it
//! reconnects. The wait ends when a different peer connects, when the caller
//! cancels, or when the optional timeout expires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connection::ConnectionStatus;
use crate::error::{ControllerError, Result};
use crate::events::ConnectionEvent;
use crate::transport::{HidTransport, PeerAddress, PeerHandle};

/// Pairing session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairingState {
    #[default]
    Idle,
    AwaitingNewPeer,
    Accepted,
}

pub struct PairingSession {
    transport: Arc<dyn HidTransport>,
    status: Arc<ConnectionStatus>,
    state: Mutex<PairingState>,
    busy: AtomicBool,
}

impl PairingSession {
    pub fn new(transport: Arc<dyn HidTransport>, status: Arc<ConnectionStatus>) -> Self {
        Self {
            transport,
            status,
            state: Mutex::new(PairingState::Idle),
            busy: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> PairingState {
        *self.state.lock()
    }

    fn set_state(&self, state: PairingState) {
        *self.state.lock() = state;
        info!(?state, "Pairing state changed");
        self.status
            .publish(ConnectionEvent::PairingStateChanged { state });
    }

    /// Disconnect the current peer and wait for a different one
    ///
    /// Returns the address of the accepted peer. On cancel or timeout the
    /// session goes back to `Idle`.
    pub async fn enter_pairing_mode(
        &self,
        cancel: CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<PeerAddress> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ControllerError::PairingInProgress);
        }

        let _guard = SessionGuard(self);
        let result = self.run(&cancel, timeout).await;
        match &result {
            Ok(address) => {
                info!(%address, "Pairing accepted new peer");
                self.set_state(PairingState::Accepted);
            }
            Err(e) => {
                info!("Pairing ended without a new peer: {}", e);
                self.set_state(PairingState::Idle);
            }
        }
        result
    }

    async fn run(
        &self,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<PeerAddress> {
        // Subscribe before disconnecting so no connection slips past
        let mut events = self.status.subscribe();

        let mut previous: Option<PeerAddress> = None;
        for peer in self.transport.list_connected_peers().await {
            if let Some(address) = self.transport.peer_address(peer).await {
                previous.get_or_insert(address);
            }
            if let Err(e) = self.transport.disconnect(peer).await {
                warn!(peer = peer.0, "Failed to disconnect peer for pairing: {}", e);
            }
        }
        match previous {
            Some(address) => info!(%address, "Entering pairing mode, previous peer dropped"),
            None => info!("Entering pairing mode"),
        }
        self.set_state(PairingState::AwaitingNewPeer);

        let deadline = async {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Err(ControllerError::PairingCancelled),
                _ = &mut deadline => return Err(ControllerError::PairingTimeout),
                event = events.recv() => match event {
                    Ok(ConnectionEvent::Connected { peer, address }) => {
                        if self.screen(peer, address, previous).await {
                            return Ok(address);
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Pairing fell behind connection events, rescanning peers");
                        if let Some(address) = self.rescan(previous).await {
                            return Ok(address);
                        }
                    }
                    Err(RecvError::Closed) => {
                        return Err(ControllerError::Transport(
                            "connection events closed".to_string(),
                        ));
                    }
                },
            }
        }
    }

    /// Accept a new peer, or drop it again if it is the previous one
    async fn screen(
        &self,
        peer: PeerHandle,
        address: PeerAddress,
        previous: Option<PeerAddress>,
    ) -> bool {
        if previous != Some(address) {
            return true;
        }

        debug!(%address, "Previous peer reconnected during pairing, dropping it");
        if let Err(e) = self.transport.disconnect(peer).await {
            warn!(peer = peer.0, "Failed to drop reconnected peer: {}", e);
        }
        false
    }

    async fn rescan(&self, previous: Option<PeerAddress>) -> Option<PeerAddress> {
        for peer in self.transport.list_connected_peers().await {
            let Some(address) = self.transport.peer_address(peer).await else {
                continue;
            };
            if self.screen(peer, address, previous).await {
                return Some(address);
            }
        }
        None
    }
}

/// Releases the session when the pairing future completes or is dropped
struct SessionGuard<'a>(&'a PairingSession);

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.0.state.lock();
        if *state == PairingState::AwaitingNewPeer {
            *state = PairingState::Idle;
        }
        drop(state);
        self.0.busy.store(false, Ordering::Release);
    }
}
