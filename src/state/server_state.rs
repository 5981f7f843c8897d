use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::domain::error::LobbyError;
use crate::state::commands::LobbyCommand;
use crate::state::roster::{PeerId, RosterSnapshot};
use crate::utils::buffers::SmallPeerVec;

/// Handle to the running lobby loop
pub struct LobbyHandle {
    pub command_tx: mpsc::Sender<LobbyCommand>,
    pub snapshots: watch::Receiver<RosterSnapshot>,
    pub task_handle: JoinHandle<()>,
}

impl LobbyHandle {
    /// New receiver for roster snapshots. Dropping it unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<RosterSnapshot> {
        self.snapshots.clone()
    }

    pub fn latest(&self) -> RosterSnapshot {
        self.snapshots.borrow().clone()
    }
}

#[derive(Debug, Clone, Copy)]
struct PeerEntry {
    id: PeerId,
    last_seen: Instant,
}

/// Connection registry owned by the transport.
/// Maps addresses to ids in both directions; ids are never reused.
pub struct ServerState {
    peers: DashMap<SocketAddr, PeerEntry>,
    addresses: DashMap<PeerId, SocketAddr>,
    next_peer_id: AtomicU32,
    max_players: usize,
}

impl ServerState {
    pub fn new(max_players: usize) -> Self {
        Self {
            peers: DashMap::new(),
            addresses: DashMap::new(),
            next_peer_id: AtomicU32::new(1),
            max_players,
        }
    }

    /// Generate next peer ID (lock-free)
    pub fn next_peer_id(&self) -> PeerId {
        self.next_peer_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn connection_count(&self) -> usize {
        self.peers.len()
    }

    pub fn peer_id(&self, addr: &SocketAddr) -> Option<PeerId> {
        self.peers.get(addr).map(|entry| entry.id)
    }

    pub fn peer_addr(&self, id: PeerId) -> Option<SocketAddr> {
        self.addresses.get(&id).map(|entry| *entry)
    }

    /// Admit a new connection or return the id it already has
    pub fn connect(&self, addr: SocketAddr) -> Result<PeerId, LobbyError> {
        if let Some(id) = self.peer_id(&addr) {
            self.touch(&addr);
            return Ok(id);
        }

        admit(self.connection_count(), self.max_players)?;

        let id = self.next_peer_id();
        self.peers.insert(
            addr,
            PeerEntry {
                id,
                last_seen: Instant::now(),
            },
        );
        self.addresses.insert(id, addr);
        log::info!(
            "Connection approved for {} as peer {} ({}/{})",
            addr,
            id,
            self.connection_count(),
            self.max_players
        );
        Ok(id)
    }

    /// Refresh liveness; false if the address is not connected
    pub fn touch(&self, addr: &SocketAddr) -> bool {
        match self.peers.get_mut(addr) {
            Some(mut entry) => {
                entry.last_seen = Instant::now();
                true
            }
            None => false,
        }
    }

    pub fn disconnect(&self, addr: &SocketAddr) -> Option<PeerId> {
        let (_, entry) = self.peers.remove(addr)?;
        self.addresses.remove(&entry.id);
        Some(entry.id)
    }

    /// Drop every peer silent for longer than `timeout`, returning their ids
    pub fn expire_idle(&self, timeout: Duration) -> SmallPeerVec {
        let now = Instant::now();
        let idle: Vec<SocketAddr> = self
            .peers
            .iter()
            .filter(|entry| now.duration_since(entry.last_seen) > timeout)
            .map(|entry| *entry.key())
            .collect();

        let mut expired = SmallPeerVec::new();
        for addr in idle {
            if let Some(id) = self.disconnect(&addr) {
                log::info!("Peer {} at {} timed out", id, addr);
                expired.push(id);
            }
        }
        expired
    }

    /// Snapshot of every connected (id, address) pair
    pub fn connected(&self) -> Vec<(PeerId, SocketAddr)> {
        self.addresses
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }
}

/// Connection-admission hook, run before a peer gets an id
pub fn admit(current_connections: usize, max_connections: usize) -> Result<(), LobbyError> {
    if current_connections >= max_connections {
        log::info!(
            "Connection rejected: server full ({}/{})",
            current_connections,
            max_connections
        );
        return Err(LobbyError::ServerFull {
            current: current_connections,
            max: max_connections,
        });
    }
    Ok(())
}
