use std::future::Future;
use std::sync::Arc;
use tokio::net::UdpSocket;

use crate::handlers::models::ServerMessage;
use crate::state::roster::PeerId;
use crate::state::server_state::ServerState;
use crate::utils::buffers::PacketBuffer;

/// Outbound side of the transport, injected into the lobby loop.
/// Delivery is fire-and-forget.
pub trait Broadcaster: Send + 'static {
    fn send_to(&mut self, peer: PeerId, message: &ServerMessage) -> impl Future<Output = ()> + Send;
    fn broadcast(&mut self, message: &ServerMessage) -> impl Future<Output = ()> + Send;
}

/// Sends JSON datagrams over the shared UDP socket
pub struct UdpBroadcaster {
    socket: Arc<UdpSocket>,
    state: Arc<ServerState>,
    buffer: PacketBuffer,
}

impl UdpBroadcaster {
    pub fn new(socket: Arc<UdpSocket>, state: Arc<ServerState>) -> Self {
        Self {
            socket,
            state,
            buffer: PacketBuffer::default(),
        }
    }
}

impl Broadcaster for UdpBroadcaster {
    async fn send_to(&mut self, peer: PeerId, message: &ServerMessage) {
        let Some(addr) = self.state.peer_addr(peer) else {
            log::debug!("No address for peer {}, dropping {:?}", peer, message);
            return;
        };
        match self.buffer.encode(message) {
            Ok(data) => {
                if let Err(e) = self.socket.send_to(data, addr).await {
                    log::debug!("Failed to send to {}: {:?}", addr, e);
                }
            }
            Err(e) => log::error!("Failed to encode message: {}", e),
        }
    }

    async fn broadcast(&mut self, message: &ServerMessage) {
        let data = match self.buffer.encode(message) {
            Ok(data) => data,
            Err(e) => {
                log::error!("Failed to encode message: {}", e);
                return;
            }
        };
        for (_peer_id, addr) in self.state.connected() {
            if let Err(e) = self.socket.send_to(data, addr).await {
                log::debug!("Failed to broadcast to {}: {:?}", addr, e);
            }
        }
    }
}

/// Keeps every outbound message in memory
#[cfg(test)]
#[derive(Clone, Default)]
pub struct RecordingBroadcaster {
    sent: Arc<std::sync::Mutex<Vec<(Option<PeerId>, ServerMessage)>>>,
}

#[cfg(test)]
impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far; `None` target means broadcast
    pub fn sent(&self) -> Vec<(Option<PeerId>, ServerMessage)> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Messages a given peer received, broadcasts included
    pub fn received_by(&self, peer: PeerId) -> Vec<ServerMessage> {
        self.sent()
            .into_iter()
            .filter(|(target, _)| target.map_or(true, |t| t == peer))
            .map(|(_, message)| message)
            .collect()
    }

    fn record(&self, target: Option<PeerId>, message: &ServerMessage) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((target, message.clone()));
        }
    }
}

#[cfg(test)]
impl Broadcaster for RecordingBroadcaster {
    async fn send_to(&mut self, peer: PeerId, message: &ServerMessage) {
        self.record(Some(peer), message);
    }

    async fn broadcast(&mut self, message: &ServerMessage) {
        self.record(None, message);
    }
}
