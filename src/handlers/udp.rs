use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use crate::handlers::models::{ClientMessage, ServerMessage};
use crate::state::commands::LobbyCommand;
use crate::state::server_state::ServerState;

/// Thin UDP datagram handler - no roster access in the hot path.
/// Parses the datagram, updates the connection registry, and enqueues the
/// resulting command for the lobby loop.
pub async fn handle_udp_packet(
    data: &[u8],
    addr: SocketAddr,
    state: &Arc<ServerState>,
    command_tx: &mpsc::Sender<LobbyCommand>,
    socket: &UdpSocket,
) {
    let Some(message) = parse_message(data, addr) else {
        return;
    };

    if let Some(reply) = route_message(message, addr, state, command_tx) {
        match serde_json::to_vec(&reply) {
            Ok(bytes) => {
                if let Err(e) = socket.send_to(&bytes, addr).await {
                    log::debug!("Failed to reply to {}: {:?}", addr, e);
                }
            }
            Err(e) => log::error!("Failed to encode reply: {}", e),
        }
    }
}

/// Parse a datagram, dropping anything malformed
pub fn parse_message(data: &[u8], addr: SocketAddr) -> Option<ClientMessage> {
    match serde_json::from_slice::<ClientMessage>(data) {
        Ok(message) => Some(message),
        Err(e) => {
            log::debug!("Malformed datagram from {}: {}", addr, e);
            None
        }
    }
}

/// Apply a parsed message to the registry and forward lobby requests.
/// Returns the direct reply for the sender, if any.
pub fn route_message(
    message: ClientMessage,
    addr: SocketAddr,
    state: &ServerState,
    command_tx: &mpsc::Sender<LobbyCommand>,
) -> Option<ServerMessage> {
    // Connect and join run the admission hook; everything else needs an
    // existing connection
    let peer_id = match &message {
        ClientMessage::Connect | ClientMessage::Join { .. } => match state.connect(addr) {
            Ok(peer_id) => peer_id,
            Err(e) => {
                let reason = e.notice_text().unwrap_or_else(|| e.to_string());
                return Some(ServerMessage::Rejected { reason });
            }
        },
        _ => {
            let Some(peer_id) = state.peer_id(&addr) else {
                log::debug!("Datagram from unknown address {}: {:?}", addr, message);
                return None;
            };
            state.touch(&addr);
            peer_id
        }
    };

    let command = match message {
        ClientMessage::Connect => return Some(ServerMessage::Welcome { peer_id }),
        ClientMessage::Heartbeat => return None,
        ClientMessage::Join { name, role } => LobbyCommand::Join { peer_id, name, role },
        ClientMessage::ChangeTeam { team } => LobbyCommand::ChangeTeam { peer_id, team },
        ClientMessage::SetReady { ready } => LobbyCommand::SetReady { peer_id, ready },
        ClientMessage::StartMatch => LobbyCommand::StartMatch { peer_id },
        ClientMessage::Leave => {
            // The registry entry is released only once the leave is queued.
            // Otherwise the idle sweep expires the peer and delivers it.
            if command_tx.try_send(LobbyCommand::Leave { peer_id }).is_err() {
                log::warn!("Command queue full, deferring leave of peer {} to idle sweep", peer_id);
                return None;
            }
            state.disconnect(&addr);
            log::info!("Peer {} at {} disconnected", peer_id, addr);
            return None;
        }
    };

    // Non-blocking send - drop if queue is full
    if command_tx.try_send(command).is_err() {
        log::debug!("Command queue full, dropping request from peer {}", peer_id);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::roster::{RequestedRole, Role};
    use std::net::{IpAddr, Ipv4Addr};

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), port)
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_message(b"not json", addr(9000)).is_none());
        assert!(parse_message(br#"{"type":"set_ready"}"#, addr(9000)).is_none());
    }

    #[test]
    fn test_connect_then_join() {
        let state = ServerState::new(4);
        let (tx, mut rx) = mpsc::channel(16);

        let reply = route_message(ClientMessage::Connect, addr(9000), &state, &tx);
        assert_eq!(reply, Some(ServerMessage::Welcome { peer_id: 1 }));

        let join = ClientMessage::Join {
            name: "Alice".to_string(),
            role: RequestedRole::Inspector,
        };
        assert!(route_message(join, addr(9000), &state, &tx).is_none());
        assert_eq!(
            rx.try_recv().unwrap(),
            LobbyCommand::Join {
                peer_id: 1,
                name: "Alice".to_string(),
                role: RequestedRole::Inspector,
            }
        );
    }

    #[test]
    fn test_request_tagged_with_sender() {
        let state = ServerState::new(4);
        let (tx, mut rx) = mpsc::channel(16);
        route_message(ClientMessage::Connect, addr(9000), &state, &tx);
        route_message(ClientMessage::Connect, addr(9001), &state, &tx);

        route_message(ClientMessage::ChangeTeam { team: Role::TeamB }, addr(9001), &state, &tx);
        assert_eq!(
            rx.try_recv().unwrap(),
            LobbyCommand::ChangeTeam { peer_id: 2, team: Role::TeamB }
        );
    }

    #[test]
    fn test_unknown_address_dropped() {
        let state = ServerState::new(4);
        let (tx, mut rx) = mpsc::channel(16);

        let reply = route_message(ClientMessage::SetReady { ready: true }, addr(9000), &state, &tx);
        assert!(reply.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_full_server_rejects() {
        let state = ServerState::new(1);
        let (tx, _rx) = mpsc::channel(16);
        route_message(ClientMessage::Connect, addr(9000), &state, &tx);

        let reply = route_message(ClientMessage::Connect, addr(9001), &state, &tx);
        assert_eq!(
            reply,
            Some(ServerMessage::Rejected {
                reason: "Server is full!".to_string()
            })
        );
    }

    #[test]
    fn test_leave_disconnects() {
        let state = ServerState::new(4);
        let (tx, mut rx) = mpsc::channel(16);
        route_message(ClientMessage::Connect, addr(9000), &state, &tx);

        route_message(ClientMessage::Leave, addr(9000), &state, &tx);
        assert_eq!(rx.try_recv().unwrap(), LobbyCommand::Leave { peer_id: 1 });
        assert_eq!(state.connection_count(), 0);
    }

    #[test]
    fn test_leave_with_full_queue_keeps_peer_registered() {
        use crate::domain::coordinator::LobbyCoordinator;
        use crate::utils::config::LobbyConfig;

        let state = ServerState::new(4);
        let (tx, mut rx) = mpsc::channel(1);
        let mut lobby = LobbyCoordinator::new(LobbyConfig::default());

        route_message(ClientMessage::Connect, addr(9000), &state, &tx);
        route_message(ClientMessage::Connect, addr(9001), &state, &tx);
        lobby.join(1, "Alice", RequestedRole::Team).unwrap();
        lobby.join(2, "Bob", RequestedRole::Team).unwrap();

        // Queue already holds Bob's ready request
        route_message(ClientMessage::SetReady { ready: true }, addr(9001), &state, &tx);
        route_message(ClientMessage::Leave, addr(9000), &state, &tx);

        // Leave was not queued, so Alice must still be reachable by the sweep
        assert_eq!(state.peer_id(&addr(9000)), Some(1));
        assert_eq!(rx.try_recv().unwrap(), LobbyCommand::SetReady { peer_id: 2, ready: true });
        assert!(rx.try_recv().is_err());

        std::thread::sleep(std::time::Duration::from_millis(5));
        let expired = state.expire_idle(std::time::Duration::from_millis(1));
        assert!(expired.contains(&1));
        for peer_id in expired {
            tx.try_send(LobbyCommand::Leave { peer_id }).unwrap();
            let Ok(LobbyCommand::Leave { peer_id }) = rx.try_recv() else {
                panic!("expected leave");
            };
            lobby.leave(peer_id).unwrap();
        }
        assert!(lobby.participant(1).is_none());
    }
}
