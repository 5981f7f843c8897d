use tokio::sync::mpsc;

use crate::state::roster::{PeerId, RequestedRole, Role};

/// Command sent from the transport to the lobby loop, tagged with the
/// sender's connection id
#[derive(Debug, Clone, PartialEq)]
pub enum LobbyCommand {
    // Membership
    Join {
        peer_id: PeerId,
        name: String,
        role: RequestedRole,
    },
    Leave {
        peer_id: PeerId,
    },

    // Requests
    ChangeTeam {
        peer_id: PeerId,
        team: Role,
    },
    SetReady {
        peer_id: PeerId,
        ready: bool,
    },
    StartMatch {
        peer_id: PeerId,
    },
}

impl LobbyCommand {
    pub fn peer_id(&self) -> PeerId {
        match self {
            LobbyCommand::Join { peer_id, .. }
            | LobbyCommand::Leave { peer_id }
            | LobbyCommand::ChangeTeam { peer_id, .. }
            | LobbyCommand::SetReady { peer_id, .. }
            | LobbyCommand::StartMatch { peer_id } => *peer_id,
        }
    }
}

/// Drain everything already queued behind `first`, in arrival order, so a
/// burst of requests is applied as one batch and broadcast once
pub fn drain_pending(
    first: LobbyCommand,
    rx: &mut mpsc::Receiver<LobbyCommand>,
) -> Vec<LobbyCommand> {
    let mut commands = vec![first];
    while let Ok(cmd) = rx.try_recv() {
        commands.push(cmd);
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_keeps_arrival_order() {
        let (tx, mut rx) = mpsc::channel(100);

        tx.send(LobbyCommand::SetReady { peer_id: 1, ready: true }).await.unwrap();
        tx.send(LobbyCommand::ChangeTeam { peer_id: 2, team: Role::TeamB }).await.unwrap();
        tx.send(LobbyCommand::SetReady { peer_id: 1, ready: false }).await.unwrap();
        tx.send(LobbyCommand::Leave { peer_id: 2 }).await.unwrap();

        let first = rx.recv().await.unwrap();
        let commands = drain_pending(first, &mut rx);

        assert_eq!(commands.len(), 4);
        assert!(matches!(commands[0], LobbyCommand::SetReady { ready: true, .. }));
        assert!(matches!(commands[1], LobbyCommand::ChangeTeam { .. }));
        assert!(matches!(commands[2], LobbyCommand::SetReady { ready: false, .. }));
        assert!(matches!(commands[3], LobbyCommand::Leave { peer_id: 2 }));
    }

    #[tokio::test]
    async fn test_drain_with_empty_queue() {
        let (_tx, mut rx) = mpsc::channel::<LobbyCommand>(10);

        let commands = drain_pending(LobbyCommand::StartMatch { peer_id: 3 }, &mut rx);
        assert_eq!(commands, vec![LobbyCommand::StartMatch { peer_id: 3 }]);
    }

    #[test]
    fn test_peer_id_accessor() {
        let cmd = LobbyCommand::ChangeTeam { peer_id: 7, team: Role::TeamB };
        assert_eq!(cmd.peer_id(), 7);
    }
}
