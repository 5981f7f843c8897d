use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::domain::coordinator::{LobbyCoordinator, LobbyUpdate, Notice};
use crate::domain::error::LobbyError;
use crate::handlers::models::ServerMessage;
use crate::state::commands::{drain_pending, LobbyCommand};
use crate::state::roster::RosterSnapshot;
use crate::tick::broadcast::Broadcaster;

/// Everything one drained batch of commands needs to send out
#[derive(Debug, Default)]
struct PendingBroadcast {
    snapshot: Option<RosterSnapshot>,
    can_start: Option<bool>,
    notices: Vec<Notice>,
    match_starting: Option<Uuid>,
}

impl PendingBroadcast {
    fn absorb(&mut self, update: LobbyUpdate) {
        if let Some(snapshot) = update.snapshot {
            if update.match_starting {
                self.match_starting = Some(snapshot.session_id);
            }
            self.snapshot = Some(snapshot);
        }
        if update.can_start.is_some() {
            self.can_start = update.can_start;
        }
        self.notices.extend(update.notices);
    }
}

/// Single owner of the coordinator. Commands are applied one at a time in
/// arrival order; each drained batch is flushed before the next wait.
/// Returns once every command sender is dropped.
pub async fn lobby_loop<B: Broadcaster>(
    mut coordinator: LobbyCoordinator,
    mut command_rx: mpsc::Receiver<LobbyCommand>,
    mut broadcaster: B,
    snapshot_tx: watch::Sender<RosterSnapshot>,
) {
    while let Some(first) = command_rx.recv().await {
        // 1. Drain whatever queued up behind the first command
        let commands = drain_pending(first, &mut command_rx);

        // 2. Apply in order
        let mut pending = PendingBroadcast::default();
        for cmd in commands {
            let peer_id = cmd.peer_id();
            match process_command(&mut coordinator, cmd) {
                Ok(update) => pending.absorb(update),
                Err(e) => {
                    log::debug!("Request from peer {} rejected: {}", peer_id, e);
                    pending.notices.extend(Notice::rejection(peer_id, &e));
                }
            }
        }

        // 3. Flush
        flush(&mut broadcaster, &snapshot_tx, pending).await;
    }

    log::info!("Lobby loop stopped, roster discarded");
}

/// Apply a single command to the coordinator
pub fn process_command(
    coordinator: &mut LobbyCoordinator,
    cmd: LobbyCommand,
) -> Result<LobbyUpdate, LobbyError> {
    match cmd {
        LobbyCommand::Join { peer_id, name, role } => coordinator.join(peer_id, &name, role),
        LobbyCommand::Leave { peer_id } => coordinator.leave(peer_id),
        LobbyCommand::ChangeTeam { peer_id, team } => {
            coordinator.request_team_change(peer_id, team)
        }
        LobbyCommand::SetReady { peer_id, ready } => coordinator.request_ready(peer_id, ready),
        LobbyCommand::StartMatch { peer_id } => coordinator.request_start(peer_id),
    }
}

async fn flush<B: Broadcaster>(
    broadcaster: &mut B,
    snapshot_tx: &watch::Sender<RosterSnapshot>,
    pending: PendingBroadcast,
) {
    if let Some(snapshot) = pending.snapshot {
        log::debug!(
            "Broadcasting roster v{} ({} participants)",
            snapshot.version,
            snapshot.participants.len()
        );
        broadcaster
            .broadcast(&ServerMessage::Roster {
                snapshot: snapshot.clone(),
            })
            .await;
        snapshot_tx.send_replace(snapshot);
    }

    if let Some(can_start) = pending.can_start {
        broadcaster.broadcast(&ServerMessage::CanStart { can_start }).await;
    }

    for notice in &pending.notices {
        broadcaster.send_to(notice.target, &ServerMessage::from(notice)).await;
    }

    if let Some(session_id) = pending.match_starting {
        broadcaster
            .broadcast(&ServerMessage::MatchStarting { session_id })
            .await;
    }
}
