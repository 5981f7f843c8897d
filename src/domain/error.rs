use thiserror::Error;

use crate::state::roster::{PeerId, Role};

/// Rejections produced by the lobby coordinator.
/// None of these are fatal; the roster is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyError {
    #[error("peer {0} is already in the lobby")]
    DuplicateJoin(PeerId),

    #[error("peer {0} is not in the lobby")]
    UnknownParticipant(PeerId),

    #[error("peer {id} may not switch from {from:?} to {to:?}")]
    ForbiddenTeamChange { id: PeerId, from: Role, to: Role },

    #[error("peer {id} is already on {role:?}")]
    NoOpTeamChange { id: PeerId, role: Role },

    #[error("peer {0} is not the host")]
    NotHost(PeerId),

    #[error("not every participant is ready")]
    NotReadyToStart,

    #[error("the match has already started")]
    MatchAlreadyStarted,

    #[error("server is full ({current}/{max})")]
    ServerFull { current: usize, max: usize },
}

impl LobbyError {
    /// Status line for the affected peer, or None when the error is
    /// only logged
    pub fn notice_text(&self) -> Option<String> {
        match self {
            LobbyError::DuplicateJoin(_) | LobbyError::UnknownParticipant(_) => None,
            LobbyError::ForbiddenTeamChange { from: Role::Inspector, .. } => {
                Some("Inspectors cannot change teams!".to_string())
            }
            LobbyError::ForbiddenTeamChange { .. } => {
                Some("Join as an inspector to spectate.".to_string())
            }
            LobbyError::NoOpTeamChange { role, .. } => {
                Some(format!("You are already on {}!", role.label()))
            }
            LobbyError::NotHost(_) => Some("Only the host can start the match.".to_string()),
            LobbyError::NotReadyToStart => {
                Some("Everyone must be ready before the match can start.".to_string())
            }
            LobbyError::MatchAlreadyStarted => Some("The match has already started.".to_string()),
            LobbyError::ServerFull { .. } => Some("Server is full!".to_string()),
        }
    }
}
