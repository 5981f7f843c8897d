use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::coordinator::{Notice, NoticeKind};
use crate::state::roster::{ParticipantRecord, PeerId, RequestedRole, Role, RosterSnapshot};

/// Datagrams peers send to the server

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Connect,
    Join {
        #[serde(default)]
        name: String,
        #[serde(default = "default_requested_role")]
        role: RequestedRole,
    },
    ChangeTeam {
        team: Role,
    },
    SetReady {
        ready: bool,
    },
    StartMatch,
    Leave,
    Heartbeat,
}

fn default_requested_role() -> RequestedRole {
    RequestedRole::Team
}

/// Datagrams the server sends to peers

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        peer_id: PeerId,
    },
    Rejected {
        reason: String,
    },
    Roster {
        snapshot: RosterSnapshot,
    },
    CanStart {
        can_start: bool,
    },
    Notice {
        kind: NoticeKind,
        success: bool,
        message: String,
    },
    MatchStarting {
        session_id: Uuid,
    },
}

impl From<&Notice> for ServerMessage {
    fn from(notice: &Notice) -> Self {
        ServerMessage::Notice {
            kind: notice.kind,
            success: notice.success,
            message: notice.message.clone(),
        }
    }
}

/// HTTP response DTOs

#[derive(Serialize, Deserialize, Debug)]
pub struct ParticipantInfo {
    pub participant: ParticipantRecord,
    pub is_host: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthInfo {
    pub status: String,
    pub connections: usize,
    pub participants: usize,
}
