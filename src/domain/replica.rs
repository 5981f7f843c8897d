use crate::state::roster::{LobbyPhase, ParticipantRecord, PeerId, Role, RosterSnapshot};

/// Read-only copy of the roster held by a non-authority peer
#[derive(Debug, Default)]
pub struct RosterReplica {
    latest: Option<RosterSnapshot>,
}

impl RosterReplica {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a snapshot unless an equal or newer version of the same
    /// session is already held. Returns whether it was applied.
    pub fn apply(&mut self, snapshot: RosterSnapshot) -> bool {
        if let Some(current) = &self.latest {
            if current.session_id == snapshot.session_id && current.version >= snapshot.version {
                log::debug!(
                    "Dropping stale roster v{} (holding v{})",
                    snapshot.version,
                    current.version
                );
                return false;
            }
        }
        self.latest = Some(snapshot);
        true
    }

    pub fn version(&self) -> Option<u64> {
        self.latest.as_ref().map(|s| s.version)
    }

    pub fn participants(&self) -> &[ParticipantRecord] {
        self.latest
            .as_ref()
            .map(|s| s.participants.as_slice())
            .unwrap_or(&[])
    }

    pub fn can_start(&self) -> bool {
        self.latest.as_ref().map(|s| s.can_start).unwrap_or(false)
    }

    pub fn phase(&self) -> Option<LobbyPhase> {
        self.latest.as_ref().map(|s| s.phase)
    }

    pub fn is_host(&self, id: PeerId) -> bool {
        self.latest.as_ref().and_then(|s| s.host) == Some(id)
    }

    pub fn local_role(&self, id: PeerId) -> Option<Role> {
        self.participants().iter().find(|p| p.id == id).map(|p| p.role)
    }
}
