use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Connection id assigned by the transport
pub type PeerId = u32;

/// Where a participant sits in the lobby
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    TeamA,
    TeamB,
    Inspector,
}

impl Role {
    pub fn is_team(&self) -> bool {
        !matches!(self, Role::Inspector)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::TeamA => "Team A",
            Role::TeamB => "Team B",
            Role::Inspector => "Inspector",
        }
    }
}

/// Role a peer asks for when joining
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedRole {
    Team,
    Inspector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LobbyPhase {
    Waiting,
    Starting,
}

/// One entry per connected peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub id: PeerId,
    pub display_name: String,
    pub ready: bool,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

impl ParticipantRecord {
    pub fn new(id: PeerId, display_name: String, role: Role) -> Self {
        Self {
            id,
            display_name,
            ready: false,
            role,
            joined_at: Utc::now(),
        }
    }
}

/// Replicated payload pushed to every peer after a mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub session_id: Uuid,
    pub version: u64,
    pub phase: LobbyPhase,
    pub host: Option<PeerId>,
    pub can_start: bool,
    pub max_players: usize,
    pub max_inspectors: usize,
    pub participants: Vec<ParticipantRecord>,
}

/// Server-owned roster. Insertion ordered, at most one record per id.
#[derive(Debug)]
pub struct LobbyRoster {
    session_id: Uuid,
    records: Vec<ParticipantRecord>,
    version: u64,
}

impl LobbyRoster {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            records: Vec::new(),
            version: 0,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: PeerId) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    pub fn get(&self, id: PeerId) -> Option<&ParticipantRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: PeerId) -> Option<&mut ParticipantRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParticipantRecord> {
        self.records.iter()
    }

    /// Returns false and leaves the roster untouched if the id is taken
    pub fn insert(&mut self, record: ParticipantRecord) -> bool {
        if self.contains(record.id) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn remove(&mut self, id: PeerId) -> Option<ParticipantRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(index))
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.records.iter().filter(|r| r.role == role).count()
    }

    pub fn inspector_count(&self) -> usize {
        self.count_role(Role::Inspector)
    }

    /// Mark the roster changed so replicas can drop stale snapshots
    pub fn bump(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    pub fn records(&self) -> Vec<ParticipantRecord> {
        self.records.clone()
    }
}

impl Default for LobbyRoster {
    fn default() -> Self {
        Self::new()
    }
}
