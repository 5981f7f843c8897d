use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::domain::error::LobbyError;
use crate::state::roster::{
    LobbyPhase, LobbyRoster, ParticipantRecord, PeerId, RequestedRole, Role, RosterSnapshot,
};
use crate::utils::config::LobbyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    InspectorDowngrade,
    TeamChanged,
    Rejected,
}

/// Status message addressed to a single peer
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub target: PeerId,
    pub kind: NoticeKind,
    pub success: bool,
    pub message: String,
}

impl Notice {
    /// Turn a rejection into a message for the requester, if it carries one
    pub fn rejection(target: PeerId, err: &LobbyError) -> Option<Self> {
        err.notice_text().map(|message| Self {
            target,
            kind: NoticeKind::Rejected,
            success: false,
            message,
        })
    }
}

pub type NoticeVec = SmallVec<[Notice; 2]>;

/// Result of one accepted mutation. Nothing is sent until the caller
/// flushes it.
#[derive(Debug, Clone, Default)]
pub struct LobbyUpdate {
    /// Present when the roster changed and must be rebroadcast
    pub snapshot: Option<RosterSnapshot>,
    /// Start-readiness signal, present whenever it was recomputed
    pub can_start: Option<bool>,
    pub notices: NoticeVec,
    pub match_starting: bool,
}

impl LobbyUpdate {
    pub fn roster_changed(&self) -> bool {
        self.snapshot.is_some()
    }
}

/// Authoritative lobby state machine. Owns the roster; every mutation
/// goes through one of the request methods below.
#[derive(Debug)]
pub struct LobbyCoordinator {
    config: LobbyConfig,
    roster: LobbyRoster,
    phase: LobbyPhase,
    host: Option<PeerId>,
    can_start: bool,
}

impl LobbyCoordinator {
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            config,
            roster: LobbyRoster::new(),
            phase: LobbyPhase::Waiting,
            host: None,
            can_start: false,
        }
    }

    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    pub fn roster(&self) -> &LobbyRoster {
        &self.roster
    }

    pub fn phase(&self) -> LobbyPhase {
        self.phase
    }

    pub fn host(&self) -> Option<PeerId> {
        self.host
    }

    /// Last computed start-readiness signal
    pub fn can_start(&self) -> bool {
        self.can_start
    }

    pub fn participant(&self, id: PeerId) -> Option<&ParticipantRecord> {
        self.roster.get(id)
    }

    pub fn inspector_count(&self) -> usize {
        self.roster.inspector_count()
    }

    pub fn snapshot(&self) -> RosterSnapshot {
        RosterSnapshot {
            session_id: self.roster.session_id(),
            version: self.roster.version(),
            phase: self.phase,
            host: self.host,
            can_start: self.can_start,
            max_players: self.config.max_players,
            max_inspectors: self.config.max_inspectors,
            participants: self.roster.records(),
        }
    }

    /// Complete a peer's join handshake
    pub fn join(
        &mut self,
        id: PeerId,
        requested_name: &str,
        requested_role: RequestedRole,
    ) -> Result<LobbyUpdate, LobbyError> {
        if self.roster.contains(id) {
            log::warn!("Peer {} already in lobby, ignoring join", id);
            return Err(LobbyError::DuplicateJoin(id));
        }
        if self.phase != LobbyPhase::Waiting {
            return Err(LobbyError::MatchAlreadyStarted);
        }

        let display_name = sanitize_name(requested_name, id, &self.config);
        let mut notices = NoticeVec::new();

        let role = match requested_role {
            RequestedRole::Inspector if self.roster.inspector_count() < self.config.max_inspectors => {
                Role::Inspector
            }
            RequestedRole::Inspector => {
                log::warn!(
                    "Inspector cap ({}) reached, peer {} joins a team instead",
                    self.config.max_inspectors,
                    id
                );
                notices.push(Notice {
                    target: id,
                    kind: NoticeKind::InspectorDowngrade,
                    success: false,
                    message: "Inspector limit reached! You joined as a regular player.".to_string(),
                });
                self.balanced_team()
            }
            RequestedRole::Team => self.balanced_team(),
        };

        self.roster.insert(ParticipantRecord::new(id, display_name.clone(), role));
        if self.host.is_none() && role.is_team() {
            self.host = Some(id);
        }
        log::info!("Added {} (peer {}) to lobby as {}", display_name, id, role.label());

        let mut update = self.commit();
        update.notices = notices;
        Ok(update)
    }

    /// Transport-level disconnect. Disconnect is final for the id.
    pub fn leave(&mut self, id: PeerId) -> Result<LobbyUpdate, LobbyError> {
        let removed = self
            .roster
            .remove(id)
            .ok_or(LobbyError::UnknownParticipant(id))?;

        if self.host == Some(id) {
            self.host = self.roster.iter().find(|r| r.role.is_team()).map(|r| r.id);
            log::info!("Host {} left, new host: {:?}", id, self.host);
        }
        log::info!("Removed {} (peer {}) from lobby", removed.display_name, id);

        Ok(self.commit())
    }

    pub fn request_team_change(
        &mut self,
        id: PeerId,
        target: Role,
    ) -> Result<LobbyUpdate, LobbyError> {
        self.ensure_waiting()?;
        let record = self
            .roster
            .get_mut(id)
            .ok_or(LobbyError::UnknownParticipant(id))?;

        if record.role == Role::Inspector || target == Role::Inspector {
            return Err(LobbyError::ForbiddenTeamChange {
                id,
                from: record.role,
                to: target,
            });
        }
        if record.role == target {
            return Err(LobbyError::NoOpTeamChange { id, role: target });
        }

        record.role = target;
        log::info!("Peer {} changed to {}", id, target.label());

        let mut update = self.commit();
        update.notices.push(Notice {
            target: id,
            kind: NoticeKind::TeamChanged,
            success: true,
            message: format!("Switched to {}!", target.label()),
        });
        Ok(update)
    }

    /// Set the sender's own ready flag. Repeating the same value leaves the
    /// roster untouched but still recomputes the start signal.
    pub fn request_ready(&mut self, id: PeerId, ready: bool) -> Result<LobbyUpdate, LobbyError> {
        self.ensure_waiting()?;
        let record = self
            .roster
            .get_mut(id)
            .ok_or(LobbyError::UnknownParticipant(id))?;

        if record.ready == ready {
            self.can_start = self.compute_can_start();
            return Ok(LobbyUpdate {
                can_start: Some(self.can_start),
                ..Default::default()
            });
        }

        record.ready = ready;
        log::info!("Peer {} ready status: {}", id, ready);
        Ok(self.commit())
    }

    /// Host-only. Freezes the lobby once everyone is ready.
    pub fn request_start(&mut self, id: PeerId) -> Result<LobbyUpdate, LobbyError> {
        self.ensure_waiting()?;
        if !self.roster.contains(id) {
            return Err(LobbyError::UnknownParticipant(id));
        }
        if self.host != Some(id) {
            return Err(LobbyError::NotHost(id));
        }
        if !self.compute_can_start() {
            return Err(LobbyError::NotReadyToStart);
        }

        self.phase = LobbyPhase::Starting;
        log::info!("Host {} started the match with {} participants", id, self.roster.len());

        let mut update = self.commit();
        update.match_starting = true;
        Ok(update)
    }

    /// Team with fewer non-inspector members, ties go to Team A
    pub fn balanced_team(&self) -> Role {
        let team_a = self.roster.count_role(Role::TeamA);
        let team_b = self.roster.count_role(Role::TeamB);
        if team_a <= team_b {
            Role::TeamA
        } else {
            Role::TeamB
        }
    }

    fn compute_can_start(&self) -> bool {
        if self.roster.len() < 2 {
            return false;
        }
        let mut counted = self
            .roster
            .iter()
            .filter(|r| self.config.inspectors_gate_start || r.role.is_team())
            .peekable();
        counted.peek().is_some() && counted.all(|r| r.ready)
    }

    fn ensure_waiting(&self) -> Result<(), LobbyError> {
        match self.phase {
            LobbyPhase::Waiting => Ok(()),
            LobbyPhase::Starting => Err(LobbyError::MatchAlreadyStarted),
        }
    }

    /// Bump the roster version and recompute the start signal
    fn commit(&mut self) -> LobbyUpdate {
        self.roster.bump();
        self.can_start = self.compute_can_start();
        LobbyUpdate {
            snapshot: Some(self.snapshot()),
            can_start: Some(self.can_start),
            ..Default::default()
        }
    }
}

/// Trimmed name if its length is within bounds, otherwise a placeholder
/// derived from the peer id
pub fn sanitize_name(raw: &str, id: PeerId, config: &LobbyConfig) -> String {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len < config.min_name_len || len > config.max_name_len {
        log::debug!("Invalid name {:?} from peer {}, substituting", raw, id);
        return format!("{}_{}", config.default_player_name, id);
    }
    trimmed.to_string()
}
