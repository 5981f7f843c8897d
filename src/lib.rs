//! Authoritative lobby server for VR volleyball.
//!
//! Peers talk to the server over UDP with small JSON datagrams. A single
//! lobby loop owns the roster, applies requests in arrival order, and
//! pushes full roster snapshots back to every connected peer. A read-only
//! HTTP view exposes the latest snapshot.

pub mod domain;
pub mod handlers;
pub mod server;
pub mod state;
pub mod tick;
pub mod utils;

pub use domain::coordinator::{LobbyCoordinator, LobbyUpdate, Notice, NoticeKind};
pub use domain::error::LobbyError;
pub use domain::replica::RosterReplica;
pub use state::roster::{LobbyPhase, ParticipantRecord, PeerId, RequestedRole, Role, RosterSnapshot};
pub use utils::config::{Config, LobbyConfig};
