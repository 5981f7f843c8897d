use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use tokio::sync::watch;

use crate::handlers::models::{HealthInfo, ParticipantInfo};
use crate::state::roster::{PeerId, RosterSnapshot};
use crate::state::server_state::ServerState;

/// App state for HTTP handlers. Reads only; the roster is never mutated here.
#[derive(Clone)]
pub struct AppState {
    pub state: Arc<ServerState>,
    pub snapshots: watch::Receiver<RosterSnapshot>,
}

/// Thin HTTP handler: Latest roster snapshot
pub async fn get_lobby(State(app_state): State<AppState>) -> Json<RosterSnapshot> {
    Json(app_state.snapshots.borrow().clone())
}

/// Thin HTTP handler: One participant
pub async fn get_participant(
    State(app_state): State<AppState>,
    Path(id): Path<PeerId>,
) -> Result<Json<ParticipantInfo>, StatusCode> {
    let snapshot = app_state.snapshots.borrow();
    let participant = snapshot
        .participants
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ParticipantInfo {
        is_host: snapshot.host == Some(id),
        participant,
    }))
}

/// Thin HTTP handler: Liveness
pub async fn health(State(app_state): State<AppState>) -> Json<HealthInfo> {
    let participants = app_state.snapshots.borrow().participants.len();
    Json(HealthInfo {
        status: "ok".to_string(),
        connections: app_state.state.connection_count(),
        participants,
    })
}
