use axum::{routing::get, Router};
use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::{mpsc, watch};
use tokio::time::interval;
use tower_http::cors::CorsLayer;

use crate::domain::coordinator::LobbyCoordinator;
use crate::handlers::http::{get_lobby, get_participant, health, AppState};
use crate::handlers::udp::handle_udp_packet;
use crate::state::commands::LobbyCommand;
use crate::state::server_state::{LobbyHandle, ServerState};
use crate::tick::broadcast::Broadcaster;
use crate::tick::lobby_loop::lobby_loop;
use crate::utils::config::Config;

/// Largest payload an IPv4 UDP datagram can carry
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Start HTTP, UDP and idle-sweep tasks
pub async fn start_servers(
    state: Arc<ServerState>,
    lobby: LobbyHandle,
    config: Arc<Config>,
    udp_socket: Arc<UdpSocket>,
) -> Result<(), Box<dyn std::error::Error>> {
    let http_server = init_http_server(state.clone(), lobby.subscribe(), config.clone());
    let udp_server = init_udp_server(state.clone(), lobby.command_tx.clone(), udp_socket);
    let sweeper = init_idle_sweep(state, lobby.command_tx.clone(), config);

    tokio::try_join!(http_server, udp_server, sweeper)?;
    Ok(())
}

/// Spawn the lobby loop with its own command queue and snapshot channel
pub fn spawn_lobby<B: Broadcaster>(config: &Config, broadcaster: B) -> LobbyHandle {
    let coordinator = LobbyCoordinator::new(config.lobby.clone());
    let (snapshot_tx, snapshots) = watch::channel(coordinator.snapshot());
    let (command_tx, command_rx) = mpsc::channel::<LobbyCommand>(config.command_queue_capacity);

    let task_handle = tokio::spawn(async move {
        lobby_loop(coordinator, command_rx, broadcaster, snapshot_tx).await;
    });

    LobbyHandle {
        command_tx,
        snapshots,
        task_handle,
    }
}

/// Initialize HTTP server
fn init_http_server(
    state: Arc<ServerState>,
    snapshots: watch::Receiver<crate::state::roster::RosterSnapshot>,
    config: Arc<Config>,
) -> tokio::task::JoinHandle<()> {
    let app_state = AppState { state, snapshots };

    let app = Router::new()
        .route("/lobby", get(get_lobby))
        .route("/lobby/players/:id", get(get_participant))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    info!("Starting HTTP server on {}", http_addr);

    tokio::spawn(async move {
        let listener = match TcpListener::bind(&http_addr).await {
            Ok(listener) => {
                info!("HTTP server successfully bound to {}", http_addr);
                listener
            }
            Err(e) => {
                log::error!("Failed to bind HTTP server to {}: {}", http_addr, e);
                return;
            }
        };

        if let Err(e) = axum::serve(listener, app).await {
            log::error!("HTTP server error: {}", e);
        }
    })
}

/// Initialize UDP receive loop feeding the lobby command queue
pub fn init_udp_server(
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<LobbyCommand>,
    socket: Arc<UdpSocket>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

        loop {
            match socket.recv_from(&mut buf).await {
                Ok((len, addr)) => {
                    handle_udp_packet(&buf[..len], addr, &state, &command_tx, &socket).await;
                }
                Err(e) => {
                    log::error!("UDP recv error: {}", e);
                }
            }
        }
    })
}

/// Periodically disconnect peers that stopped sending
fn init_idle_sweep(
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<LobbyCommand>,
    config: Arc<Config>,
) -> tokio::task::JoinHandle<()> {
    let timeout = Duration::from_secs(config.peer_timeout_secs);
    let period = Duration::from_millis(config.sweep_interval_ms);

    tokio::spawn(async move {
        let mut timer = interval(period);
        loop {
            timer.tick().await;
            for peer_id in state.expire_idle(timeout) {
                if command_tx.send(LobbyCommand::Leave { peer_id }).await.is_err() {
                    log::warn!("Lobby loop gone, stopping idle sweep");
                    return;
                }
            }
        }
    })
}
