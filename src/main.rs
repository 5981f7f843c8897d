use std::sync::Arc;

use volleylobby::server;
use volleylobby::state::server_state::ServerState;
use volleylobby::tick::broadcast::UdpBroadcaster;
use volleylobby::utils::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(Config::from_env());
    setup_logging(&config.log_file)?;

    // Connection registry shared by the UDP handler and the broadcaster
    let state = Arc::new(ServerState::new(config.lobby.max_players));

    let udp_socket = Arc::new(
        tokio::net::UdpSocket::bind(format!("0.0.0.0:{}", config.udp_port)).await?
    );
    log::info!("Listening for peers on UDP {}", config.udp_port);

    // Lobby loop owns the roster from here until shutdown
    let broadcaster = UdpBroadcaster::new(udp_socket.clone(), state.clone());
    let lobby = server::spawn_lobby(&config, broadcaster);
    log::info!(
        "Lobby session {} open ({} players, {} inspectors max)",
        lobby.latest().session_id,
        config.lobby.max_players,
        config.lobby.max_inspectors
    );

    server::start_servers(state, lobby, config, udp_socket).await?;

    Ok(())
}

fn setup_logging(log_file: &str) -> Result<(), Box<dyn std::error::Error>> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Utc::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .chain(fern::log_file(log_file)?)
        .apply()?;
    Ok(())
}
