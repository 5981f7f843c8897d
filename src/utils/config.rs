use std::env;
use std::str::FromStr;

/// Server configuration - immutable after load
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub udp_port: u16,
    pub peer_timeout_secs: u64,
    pub sweep_interval_ms: u64,
    pub command_queue_capacity: usize,
    pub log_file: String,
    pub lobby: LobbyConfig,
}

/// Rules the lobby coordinator enforces
#[derive(Debug, Clone, PartialEq)]
pub struct LobbyConfig {
    /// Capacity used by the admission hook and shown to clients
    pub max_players: usize,
    pub max_inspectors: usize,
    /// Prefix for generated placeholder names
    pub default_player_name: String,
    pub min_name_len: usize,
    pub max_name_len: usize,
    /// Whether inspectors must be ready before the match can start
    pub inspectors_gate_start: bool,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            max_players: 4,
            max_inspectors: 2,
            default_player_name: "Player".to_string(),
            min_name_len: 3,
            max_name_len: 20,
            inspectors_gate_start: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8080,
            udp_port: 7777,
            peer_timeout_secs: 15,
            sweep_interval_ms: 1000,
            command_queue_capacity: 1000,
            log_file: "lobby.log".to_string(),
            lobby: LobbyConfig::default(),
        }
    }
}

impl Config {
    /// Defaults overridden by `LOBBY_*` environment variables.
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        override_from_env("LOBBY_HTTP_PORT", &mut config.http_port);
        override_from_env("LOBBY_UDP_PORT", &mut config.udp_port);
        override_from_env("LOBBY_PEER_TIMEOUT_SECS", &mut config.peer_timeout_secs);
        override_from_env("LOBBY_MAX_PLAYERS", &mut config.lobby.max_players);
        override_from_env("LOBBY_MAX_INSPECTORS", &mut config.lobby.max_inspectors);
        override_from_env(
            "LOBBY_INSPECTORS_GATE_START",
            &mut config.lobby.inspectors_gate_start,
        );
        if let Ok(name) = env::var("LOBBY_DEFAULT_NAME") {
            if !name.trim().is_empty() {
                config.lobby.default_player_name = name.trim().to_string();
            }
        }
        if let Ok(path) = env::var("LOBBY_LOG_FILE") {
            config.log_file = path;
        }
        config
    }
}

fn override_from_env<T: FromStr>(key: &str, target: &mut T) {
    let Ok(raw) = env::var(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => log::warn!("Ignoring invalid value for {}: {:?}", key, raw),
    }
}
