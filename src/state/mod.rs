pub mod commands;
pub mod roster;
pub mod server_state;
