pub mod http;
pub mod models;
pub mod udp;

pub use models::{ClientMessage, ServerMessage};
