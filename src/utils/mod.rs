pub mod buffers;
pub mod config;
