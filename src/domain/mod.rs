pub mod coordinator;
pub mod error;
pub mod replica;
