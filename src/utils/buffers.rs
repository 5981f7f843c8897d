use serde::Serialize;
use smallvec::SmallVec;

use crate::state::roster::PeerId;

/// Type alias for small collections that avoid allocations
pub type SmallPeerVec = SmallVec<[PeerId; 8]>;

/// Reusable buffer for packet serialization
pub struct PacketBuffer {
    buffer: Vec<u8>,
}

impl PacketBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Serialize `value` as JSON into the buffer, replacing its contents
    pub fn encode<T: Serialize>(&mut self, value: &T) -> Result<&[u8], serde_json::Error> {
        self.buffer.clear();
        serde_json::to_writer(&mut self.buffer, value)?;
        Ok(&self.buffer)
    }
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new(1024)
    }
}
