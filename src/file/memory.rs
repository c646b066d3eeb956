//! Owned-buffer backend, used for images that were downloaded or built in memory.

use super::Backend;

/// A [`Backend`] over an owned byte buffer.
#[derive(Debug)]
pub struct Memory(Vec<u8>);

impl Memory {
    /// Takes ownership of `data`.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Memory {
        Memory(data)
    }
}

impl Backend for Memory {
    fn data(&self) -> &[u8] {
        &self.0
    }
}
