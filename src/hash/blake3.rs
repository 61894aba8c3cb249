//! BLAKE3-based copy hashing implementation.

use super::Digest;

/// Incremental BLAKE3 state fed with every chunk written.
#[derive(Debug, Clone)]
pub struct Blake3Hasher {
    state: blake3::Hasher,
}

impl Blake3Hasher {
    /// Creates a new hasher.
    pub fn new() -> Self {
        Self {
            state: blake3::Hasher::new(),
        }
    }

    /// Updates the hasher with more data.
    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    /// Finalizes and returns the digest.
    pub fn finalize(&self) -> Digest {
        Digest::new(self.state.finalize().into())
    }

    /// Convenience method to hash data in one shot.
    #[cfg(test)]
    pub(crate) fn hash(data: &[u8]) -> Digest {
        Digest::new(blake3::hash(data).into())
    }
}

impl Default for Blake3Hasher {
    fn default() -> Self {
        Self::new()
    }
}
