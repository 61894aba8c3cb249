//! Configuration for copy and bridge behavior.
//!
//! - [`CopyConfig`] - Working buffer size, auto-close and digest for block copies
//! - [`BridgeConfig`] - Read chunk size for the async stream bridge
//! - [`HashConfig`] - Whether to compute a digest of the copied bytes
//!
//! # Example
//!
//! ```
//! use blockpipe::{CopyConfig, HashConfig};
//!
//! let config = CopyConfig::new(4096)?
//!     .with_auto_close(false)
//!     .with_hash_config(HashConfig::enabled());
//! assert_eq!(config.buffer_size(), 4096);
//! # Ok::<(), blockpipe::PipeError>(())
//! ```

use crate::error::PipeError;

/// Default working buffer size for block copies (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Default read size for the async bridge (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Configuration for a fixed-buffer block copy.
///
/// The buffer size is the capacity `C` of every full chunk; the tail chunk is
/// `source size mod C` bytes long. Handles are closed after the copy unless
/// `auto_close` is turned off.
///
/// # Example
///
/// ```
/// use blockpipe::CopyConfig;
///
/// let config = CopyConfig::default().with_buffer_size(1024 * 1024);
/// assert!(config.validate().is_ok());
///
/// let config = CopyConfig::default().with_buffer_size(0);
/// assert!(config.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CopyConfig {
    buffer_size: usize,
    auto_close: bool,
    hash_config: HashConfig,
}

impl CopyConfig {
    /// Creates a new configuration with the given buffer capacity.
    ///
    /// # Errors
    ///
    /// Returns [`PipeError::InvalidConfig`] if `buffer_size` is zero.
    pub fn new(buffer_size: usize) -> Result<Self, PipeError> {
        let config = Self {
            buffer_size,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the buffer capacity.
    ///
    /// Note: This does not validate the configuration. Use [`CopyConfig::validate`]
    /// to check if the configuration is valid.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets whether both handles are closed once the copy completes.
    pub fn with_auto_close(mut self, auto_close: bool) -> Self {
        self.auto_close = auto_close;
        self
    }

    /// Sets the hash configuration.
    pub fn with_hash_config(mut self, config: HashConfig) -> Self {
        self.hash_config = config;
        self
    }

    /// Returns the buffer capacity.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Returns whether handles are closed after the copy.
    pub fn auto_close(&self) -> bool {
        self.auto_close
    }

    /// Returns the hash configuration.
    pub fn hash_config(&self) -> &HashConfig {
        &self.hash_config
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<(), PipeError> {
        if self.buffer_size == 0 {
            return Err(PipeError::InvalidConfig {
                message: "buffer size must be non-zero",
            });
        }
        Ok(())
    }
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            auto_close: true,
            hash_config: HashConfig::default(),
        }
    }
}

/// Configuration for the async stream bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BridgeConfig {
    chunk_size: usize,
}

impl BridgeConfig {
    /// Creates a new configuration with the given read chunk size.
    ///
    /// # Errors
    ///
    /// Returns [`PipeError::InvalidConfig`] if `chunk_size` is zero.
    pub fn new(chunk_size: usize) -> Result<Self, PipeError> {
        let config = Self { chunk_size };
        config.validate()?;
        Ok(config)
    }

    /// Sets the maximum number of bytes read per chunk.
    ///
    /// Note: This does not validate the configuration.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Returns the read chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<(), PipeError> {
        if self.chunk_size == 0 {
            return Err(PipeError::InvalidConfig {
                message: "chunk size must be non-zero",
            });
        }
        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Configuration for the copy digest.
///
/// When enabled (and the `hash-blake3` feature is on), a BLAKE3 digest of
/// every byte written to the destination is reported. Disabled by default.
///
/// # Example
///
/// ```
/// use blockpipe::HashConfig;
///
/// let config = HashConfig::enabled();
/// assert!(config.enabled);
///
/// let config = HashConfig::disabled();
/// assert!(!config.enabled);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HashConfig {
    /// Whether to compute a digest of the copied bytes.
    pub enabled: bool,
}

impl HashConfig {
    /// Creates a new hash configuration.
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Enables hashing.
    pub const fn enabled() -> Self {
        Self { enabled: true }
    }

    /// Disables hashing.
    pub const fn disabled() -> Self {
        Self { enabled: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CopyConfig::default();
        assert_eq!(config.buffer_size(), DEFAULT_BUFFER_SIZE);
        assert!(config.auto_close());
        assert!(!config.hash_config().enabled);
    }

    #[test]
    fn test_builder_pattern() {
        let config = CopyConfig::default()
            .with_buffer_size(4)
            .with_auto_close(false)
            .with_hash_config(HashConfig::enabled());

        assert_eq!(config.buffer_size(), 4);
        assert!(!config.auto_close());
        assert!(config.hash_config().enabled);
    }

    #[test]
    fn test_invalid_config_zero_buffer() {
        assert!(CopyConfig::new(0).is_err());
        assert!(CopyConfig::default().with_buffer_size(0).validate().is_err());
    }

    #[test]
    fn test_odd_buffer_sizes_are_valid() {
        assert!(CopyConfig::new(1).is_ok());
        assert!(CopyConfig::new(1000).is_ok());
    }

    #[test]
    fn test_bridge_config() {
        assert_eq!(BridgeConfig::default().chunk_size(), DEFAULT_CHUNK_SIZE);
        assert_eq!(BridgeConfig::new(2).unwrap().chunk_size(), 2);
        assert!(BridgeConfig::new(0).is_err());
        assert!(BridgeConfig::default().with_chunk_size(0).validate().is_err());
    }
}
