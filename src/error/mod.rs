//! Error types for blockpipe.

/// Errors that can occur during copy and bridge operations.
///
/// Neither component recovers from failures. Whatever the underlying read,
/// write or close primitive reports is surfaced unmodified as [`PipeError::Io`].
#[derive(Debug, thiserror::Error)]
pub enum PipeError {
    /// An I/O error raised by a source, destination or sink.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration parameter.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },
}

impl PipeError {
    /// Returns the underlying I/O error kind, if this is an I/O failure.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            PipeError::Io(e) => Some(e.kind()),
            PipeError::InvalidConfig { .. } => None,
        }
    }
}
