//! Fixed-buffer block copy between two handles.
//!
//! - [`copy`] - One-shot copy through a caller-supplied buffer
//! - [`BlockCopier`] - Configured copier with a pooled buffer and optional transform
//! - [`SizedSource`] - Readable handle that can report its remaining length
//!
//! Every full buffer is handed to the transform (if any) and written; the
//! final partial buffer, `source length mod capacity` bytes long, is handled
//! the same way. Reads and writes go through the handles' own cursors.
//!
//! # Example
//!
//! ```
//! use blockpipe::{BlockCopier, CopyConfig};
//! use std::io::Cursor;
//!
//! let config = CopyConfig::new(4)?.with_auto_close(false);
//! let mut copier = BlockCopier::new(config).with_transform(|chunk: &mut [u8]| {
//!     chunk.make_ascii_uppercase();
//! });
//!
//! let copied = copier.copy(Cursor::new(b"hello world"), Vec::new())?;
//! assert_eq!(copied.report().writes(), 3);
//!
//! let (_, dest) = copied.into_handles().unwrap();
//! assert_eq!(dest, b"HELLO WORLD");
//! # Ok::<(), blockpipe::PipeError>(())
//! ```

mod handle;
mod session;

use std::io::Write;

use tracing::debug;

use crate::buffer::CopyBuffer;
use crate::config::CopyConfig;
use crate::error::PipeError;

pub use handle::SizedSource;
pub use session::CopyReport;

use session::Session;

/// Outcome of a block copy.
///
/// When the copy was asked to auto-close, both handles have been closed
/// (destination first) and only the report is left. Otherwise the handles
/// are handed back still open.
#[derive(Debug)]
pub struct Copied<R, W> {
    report: CopyReport,
    handles: Option<(R, W)>,
}

impl<R, W> Copied<R, W> {
    /// Returns the copy counters.
    pub fn report(&self) -> &CopyReport {
        &self.report
    }

    /// Returns true if both handles were closed by the copy.
    pub fn is_closed(&self) -> bool {
        self.handles.is_none()
    }

    /// Consumes the outcome and returns the report.
    pub fn into_report(self) -> CopyReport {
        self.report
    }

    /// Returns the still-open `(source, destination)` pair, if not auto-closed.
    pub fn into_handles(self) -> Option<(R, W)> {
        self.handles
    }
}

/// Copies `source` into `dest` through `buffer`.
///
/// The buffer's length is the chunk capacity. `transform`, if given, is
/// invoked on every chunk right before it is written, including the tail.
/// With `auto_close` set, the destination is flushed and closed, then the
/// source is closed. Pass `&mut` handles to keep ownership regardless.
///
/// Closing a handle means dropping it. `std` discards errors reported at
/// close, so the last error this function can observe is the flush. For a
/// durable copy pass `&mut File` and call [`File::sync_all`] on it afterwards.
///
/// [`File::sync_all`]: std::fs::File::sync_all
///
/// # Errors
///
/// Any error raised by the source, the destination or the flush is returned
/// as [`PipeError::Io`]. An empty `buffer` is rejected with
/// [`PipeError::InvalidConfig`].
///
/// # Example
///
/// ```
/// use blockpipe::copy;
/// use std::io::Cursor;
///
/// let mut buffer = [0u8; 4];
/// let mut dest = Vec::new();
/// let copied = copy(Cursor::new(b"0123456789"), &mut dest, &mut buffer, true, None)?;
///
/// assert_eq!(copied.report().full_chunks, 2);
/// assert_eq!(copied.report().tail_len, 2);
/// assert_eq!(dest, b"0123456789");
/// # Ok::<(), blockpipe::PipeError>(())
/// ```
pub fn copy<R, W>(
    mut source: R,
    mut dest: W,
    buffer: &mut [u8],
    auto_close: bool,
    transform: Option<&mut dyn FnMut(&mut [u8])>,
) -> Result<Copied<R, W>, PipeError>
where
    R: SizedSource,
    W: Write,
{
    let report = Session::new(buffer, transform, false).run(&mut source, &mut dest)?;
    finish(source, dest, report, auto_close)
}

/// A reusable block copier.
///
/// Holds a [`CopyConfig`] and an optional per-chunk transform. Each call to
/// [`BlockCopier::copy`] borrows a working buffer of `buffer_size` bytes from
/// a thread-local pool.
pub struct BlockCopier<'t> {
    config: CopyConfig,
    transform: Option<Box<dyn FnMut(&mut [u8]) + 't>>,
}

impl<'t> BlockCopier<'t> {
    /// Creates a copier with the given configuration and no transform.
    pub fn new(config: CopyConfig) -> Self {
        Self {
            config,
            transform: None,
        }
    }

    /// Sets the transform invoked on every chunk before it is written.
    ///
    /// The slice handed to the transform is the shared working buffer; its
    /// contents are overwritten by the next read.
    pub fn with_transform(mut self, transform: impl FnMut(&mut [u8]) + 't) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CopyConfig {
        &self.config
    }

    /// Copies `source` into `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`PipeError::InvalidConfig`] if the configuration does not
    /// validate, otherwise propagates I/O failures as [`PipeError::Io`].
    pub fn copy<R, W>(&mut self, mut source: R, mut dest: W) -> Result<Copied<R, W>, PipeError>
    where
        R: SizedSource,
        W: Write,
    {
        self.config.validate()?;

        let mut buffer = CopyBuffer::take(self.config.buffer_size());
        let report = Session::new(
            &mut buffer,
            self.transform.as_mut(),
            self.config.hash_config().enabled,
        )
        .run(&mut source, &mut dest)?;

        finish(source, dest, report, self.config.auto_close())
    }
}

impl Default for BlockCopier<'_> {
    fn default() -> Self {
        Self::new(CopyConfig::default())
    }
}

impl std::fmt::Debug for BlockCopier<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockCopier")
            .field("config", &self.config)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

fn finish<R, W: Write>(
    source: R,
    mut dest: W,
    report: CopyReport,
    auto_close: bool,
) -> Result<Copied<R, W>, PipeError> {
    // Flush is the last failure point; drop below cannot report errors.
    dest.flush()?;
    if !auto_close {
        return Ok(Copied {
            report,
            handles: Some((source, dest)),
        });
    }

    drop(dest);
    drop(source);
    debug!("handles closed");
    Ok(Copied {
        report,
        handles: None,
    })
}
