//! The fixed-buffer copy loop.

use std::io::Write;

use tracing::{debug, trace, warn};

use super::SizedSource;
use crate::error::PipeError;
use crate::hash::Digest;
use crate::util::read_full;

#[cfg(feature = "hash-blake3")]
use crate::hash::Blake3Hasher;

/// Counters collected by one block copy.
///
/// `full_chunks` and `tail_len` describe exactly what was written: one
/// write of `buffer capacity` bytes per full chunk, then one write of
/// `tail_len` bytes when it is non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyReport {
    /// Bytes the source held (from its cursor) when the copy started.
    pub source_len: u64,
    /// Bytes consumed from the source.
    pub bytes_read: u64,
    /// Bytes written to the destination.
    pub bytes_written: u64,
    /// Number of full-capacity chunks written.
    pub full_chunks: u64,
    /// Length of the tail chunk (`source_len mod capacity`), 0 if none.
    pub tail_len: usize,
    /// Digest of every byte written, when hashing was requested.
    pub digest: Option<Digest>,
}

impl CopyReport {
    fn new(source_len: u64, tail_len: usize) -> Self {
        Self {
            source_len,
            bytes_read: 0,
            bytes_written: 0,
            full_chunks: 0,
            tail_len,
            digest: None,
        }
    }

    /// Total number of write operations issued to the destination.
    pub fn writes(&self) -> u64 {
        self.full_chunks + u64::from(self.tail_len > 0)
    }
}

/// One copy run over a caller-owned working buffer.
pub(crate) struct Session<'b, F> {
    buffer: &'b mut [u8],
    transform: Option<F>,
    #[cfg(feature = "hash-blake3")]
    hasher: Option<Blake3Hasher>,
}

impl<'b, F> Session<'b, F>
where
    F: FnMut(&mut [u8]),
{
    pub(crate) fn new(buffer: &'b mut [u8], transform: Option<F>, hash: bool) -> Self {
        #[cfg(not(feature = "hash-blake3"))]
        let _ = hash;

        Self {
            buffer,
            transform,
            #[cfg(feature = "hash-blake3")]
            hasher: hash.then(Blake3Hasher::new),
        }
    }

    /// Copies `source` into `dest` through the working buffer.
    ///
    /// The tail length is derived from the source size once, up front. The
    /// loop keeps reading full buffers until a read comes back short, then
    /// writes the precomputed tail out of the front of the buffer.
    pub(crate) fn run<R, W>(mut self, source: &mut R, dest: &mut W) -> Result<CopyReport, PipeError>
    where
        R: SizedSource + ?Sized,
        W: Write + ?Sized,
    {
        let capacity = self.buffer.len();
        if capacity == 0 {
            return Err(PipeError::InvalidConfig {
                message: "buffer size must be non-zero",
            });
        }

        let source_len = source.remaining_len()?;
        let tail_len = (source_len % capacity as u64) as usize;
        let mut report = CopyReport::new(source_len, tail_len);

        debug!(source_len, capacity, tail_len, "block copy started");

        let last_read = loop {
            let n = read_full(source, self.buffer)?;
            report.bytes_read += n as u64;
            if n < capacity {
                break n;
            }
            self.write_chunk(dest, capacity, &mut report)?;
            report.full_chunks += 1;
        };

        if last_read != tail_len {
            warn!(
                expected = tail_len,
                actual = last_read,
                "source size changed during copy, writing precomputed tail"
            );
        }

        if tail_len > 0 {
            self.write_chunk(dest, tail_len, &mut report)?;
        }

        #[cfg(feature = "hash-blake3")]
        {
            report.digest = self.hasher.as_ref().map(Blake3Hasher::finalize);
        }

        debug!(
            bytes_written = report.bytes_written,
            writes = report.writes(),
            "block copy finished"
        );
        Ok(report)
    }

    fn write_chunk<W>(&mut self, dest: &mut W, len: usize, report: &mut CopyReport) -> Result<(), PipeError>
    where
        W: Write + ?Sized,
    {
        let chunk = &mut self.buffer[..len];
        if let Some(transform) = self.transform.as_mut() {
            transform(chunk);
        }

        #[cfg(feature = "hash-blake3")]
        if let Some(hasher) = self.hasher.as_mut() {
            hasher.update(chunk);
        }

        dest.write_all(chunk)?;
        report.bytes_written += len as u64;
        trace!(offset = report.bytes_written - len as u64, len, "chunk written");
        Ok(())
    }
}
