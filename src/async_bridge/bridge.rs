//! Async bridge future.
//!
//! # Example
//!
//! ```ignore
//! use blockpipe::{bridge_async, BridgeConfig, Transformed};
//! use futures_io::{AsyncRead, AsyncWrite};
//!
//! async fn invert<R, W>(reader: R, writer: W) -> Result<(), blockpipe::PipeError>
//! where
//!     R: AsyncRead + Unpin,
//!     W: AsyncWrite + Unpin,
//! {
//!     let report = bridge_async(reader, writer, BridgeConfig::default(), |chunk: &mut bytes::BytesMut| {
//!         chunk.iter_mut().for_each(|b| *b = !*b);
//!         Transformed::Forward
//!     })
//!     .await?;
//!     println!("{} chunks", report.chunks);
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::io;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_core::future::BoxFuture;
use futures_io::{AsyncRead, AsyncWrite};
use pin_project_lite::pin_project;
use tracing::{debug, trace};

use crate::config::BridgeConfig;
use crate::error::PipeError;

/// What the bridge should do with a chunk after the transform ran.
pub enum Transformed {
    /// Write the (possibly modified) chunk right away.
    Forward,
    /// Hold the chunk until the continuation completes, then write it.
    ///
    /// The reader is not polled while the continuation is pending.
    Defer(BoxFuture<'static, ()>),
}

impl fmt::Debug for Transformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transformed::Forward => f.write_str("Forward"),
            Transformed::Defer(_) => f.write_str("Defer(..)"),
        }
    }
}

/// Per-chunk transform for [`bridge_async`].
///
/// Implemented for every `FnMut(&mut BytesMut) -> Transformed`.
pub trait AsyncTransform {
    /// Inspects or rewrites `chunk` and decides when it is forwarded.
    fn transform(&mut self, chunk: &mut BytesMut) -> Transformed;
}

impl<F> AsyncTransform for F
where
    F: FnMut(&mut BytesMut) -> Transformed,
{
    fn transform(&mut self, chunk: &mut BytesMut) -> Transformed {
        self(chunk)
    }
}

/// Transform that forwards every chunk unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl AsyncTransform for Passthrough {
    fn transform(&mut self, _chunk: &mut BytesMut) -> Transformed {
        Transformed::Forward
    }
}

/// Counters returned when a bridge completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeReport {
    /// Chunks read from the reader.
    pub chunks: u64,
    /// Chunks whose transform returned a continuation.
    pub deferred: u64,
    /// Bytes read from the reader.
    pub bytes_read: u64,
    /// Bytes written to the writer (after transform).
    pub bytes_written: u64,
}

enum State {
    Invalid(&'static str),
    Reading,
    Deferred(BoxFuture<'static, ()>, BytesMut),
    Writing(Bytes, usize),
    Flushing,
    Done,
}

pin_project! {
    /// A future that pumps an async reader into an async writer.
    ///
    /// One chunk is in flight at a time: the next read only starts once the
    /// previous chunk has been fully accepted by the writer. Writer
    /// backpressure (`poll_write` returning `Pending`) and a pending transform
    /// continuation both keep the reader idle, and both must clear before
    /// reading resumes.
    ///
    /// Resolves once the reader reports end of data and the writer has been
    /// flushed. Dropping the future cancels the bridge.
    #[must_use = "futures do nothing unless polled"]
    pub struct Bridge<R, W, T> {
        #[pin]
        reader: R,
        #[pin]
        writer: W,
        transform: T,
        buffer: Vec<u8>,
        state: State,
        report: BridgeReport,
    }
}

impl<R, W, T> Bridge<R, W, T> {
    /// Creates a bridge future.
    ///
    /// An invalid `config` is reported as [`PipeError::InvalidConfig`] on the
    /// first poll.
    pub fn new(reader: R, writer: W, config: BridgeConfig, transform: T) -> Self {
        let state = match config.validate() {
            Ok(()) => State::Reading,
            Err(PipeError::InvalidConfig { message }) => State::Invalid(message),
            Err(PipeError::Io(_)) => State::Invalid("invalid bridge config"),
        };
        Self {
            reader,
            writer,
            transform,
            buffer: vec![0u8; config.chunk_size()],
            state,
            report: BridgeReport::default(),
        }
    }

    /// Returns the counters collected so far.
    pub fn report(&self) -> &BridgeReport {
        &self.report
    }
}

impl<R, W, T> Future for Bridge<R, W, T>
where
    R: AsyncRead,
    W: AsyncWrite,
    T: AsyncTransform,
{
    type Output = Result<BridgeReport, PipeError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();

        loop {
            match mem::replace(this.state, State::Done) {
                State::Invalid(message) => {
                    return Poll::Ready(Err(PipeError::InvalidConfig { message }));
                }
                State::Reading => {
                    let n = match this.reader.as_mut().poll_read(cx, &mut this.buffer[..]) {
                        Poll::Pending => {
                            *this.state = State::Reading;
                            return Poll::Pending;
                        }
                        Poll::Ready(res) => res?,
                    };

                    if n == 0 {
                        *this.state = State::Flushing;
                        continue;
                    }

                    this.report.chunks += 1;
                    this.report.bytes_read += n as u64;
                    let mut chunk = BytesMut::from(&this.buffer[..n]);

                    *this.state = match this.transform.transform(&mut chunk) {
                        Transformed::Forward => State::Writing(chunk.freeze(), 0),
                        Transformed::Defer(continuation) => {
                            trace!(len = n, "chunk deferred by transform");
                            this.report.deferred += 1;
                            State::Deferred(continuation, chunk)
                        }
                    };
                }
                State::Deferred(mut continuation, chunk) => {
                    if continuation.as_mut().poll(cx).is_pending() {
                        *this.state = State::Deferred(continuation, chunk);
                        return Poll::Pending;
                    }
                    *this.state = State::Writing(chunk.freeze(), 0);
                }
                State::Writing(data, pos) => {
                    if pos == data.len() {
                        *this.state = State::Reading;
                        continue;
                    }

                    let n = match this.writer.as_mut().poll_write(cx, &data[pos..]) {
                        Poll::Pending => {
                            *this.state = State::Writing(data, pos);
                            return Poll::Pending;
                        }
                        Poll::Ready(res) => res?,
                    };

                    if n == 0 {
                        return Poll::Ready(Err(io::Error::from(io::ErrorKind::WriteZero).into()));
                    }
                    this.report.bytes_written += n as u64;
                    *this.state = State::Writing(data, pos + n);
                }
                State::Flushing => {
                    match this.writer.as_mut().poll_flush(cx) {
                        Poll::Pending => {
                            *this.state = State::Flushing;
                            return Poll::Pending;
                        }
                        Poll::Ready(res) => res?,
                    }
                    debug!(
                        chunks = this.report.chunks,
                        bytes = this.report.bytes_written,
                        "bridge finished"
                    );
                    return Poll::Ready(Ok(*this.report));
                }
                State::Done => panic!("`Bridge` polled after completion"),
            }
        }
    }
}

/// Creates a future that bridges `reader` into `writer`.
///
/// Each read of up to `config.chunk_size()` bytes is handed to `transform`.
/// Returning [`Transformed::Forward`] writes the chunk immediately;
/// returning [`Transformed::Defer`] holds it until the continuation
/// resolves. Chunks are written in the order they were read.
///
/// Uses `futures_io` traits, so it works with any async runtime. For tokio,
/// convert with `tokio_util::compat`:
///
/// ```ignore
/// use tokio_util::compat::{TokioAsyncReadCompatExt, TokioAsyncWriteCompatExt};
/// use blockpipe::{bridge_async, BridgeConfig, Passthrough};
///
/// let src = tokio::fs::File::open("in.bin").await?;
/// let dst = tokio::fs::File::create("out.bin").await?;
/// bridge_async(src.compat(), dst.compat_write(), BridgeConfig::default(), Passthrough).await?;
/// ```
///
/// # Errors
///
/// Read, write and flush failures resolve the future with [`PipeError::Io`].
pub fn bridge_async<R, W, T>(reader: R, writer: W, config: BridgeConfig, transform: T) -> Bridge<R, W, T>
where
    R: AsyncRead,
    W: AsyncWrite,
    T: AsyncTransform,
{
    Bridge::new(reader, writer, config, transform)
}
