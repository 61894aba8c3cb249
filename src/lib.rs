//! blockpipe
//!
//! Low-level copying primitives for files and streams.
//!
//! `blockpipe` provides two small, independent building blocks:
//!
//! - a synchronous fixed-buffer **block copy** between two handles, with an
//!   optional transform applied to every chunk before it is written
//! - a flow-controlled **stream bridge** between a chunk source and a chunk
//!   sink that honors sink backpressure and lets a transform hold a chunk
//!   while it does out-of-band work
//!
//! The crate intentionally:
//! - does NOT retry or recover from I/O failures
//! - does NOT reconcile partial writes
//! - does NOT open or close paths on its own
//!
//! # Block copy
//!
//! ```no_run
//! use std::fs::File;
//! use blockpipe::{BlockCopier, CopyConfig, PipeError};
//!
//! fn main() -> Result<(), PipeError> {
//!     let source = File::open("data.bin")?;
//!     let dest = File::create("data.copy.bin")?;
//!
//!     let mut copier = BlockCopier::new(CopyConfig::new(1024 * 1024)?);
//!     let copied = copier.copy(source, dest)?;
//!     println!("{} bytes in {} writes", copied.report().bytes_written, copied.report().writes());
//!     Ok(())
//! }
//! ```
//!
//! # Stream bridge
//!
//! ```
//! use blockpipe::{ChunkSource, StreamBridge};
//! use bytes::{Bytes, BytesMut};
//!
//! struct Source;
//!
//! impl ChunkSource for Source {
//!     fn pause(&mut self) {}
//!     fn resume(&mut self) {}
//! }
//!
//! let bridge = StreamBridge::attach(Source, Vec::<Bytes>::new());
//! bridge.on_data(BytesMut::from(&b"AB"[..]));
//! bridge.on_data(BytesMut::from(&b"CD"[..]));
//! bridge.on_end();
//!
//! assert_eq!(bridge.sink().len(), 2);
//! assert!(bridge.is_finished());
//! ```
//!
//! # Async bridge (feature = "async-io")
//!
//! ```ignore
//! use blockpipe::{bridge_async, BridgeConfig, Passthrough};
//! use futures_io::{AsyncRead, AsyncWrite};
//!
//! async fn demo<R: AsyncRead, W: AsyncWrite>(reader: R, writer: W) -> Result<(), blockpipe::PipeError> {
//!     let report = bridge_async(reader, writer, BridgeConfig::default(), Passthrough).await?;
//!     println!("bridged {} bytes", report.bytes_written);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bridge;
mod config;
mod copier;
mod error;
mod hash;

mod buffer; // internal (thread-local reuse)
mod util; // internal read helpers

#[cfg(feature = "async-io")]
mod async_bridge;

//
// Public surface
//

pub use bridge::{
    BridgeStats, ChunkSink, ChunkSource, ChunkState, Control, PauseReason, PauseReasons,
    StreamBridge, Transform, bridge,
};
pub use config::{BridgeConfig, CopyConfig, HashConfig};
pub use copier::{BlockCopier, Copied, CopyReport, SizedSource, copy};
pub use error::PipeError;
pub use hash::Digest;

#[cfg(feature = "async-io")]
pub use async_bridge::{AsyncTransform, Bridge, BridgeReport, Passthrough, Transformed, bridge_async};
