//! Async stream bridge.
//!
//! This module bridges a `futures-io::AsyncRead` into a `futures-io::AsyncWrite`,
//! making it runtime-agnostic and compatible with tokio, async-std, smol, and
//! other async runtimes.
//!
//! - [`bridge_async`] - Creates a future that pumps the reader into the writer
//! - [`Transformed`] - Per-chunk decision returned by a transform
//!
//! This module requires the `async-io` feature to be enabled.

mod bridge;

pub use bridge::{AsyncTransform, Bridge, BridgeReport, Passthrough, Transformed, bridge_async};
