//! Flow-controlled bridge between a chunk source and a chunk sink.
//!
//! - [`StreamBridge`] - Event-driven bridge fed by the host's data/drain/end events
//! - [`bridge`] - Attaches a bridge with an optional transform
//! - [`Control`] - Per-chunk stop/resume handle given to transforms
//! - [`ChunkSource`] / [`ChunkSink`] - The two stream endpoints
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use blockpipe::{ChunkSink, ChunkSource, StreamBridge};
//! use bytes::{Bytes, BytesMut};
//!
//! struct Source;
//!
//! impl ChunkSource for Source {
//!     fn pause(&mut self) {}
//!     fn resume(&mut self) {}
//! }
//!
//! let received = Rc::new(RefCell::new(Vec::<Bytes>::new()));
//! let bridge = StreamBridge::with_transform(Source, Rc::clone(&received), |chunk, _control| {
//!     for byte in chunk.iter_mut() {
//!         *byte = !*byte;
//!     }
//! });
//!
//! bridge.on_data(BytesMut::from(&b"AB"[..]));
//! bridge.on_end();
//!
//! assert_eq!(received.borrow()[0], Bytes::from(vec![!b'A', !b'B']));
//! ```

mod control;
mod engine;
mod pause;

use std::cell::RefCell;
use std::rc::Rc;

use bytes::Bytes;

pub use control::{ChunkState, Control};
pub use engine::{BridgeStats, StreamBridge, Transform};
pub use pause::{PauseReason, PauseReasons};

/// The readable side of a bridge.
///
/// The bridge only needs to stop and restart the flow of data events; the
/// events themselves are delivered by the host.
pub trait ChunkSource {
    /// Stops emitting data events.
    fn pause(&mut self);

    /// Starts emitting data events again.
    fn resume(&mut self);
}

/// The writable side of a bridge.
pub trait ChunkSink {
    /// Accepts a chunk.
    ///
    /// Returns `false` when the sink is over capacity; the bridge then pauses
    /// the source until the host reports a drain.
    fn write(&mut self, chunk: Bytes) -> bool;
}

impl<T: ChunkSource + ?Sized> ChunkSource for Rc<RefCell<T>> {
    fn pause(&mut self) {
        self.borrow_mut().pause();
    }

    fn resume(&mut self) {
        self.borrow_mut().resume();
    }
}

impl<T: ChunkSink + ?Sized> ChunkSink for Rc<RefCell<T>> {
    fn write(&mut self, chunk: Bytes) -> bool {
        self.borrow_mut().write(chunk)
    }
}

/// An unbounded in-memory sink; never signals backpressure.
impl ChunkSink for Vec<Bytes> {
    fn write(&mut self, chunk: Bytes) -> bool {
        self.push(chunk);
        true
    }
}

/// Attaches a bridge between `source` and `sink`.
///
/// With `transform` set, every chunk passes through it first. Feed the
/// returned bridge with the stream pair's events.
pub fn bridge<S, K>(source: S, sink: K, transform: Option<Transform>) -> StreamBridge<S, K>
where
    S: ChunkSource + 'static,
    K: ChunkSink + 'static,
{
    StreamBridge::build(source, sink, transform)
}
