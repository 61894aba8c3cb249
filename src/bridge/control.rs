//! Per-chunk pause/resume control handed to bridge transforms.

use std::fmt;
use std::rc::{Rc, Weak};

/// Where the chunk currently under consideration stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// No chunk is awaiting a decision.
    Idle,
    /// The transform was invoked and has not asked to stop.
    TransformPending,
    /// The transform asked to stop; the chunk is held and the source paused.
    ExternallyPaused,
    /// The transform asked to resume while it was still running; the chunk
    /// is forwarded as soon as the transform returns.
    Resuming,
}

/// Effect of a control signal on the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GateAction {
    Pause,
    Resume,
    Ignored,
}

/// Tracks the stop/resume protocol for the chunk in flight.
///
/// Every chunk gets a fresh sequence number; signals carrying an older
/// number are ignored, so a control handle only ever affects its own chunk.
#[derive(Debug)]
pub(crate) struct ChunkGate {
    seq: u64,
    state: ChunkState,
}

impl ChunkGate {
    pub(crate) fn new() -> Self {
        Self {
            seq: 0,
            state: ChunkState::Idle,
        }
    }

    pub(crate) fn state(&self) -> ChunkState {
        self.state
    }

    /// Starts a new chunk and returns its sequence number.
    pub(crate) fn begin(&mut self) -> u64 {
        self.seq += 1;
        self.state = ChunkState::TransformPending;
        self.seq
    }

    /// Marks the current chunk as forwarded.
    pub(crate) fn finish(&mut self) {
        self.state = ChunkState::Idle;
    }

    pub(crate) fn signal(&mut self, seq: u64, stop: bool) -> GateAction {
        if seq != self.seq {
            return GateAction::Ignored;
        }
        match (self.state, stop) {
            (ChunkState::TransformPending, true) => {
                self.state = ChunkState::ExternallyPaused;
                GateAction::Pause
            }
            (ChunkState::ExternallyPaused, false) => {
                self.state = ChunkState::Resuming;
                GateAction::Resume
            }
            // resume before stop, repeated stop, or chunk already forwarded
            _ => GateAction::Ignored,
        }
    }
}

/// Receiver of control signals; implemented by the bridge core.
pub(crate) trait Signal {
    fn signal(self: Rc<Self>, seq: u64, stop: bool) -> bool;
}

/// Handle a transform uses to hold back the chunk it was given.
///
/// Call [`Control::stop`] before starting out-of-band work; the source is
/// paused and the chunk is held. Call [`Control::resume`] (from inside the
/// transform or any time later) to forward the chunk and let the source
/// flow again. A transform that never touches the handle has its chunk
/// forwarded as soon as it returns.
///
/// The handle may be cloned and kept past the transform call. It is bound to
/// one chunk: once that chunk has been forwarded every further signal is a
/// no-op.
#[derive(Clone)]
pub struct Control {
    seq: u64,
    target: Weak<dyn Signal>,
}

impl Control {
    pub(crate) fn new(seq: u64, target: Weak<dyn Signal>) -> Self {
        Self { seq, target }
    }

    /// Sends a raw stop (`true`) or resume (`false`) signal.
    ///
    /// Returns whether the signal was accepted. The first `stop` is accepted
    /// once; a resume is only accepted after an accepted stop. Resuming
    /// before ever stopping is a no-op and the chunk flows normally.
    pub fn signal(&self, stop: bool) -> bool {
        match self.target.upgrade() {
            Some(target) => target.signal(self.seq, stop),
            None => false,
        }
    }

    /// Pauses the source and holds the current chunk.
    pub fn stop(&self) -> bool {
        self.signal(true)
    }

    /// Forwards the held chunk and releases the transform's pause.
    pub fn resume(&self) -> bool {
        self.signal(false)
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control")
            .field("seq", &self.seq)
            .field("attached", &(self.target.strong_count() > 0))
            .finish()
    }
}
