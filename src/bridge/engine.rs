//! Event-driven bridge core.

use std::cell::{Ref, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace, warn};

use super::control::{ChunkGate, ChunkState, Control, GateAction, Signal};
use super::pause::{PauseReason, PauseReasons, Transition};
use super::{ChunkSink, ChunkSource};

/// Per-chunk transform run by a [`StreamBridge`].
pub type Transform = Box<dyn FnMut(&mut BytesMut, &Control)>;

/// Counters collected over the life of a bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Data events accepted from the source.
    pub chunks_received: u64,
    /// Chunks written to the sink.
    pub chunks_forwarded: u64,
    /// Bytes received from the source.
    pub bytes_received: u64,
    /// Bytes written to the sink (after transform).
    pub bytes_forwarded: u64,
    /// Chunks the transform held back with a stop signal.
    pub chunks_held: u64,
    /// Writes the sink answered with backpressure.
    pub backpressure_events: u64,
}

/// A call into the source or the sink, made with no bridge state borrowed.
enum Effect {
    Write(Bytes),
    Pause,
    Resume,
}

/// The next unit of work for the event loop.
enum Work {
    Effect(Effect),
    Chunk(BytesMut),
}

struct Shared {
    transform: Option<Transform>,
    has_transform: bool,
    pauses: PauseReasons,
    source_paused: bool,
    gate: ChunkGate,
    in_transform: bool,
    held: Option<BytesMut>,
    queue: VecDeque<BytesMut>,
    effects: VecDeque<Effect>,
    pumping: bool,
    attached: bool,
    stats: BridgeStats,
}

impl Shared {
    fn raise(&mut self, reason: PauseReason) {
        if self.pauses.raise(reason) == Transition::Pause {
            self.effects.push_back(Effect::Pause);
        }
    }

    fn clear(&mut self, reason: PauseReason) {
        if self.pauses.clear(reason) == Transition::Resume {
            self.effects.push_back(Effect::Resume);
        }
    }

    fn busy(&self) -> bool {
        self.in_transform || self.held.is_some() || !self.queue.is_empty() || !self.effects.is_empty()
    }

    fn next_work(&mut self) -> Option<Work> {
        if let Some(effect) = self.effects.pop_front() {
            return Some(Work::Effect(effect));
        }
        if self.held.is_some() || self.gate.state() != ChunkState::Idle {
            return None;
        }
        self.queue.pop_front().map(Work::Chunk)
    }
}

struct Core<S, K> {
    source: RefCell<S>,
    sink: RefCell<K>,
    state: RefCell<Shared>,
}

impl<S, K> Core<S, K>
where
    S: ChunkSource + 'static,
    K: ChunkSink + 'static,
{
    /// Runs queued effects and chunks until nothing is left to do.
    ///
    /// Source, sink and transform are called with the state released, so
    /// they may deliver events back into the bridge. Such events only queue
    /// work; the outermost call drains it in order.
    fn pump(self: &Rc<Self>) {
        {
            let mut st = self.state.borrow_mut();
            if st.pumping {
                return;
            }
            st.pumping = true;
        }

        loop {
            let work = self.state.borrow_mut().next_work();
            match work {
                Some(Work::Effect(effect)) => self.perform(effect),
                Some(Work::Chunk(chunk)) => self.run_transform(chunk),
                None => break,
            }
        }

        self.state.borrow_mut().pumping = false;
    }

    fn perform(&self, effect: Effect) {
        match effect {
            Effect::Write(chunk) => {
                {
                    let mut st = self.state.borrow_mut();
                    st.stats.chunks_forwarded += 1;
                    st.stats.bytes_forwarded += chunk.len() as u64;
                }
                trace!(len = chunk.len(), "forwarding chunk");

                let accepted = self.sink.borrow_mut().write(chunk);
                if !accepted {
                    let mut st = self.state.borrow_mut();
                    st.stats.backpressure_events += 1;
                    trace!("sink over capacity, pausing source");
                    if st.pauses.raise(PauseReason::Backpressure) == Transition::Pause {
                        st.effects.push_front(Effect::Pause);
                    }
                }
            }
            Effect::Pause => {
                {
                    let mut st = self.state.borrow_mut();
                    if st.source_paused {
                        return;
                    }
                    st.source_paused = true;
                }
                self.source.borrow_mut().pause();
            }
            Effect::Resume => {
                {
                    let mut st = self.state.borrow_mut();
                    // a reason raised since this resume was queued keeps the source paused
                    if !st.source_paused || st.pauses.is_paused() {
                        return;
                    }
                    st.source_paused = false;
                }
                self.source.borrow_mut().resume();
            }
        }
    }

    /// Hands `chunk` to the transform and queues its write, unless the
    /// transform holds it.
    fn run_transform(self: &Rc<Self>, mut chunk: BytesMut) {
        let (mut transform, control) = {
            let mut st = self.state.borrow_mut();
            let seq = st.gate.begin();
            st.in_transform = true;
            let weak = Rc::downgrade(self);
            let target: Weak<dyn Signal> = weak;
            (st.transform.take(), Control::new(seq, target))
        };

        if let Some(transform) = transform.as_mut() {
            transform(&mut chunk, &control);
        }

        let mut st = self.state.borrow_mut();
        st.transform = transform;
        st.in_transform = false;

        if st.gate.state() == ChunkState::ExternallyPaused {
            trace!(len = chunk.len(), "transform holding chunk");
            st.stats.chunks_held += 1;
            st.held = Some(chunk);
            return;
        }

        st.gate.finish();
        st.effects.push_back(Effect::Write(chunk.freeze()));
    }
}

impl<S, K> Signal for Core<S, K>
where
    S: ChunkSource + 'static,
    K: ChunkSink + 'static,
{
    fn signal(self: Rc<Self>, seq: u64, stop: bool) -> bool {
        {
            let mut st = self.state.borrow_mut();

            match st.gate.signal(seq, stop) {
                GateAction::Ignored => return false,
                GateAction::Pause => st.raise(PauseReason::Transform),
                // Still inside the transform: `run_transform` queues the write on return.
                GateAction::Resume if st.in_transform => st.clear(PauseReason::Transform),
                GateAction::Resume => {
                    st.gate.finish();
                    // The held chunk goes out before the source may emit again.
                    if let Some(chunk) = st.held.take() {
                        st.effects.push_back(Effect::Write(chunk.freeze()));
                    }
                    st.clear(PauseReason::Transform);
                }
            }
        }

        self.pump();
        true
    }
}

/// Connects a [`ChunkSource`] to a [`ChunkSink`].
///
/// The host delivers the source's events through [`StreamBridge::on_data`]
/// and [`StreamBridge::on_end`], and the sink's drain event through
/// [`StreamBridge::on_drain`]. Events must be delivered serially from one
/// thread; the bridge is `!Send`.
///
/// Without a transform every chunk is written straight to the sink. With a
/// transform each chunk is first handed to it together with a [`Control`];
/// see [`Control`] for the hold/resume protocol.
///
/// Backpressure and transform holds are tracked as separate pause reasons:
/// a drain does not resume a source the transform is still holding, and a
/// transform resume does not override an undrained sink.
///
/// Source, sink and transform callbacks may deliver events back into the
/// bridge synchronously. Those events are queued and handled in order after
/// the current callback returns.
pub struct StreamBridge<S, K> {
    core: Rc<Core<S, K>>,
}

impl<S, K> StreamBridge<S, K>
where
    S: ChunkSource + 'static,
    K: ChunkSink + 'static,
{
    /// Attaches a plain forwarding bridge.
    pub fn attach(source: S, sink: K) -> Self {
        Self::build(source, sink, None)
    }

    /// Attaches a bridge that runs `transform` on every chunk before forwarding it.
    pub fn with_transform<F>(source: S, sink: K, transform: F) -> Self
    where
        F: FnMut(&mut BytesMut, &Control) + 'static,
    {
        Self::build(source, sink, Some(Box::new(transform)))
    }

    pub(crate) fn build(source: S, sink: K, transform: Option<Transform>) -> Self {
        debug!(transform = transform.is_some(), "bridge attached");
        let shared = Shared {
            has_transform: transform.is_some(),
            transform,
            pauses: PauseReasons::default(),
            source_paused: false,
            gate: ChunkGate::new(),
            in_transform: false,
            held: None,
            queue: VecDeque::new(),
            effects: VecDeque::new(),
            pumping: false,
            attached: true,
            stats: BridgeStats::default(),
        };
        Self {
            core: Rc::new(Core {
                source: RefCell::new(source),
                sink: RefCell::new(sink),
                state: RefCell::new(shared),
            }),
        }
    }

    /// Delivers a data event from the source.
    ///
    /// Chunks that arrive after end-of-data are dropped. A chunk that arrives
    /// while an earlier one is still held by the transform is queued and
    /// processed in order once the held chunk is forwarded.
    pub fn on_data(&self, chunk: BytesMut) {
        {
            let mut st = self.core.state.borrow_mut();
            if !st.attached {
                trace!(len = chunk.len(), "data after end ignored");
                return;
            }

            st.stats.chunks_received += 1;
            st.stats.bytes_received += chunk.len() as u64;

            if !st.has_transform {
                st.effects.push_back(Effect::Write(chunk.freeze()));
            } else {
                if st.in_transform || st.held.is_some() {
                    warn!(len = chunk.len(), "data delivered while a chunk is held, queueing");
                }
                st.queue.push_back(chunk);
            }
        }

        self.core.pump();
    }

    /// Delivers a drain event from the sink.
    pub fn on_drain(&self) {
        {
            let mut st = self.core.state.borrow_mut();
            if !st.attached {
                return;
            }
            st.clear(PauseReason::Backpressure);
            if st.pauses.contains(PauseReason::Transform) {
                trace!("drain while transform holds chunk, source stays paused");
            }
        }

        self.core.pump();
    }

    /// Delivers the source's end-of-data event and detaches the listeners.
    ///
    /// A chunk held by the transform at this point is still forwarded when
    /// the transform resumes it.
    pub fn on_end(&self) {
        let mut st = self.core.state.borrow_mut();
        if st.attached {
            st.attached = false;
            debug!(
                chunks = st.stats.chunks_forwarded,
                bytes = st.stats.bytes_forwarded,
                "bridge detached"
            );
        }
    }

    /// Returns true while data and drain events are being handled.
    pub fn is_attached(&self) -> bool {
        self.core.state.borrow().attached
    }

    /// Returns true once the source ended and every chunk has been forwarded.
    pub fn is_finished(&self) -> bool {
        let st = self.core.state.borrow();
        !st.attached && !st.busy()
    }

    /// Returns true if the bridge is holding the source paused.
    pub fn is_paused(&self) -> bool {
        self.core.state.borrow().pauses.is_paused()
    }

    /// Returns the active pause reasons.
    pub fn pause_reasons(&self) -> PauseReasons {
        self.core.state.borrow().pauses
    }

    /// Returns the state of the chunk in flight.
    pub fn chunk_state(&self) -> ChunkState {
        self.core.state.borrow().gate.state()
    }

    /// Returns the bridge counters.
    pub fn stats(&self) -> BridgeStats {
        self.core.state.borrow().stats
    }

    /// Borrows the source.
    pub fn source(&self) -> Ref<'_, S> {
        self.core.source.borrow()
    }

    /// Borrows the sink.
    pub fn sink(&self) -> Ref<'_, K> {
        self.core.sink.borrow()
    }
}

impl<S, K> std::fmt::Debug for StreamBridge<S, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.core.state.try_borrow() {
            Ok(st) => f
                .debug_struct("StreamBridge")
                .field("attached", &st.attached)
                .field("pauses", &st.pauses)
                .field("chunk_state", &st.gate.state())
                .field("queued", &st.queue.len())
                .field("stats", &st.stats)
                .finish(),
            Err(_) => f.write_str("StreamBridge { <busy> }"),
        }
    }
}
