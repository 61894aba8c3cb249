// Integration tests for the event-driven StreamBridge
// Tests cover: plain forwarding, backpressure, transform hold/resume, teardown

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use blockpipe::{
    ChunkSink, ChunkSource, ChunkState, Control, PauseReason, StreamBridge, Transform, bridge,
};
use bytes::{Bytes, BytesMut};

// ============================================================================
// Test doubles
// ============================================================================

/// Records pause/resume calls; a host would stop emitting while paused.
#[derive(Debug, Default)]
struct Source {
    paused: bool,
    log: Vec<&'static str>,
}

impl ChunkSource for Source {
    fn pause(&mut self) {
        self.paused = true;
        self.log.push("pause");
    }

    fn resume(&mut self) {
        self.paused = false;
        self.log.push("resume");
    }
}

/// Sink with a fixed buffer capacity in chunks; `drain` empties the buffer.
#[derive(Debug)]
struct Sink {
    received: Vec<Bytes>,
    buffered: usize,
    capacity: usize,
}

impl Sink {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            received: Vec::new(),
            buffered: 0,
            capacity,
        }
    }

    fn drain(&mut self) {
        self.buffered = 0;
    }

    fn bytes(&self) -> Vec<u8> {
        self.received.iter().flat_map(|c| c.iter().copied()).collect()
    }
}

impl ChunkSink for Sink {
    fn write(&mut self, chunk: Bytes) -> bool {
        self.received.push(chunk);
        self.buffered += 1;
        self.buffered < self.capacity
    }
}

fn chunk(data: &[u8]) -> BytesMut {
    BytesMut::from(data)
}

fn invert(chunk: &mut BytesMut, _control: &Control) {
    for byte in chunk.iter_mut() {
        *byte = !*byte;
    }
}

/// Transform that stops every chunk and parks its control for the test.
fn parking(slot: Rc<RefCell<Vec<Control>>>) -> impl FnMut(&mut BytesMut, &Control) + 'static {
    move |_, control| {
        assert!(control.stop());
        slot.borrow_mut().push(control.clone());
    }
}

// ============================================================================
// Plain forwarding
// ============================================================================

#[test]
fn test_plain_bridge_forwards_in_order() {
    let bridge = StreamBridge::attach(Source::default(), Sink::with_capacity(usize::MAX));
    let chunks: Vec<&[u8]> = vec![b"one", b"two", b"three"];
    for c in &chunks {
        bridge.on_data(chunk(c));
    }
    bridge.on_end();

    let sink = bridge.sink();
    assert_eq!(sink.received.len(), 3);
    assert_eq!(sink.bytes(), b"onetwothree");
    assert_eq!(bridge.stats().bytes_received, bridge.stats().bytes_forwarded);
}

#[test]
fn test_backpressure_cycle() {
    let bridge = StreamBridge::attach(Source::default(), Rc::new(RefCell::new(Sink::with_capacity(2))));

    bridge.on_data(chunk(b"a"));
    assert!(!bridge.is_paused());
    bridge.on_data(chunk(b"b"));
    assert!(bridge.is_paused());
    assert!(bridge.source().paused);

    bridge.sink().borrow_mut().drain();
    bridge.on_drain();
    assert!(!bridge.source().paused);
    assert_eq!(bridge.source().log, vec!["pause", "resume"]);
    assert_eq!(bridge.stats().backpressure_events, 1);
}

#[test]
fn test_drain_without_backpressure_is_noop() {
    let bridge = StreamBridge::attach(Source::default(), Sink::with_capacity(usize::MAX));
    bridge.on_drain();
    assert!(bridge.source().log.is_empty());
}

// ============================================================================
// Transforms
// ============================================================================

#[test]
fn test_inverting_transform_scenario() {
    let bridge = StreamBridge::with_transform(Source::default(), Sink::with_capacity(usize::MAX), invert);
    bridge.on_data(chunk(b"AB"));
    bridge.on_data(chunk(b"CD"));
    bridge.on_end();

    let sink = bridge.sink();
    assert_eq!(sink.received[0], Bytes::from(vec![!b'A', !b'B']));
    assert_eq!(sink.received[1], Bytes::from(vec![!b'C', !b'D']));
}

#[test]
fn test_silent_transform_matches_plain_bridge() {
    let plain = StreamBridge::attach(Source::default(), Sink::with_capacity(2));
    let silent = StreamBridge::with_transform(Source::default(), Sink::with_capacity(2), |_, _| {});

    for b in [&plain, &silent] {
        b.on_data(chunk(b"xy"));
        b.on_data(chunk(b"z"));
        b.on_drain();
        b.on_end();
    }

    assert_eq!(plain.sink().received, silent.sink().received);
    assert_eq!(plain.source().log, silent.source().log);
}

#[test]
fn test_resume_before_stop_is_noop() {
    let bridge = StreamBridge::with_transform(Source::default(), Sink::with_capacity(usize::MAX), |_, control| {
        assert!(!control.resume(), "resume before stop must be rejected");
    });
    bridge.on_data(chunk(b"AB"));

    assert_eq!(bridge.sink().received.len(), 1);
    assert!(bridge.source().log.is_empty());
}

#[test]
fn test_held_chunk_waits_for_resume() {
    let slot = Rc::new(RefCell::new(Vec::new()));
    let bridge = StreamBridge::with_transform(Source::default(), Sink::with_capacity(usize::MAX), parking(Rc::clone(&slot)));

    bridge.on_data(chunk(b"AB"));
    assert!(bridge.sink().received.is_empty());
    assert_eq!(bridge.chunk_state(), ChunkState::ExternallyPaused);
    assert!(bridge.source().paused);

    // A second stop on the same chunk is rejected
    let control = slot.borrow()[0].clone();
    assert!(!control.stop());

    assert!(control.resume());
    assert_eq!(bridge.sink().received, vec![Bytes::from("AB")]);
    assert_eq!(bridge.chunk_state(), ChunkState::Idle);
    assert_eq!(bridge.source().log, vec!["pause", "resume"]);
}

#[test]
fn test_chunks_delivered_while_held_stay_ordered() {
    let slot = Rc::new(RefCell::new(Vec::new()));
    let bridge = StreamBridge::with_transform(Source::default(), Sink::with_capacity(usize::MAX), parking(Rc::clone(&slot)));

    // A misbehaving source keeps emitting while paused
    bridge.on_data(chunk(b"1"));
    bridge.on_data(chunk(b"2"));
    bridge.on_data(chunk(b"3"));
    assert_eq!(slot.borrow().len(), 1, "only one chunk awaits a decision");

    for expected in 1..=3 {
        let control = slot.borrow()[expected - 1].clone();
        control.resume();
        assert_eq!(bridge.sink().received.len(), expected);
    }
    assert_eq!(bridge.sink().bytes(), b"123");
}

#[test]
fn test_stale_control_cannot_affect_next_chunk() {
    let slot = Rc::new(RefCell::new(Vec::new()));
    let bridge = StreamBridge::with_transform(Source::default(), Sink::with_capacity(usize::MAX), parking(Rc::clone(&slot)));

    bridge.on_data(chunk(b"1"));
    let first = slot.borrow()[0].clone();
    first.resume();

    bridge.on_data(chunk(b"2"));
    assert!(!first.resume(), "old control must not release the new chunk");
    assert_eq!(bridge.sink().received.len(), 1);

    let second = slot.borrow()[1].clone();
    assert!(second.resume());
    assert_eq!(bridge.sink().received.len(), 2);
}

#[test]
fn test_transform_resume_respects_backpressure() {
    let slot = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::new(RefCell::new(Sink::with_capacity(1)));
    let bridge = StreamBridge::with_transform(Source::default(), Rc::clone(&sink), parking(Rc::clone(&slot)));

    bridge.on_data(chunk(b"x"));
    let control = slot.borrow()[0].clone();
    control.resume();

    // The forwarded chunk overflowed the sink: paused for backpressure only
    assert!(bridge.source().paused);
    assert!(bridge.pause_reasons().contains(PauseReason::Backpressure));
    assert!(!bridge.pause_reasons().contains(PauseReason::Transform));

    sink.borrow_mut().drain();
    bridge.on_drain();
    assert!(!bridge.source().paused);
}

// ============================================================================
// Reentrant hosts
// ============================================================================

/// Source that emits its next chunk synchronously as soon as it is resumed.
struct EagerSource {
    bridge: Weak<StreamBridge<EagerSource, Vec<Bytes>>>,
    pending: Vec<BytesMut>,
}

impl ChunkSource for EagerSource {
    fn pause(&mut self) {}

    fn resume(&mut self) {
        let Some(bridge) = self.bridge.upgrade() else {
            return;
        };
        if let Some(next) = self.pending.pop() {
            bridge.on_data(next);
        }
    }
}

#[test]
fn test_source_emitting_from_resume_stays_behind_held_chunk() {
    let slot = Rc::new(RefCell::new(Vec::new()));
    let keep = Rc::clone(&slot);

    let bridge = Rc::new_cyclic(|weak: &Weak<StreamBridge<EagerSource, Vec<Bytes>>>| {
        let source = EagerSource {
            bridge: weak.clone(),
            pending: vec![chunk(b"CD")],
        };
        StreamBridge::with_transform(source, Vec::new(), move |chunk: &mut BytesMut, control: &Control| {
            if &chunk[..] == b"AB" {
                assert!(control.stop());
                keep.borrow_mut().push(control.clone());
            }
        })
    });

    bridge.on_data(chunk(b"AB"));
    assert!(bridge.sink().is_empty());

    let control = slot.borrow()[0].clone();
    assert!(control.resume());

    assert_eq!(*bridge.sink(), vec![Bytes::from("AB"), Bytes::from("CD")]);
    assert!(bridge.source().pending.is_empty());
    assert_eq!(bridge.chunk_state(), ChunkState::Idle);
}

/// Source whose host flushes the sink as soon as the source is paused.
struct FlushOnPause {
    bridge: Weak<StreamBridge<FlushOnPause, Rc<RefCell<Sink>>>>,
    sink: Rc<RefCell<Sink>>,
    log: Vec<&'static str>,
}

impl ChunkSource for FlushOnPause {
    fn pause(&mut self) {
        self.log.push("pause");
        self.sink.borrow_mut().drain();
        if let Some(bridge) = self.bridge.upgrade() {
            bridge.on_drain();
        }
    }

    fn resume(&mut self) {
        self.log.push("resume");
    }
}

#[test]
fn test_drain_from_pause_callback_resumes_source() {
    let sink = Rc::new(RefCell::new(Sink::with_capacity(1)));
    let bridge = Rc::new_cyclic(|weak: &Weak<StreamBridge<FlushOnPause, Rc<RefCell<Sink>>>>| {
        let source = FlushOnPause {
            bridge: weak.clone(),
            sink: Rc::clone(&sink),
            log: Vec::new(),
        };
        StreamBridge::attach(source, Rc::clone(&sink))
    });

    bridge.on_data(chunk(b"a"));
    bridge.on_data(chunk(b"b"));

    assert_eq!(bridge.source().log, vec!["pause", "resume", "pause", "resume"]);
    assert!(!bridge.is_paused());
    assert_eq!(sink.borrow().bytes(), b"ab");
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn test_end_detaches_listeners() {
    let bridge = StreamBridge::attach(Source::default(), Sink::with_capacity(1));
    bridge.on_data(chunk(b"a"));
    assert!(bridge.source().paused);

    bridge.on_end();
    assert!(!bridge.is_attached());

    bridge.on_data(chunk(b"late"));
    bridge.on_drain();
    assert_eq!(bridge.sink().received.len(), 1);
    assert!(bridge.source().paused, "drain after end is not observed");
}

#[test]
fn test_held_chunk_forwarded_after_end() {
    let slot = Rc::new(RefCell::new(Vec::new()));
    let bridge = StreamBridge::with_transform(Source::default(), Sink::with_capacity(usize::MAX), parking(Rc::clone(&slot)));

    bridge.on_data(chunk(b"last"));
    bridge.on_end();
    assert!(!bridge.is_finished());

    slot.borrow()[0].resume();
    assert!(bridge.is_finished());
    assert_eq!(bridge.sink().bytes(), b"last");
}

#[test]
fn test_bridge_fn_with_optional_transform() {
    let transform: Transform = Box::new(invert);
    let with = bridge(Source::default(), Vec::<Bytes>::new(), Some(transform));
    let without = bridge(Source::default(), Vec::<Bytes>::new(), None);

    with.on_data(chunk(&[0x0F]));
    without.on_data(chunk(&[0x0F]));

    assert_eq!(with.sink()[0], Bytes::from_static(&[0xF0]));
    assert_eq!(without.sink()[0], Bytes::from_static(&[0x0F]));
}

#[test]
fn test_control_outlives_bridge() {
    let slot = Rc::new(RefCell::new(Vec::new()));
    {
        let bridge = StreamBridge::with_transform(Source::default(), Sink::with_capacity(usize::MAX), parking(Rc::clone(&slot)));
        bridge.on_data(chunk(b"x"));
    }
    assert!(!slot.borrow()[0].resume());
}
