#![no_main]

use std::cell::RefCell;
use std::rc::Rc;

use bytes::{Bytes, BytesMut};
use libfuzzer_sys::fuzz_target;
use blockpipe::{ChunkSink, ChunkSource, Control, StreamBridge};

#[derive(Default)]
struct Source {
    paused: bool,
}

impl ChunkSource for Source {
    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }
}

struct Sink {
    received: Vec<u8>,
    buffered: usize,
}

impl ChunkSink for Sink {
    fn write(&mut self, chunk: Bytes) -> bool {
        self.received.extend_from_slice(&chunk);
        self.buffered += 1;
        self.buffered < 3
    }
}

// Each op byte drives one event: data, drain, or a control signal on a parked chunk.
fuzz_target!(|ops: Vec<u8>| {
    let parked: Rc<RefCell<Vec<Control>>> = Rc::default();
    let slot = Rc::clone(&parked);
    let sink = Rc::new(RefCell::new(Sink { received: Vec::new(), buffered: 0 }));

    let bridge = StreamBridge::with_transform(Source::default(), Rc::clone(&sink), move |chunk: &mut BytesMut, control: &Control| {
        if chunk[0] % 2 == 0 {
            control.stop();
            slot.borrow_mut().push(control.clone());
        }
    });

    let mut expected = Vec::new();
    for (i, op) in ops.iter().enumerate() {
        match op % 4 {
            0 | 1 => {
                expected.push(*op);
                bridge.on_data(BytesMut::from(&[*op][..]));
            }
            2 => {
                sink.borrow_mut().buffered = 0;
                bridge.on_drain();
            }
            _ => {
                let controls = parked.borrow().clone();
                if let Some(control) = controls.get(i % controls.len().max(1)) {
                    control.signal(i % 2 == 0);
                }
            }
        }
    }
    bridge.on_end();

    // Release everything still held
    loop {
        let controls = parked.borrow().clone();
        if !controls.iter().any(|c| c.resume()) {
            break;
        }
    }

    assert!(bridge.is_finished());
    assert_eq!(sink.borrow().received, expected);
});
