#![no_main]

use std::io::{self, Cursor, Write};

use libfuzzer_sys::fuzz_target;
use blockpipe::{BlockCopier, CopyConfig, HashConfig, copy};

#[derive(Default)]
struct WriteLog {
    data: Vec<u8>,
    writes: Vec<usize>,
}

impl Write for WriteLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        self.writes.push(buf.len());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fuzz_target!(|input: (u16, Vec<u8>)| {
    let (capacity, data) = input;
    let capacity = usize::from(capacity % 4096) + 1;

    let mut buffer = vec![0u8; capacity];
    let mut dest = WriteLog::default();
    let report = copy(Cursor::new(&data), &mut dest, &mut buffer, true, None)
        .unwrap()
        .into_report();

    // Verify: content is copied unchanged
    assert_eq!(dest.data, data);

    // Verify: every write but the tail fills the buffer
    let full = data.len() / capacity;
    let tail = data.len() % capacity;
    assert_eq!(report.full_chunks as usize, full);
    assert_eq!(report.tail_len, tail);
    assert_eq!(dest.writes.len(), full + usize::from(tail != 0));
    assert!(dest.writes[..full].iter().all(|&w| w == capacity));

    // Verify: digest depends on content only
    let config = CopyConfig::new(capacity).unwrap().with_hash_config(HashConfig::enabled());
    let a = BlockCopier::new(config).copy(Cursor::new(&data), Vec::new()).unwrap().into_report();
    let b = BlockCopier::new(config.with_buffer_size(capacity + 1))
        .copy(Cursor::new(&data), Vec::new())
        .unwrap()
        .into_report();
    assert_eq!(a.digest, b.digest);
});
