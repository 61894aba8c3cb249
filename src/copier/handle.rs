//! Source handles that know how much data they hold.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek};

/// A readable handle that can report how many bytes remain from its cursor.
///
/// The block copier reads strictly sequentially through the handle's own
/// cursor. The length reported here is taken once, before the first read,
/// and fixes the size of the tail chunk for the whole copy.
///
/// The length must be accurate. A source that under-reports it loses its
/// final partial chunk: the copy writes full chunks until the data runs out
/// and then only the precomputed tail, logging a warning. This includes a
/// [`File`] opened on a FIFO, socket or character device, whose metadata
/// length is 0.
pub trait SizedSource: Read {
    /// Returns the number of bytes between the current cursor and the end.
    fn remaining_len(&mut self) -> io::Result<u64>;
}

impl SizedSource for File {
    fn remaining_len(&mut self) -> io::Result<u64> {
        let pos = self.stream_position()?;
        Ok(self.metadata()?.len().saturating_sub(pos))
    }
}

impl<T: AsRef<[u8]>> SizedSource for Cursor<T> {
    fn remaining_len(&mut self) -> io::Result<u64> {
        let len = self.get_ref().as_ref().len() as u64;
        Ok(len.saturating_sub(self.position()))
    }
}

impl<S: SizedSource + ?Sized> SizedSource for &mut S {
    fn remaining_len(&mut self) -> io::Result<u64> {
        (**self).remaining_len()
    }
}
