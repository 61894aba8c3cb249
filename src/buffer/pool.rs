//! Thread-local pool of copy buffers.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

/// Largest buffer returned to the pool; bigger ones are freed on drop.
pub const MAX_POOLED_CAPACITY: usize = 8 * 1024 * 1024;

/// Maximum number of buffers to keep per thread.
pub const MAX_POOL_SIZE: usize = 4;

/// A reusable, fixed-length working buffer.
///
/// Dereferences to a slice of exactly the requested capacity.
pub struct CopyBuffer {
    data: Vec<u8>,
}

impl CopyBuffer {
    /// Takes a buffer of `len` bytes from the thread-local pool or allocates one.
    pub fn take(len: usize) -> Self {
        THREAD_BUFFER_POOL.with(|pool| {
            let mut pool = pool.borrow_mut();
            let mut data = match pool.iter().position(|v| v.capacity() >= len) {
                Some(i) => pool.swap_remove(i),
                None => Vec::with_capacity(len),
            };
            data.resize(len, 0);
            Self { data }
        })
    }
}

impl Deref for CopyBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for CopyBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for CopyBuffer {
    fn drop(&mut self) {
        if self.data.capacity() <= MAX_POOLED_CAPACITY {
            self.data.clear();
            THREAD_BUFFER_POOL.with(|pool| {
                let mut pool = pool.borrow_mut();
                if pool.len() < MAX_POOL_SIZE {
                    pool.push(std::mem::take(&mut self.data));
                }
            });
        }
    }
}

thread_local! {
    static THREAD_BUFFER_POOL: RefCell<Vec<Vec<u8>>> = const { RefCell::new(Vec::new()) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_take_has_exact_len() {
        let buf = CopyBuffer::take(4096);
        assert_eq!(buf.len(), 4096);
    }

    #[test]
    fn test_buffer_reuse() {
        let ptr = {
            let mut buf = CopyBuffer::take(1024);
            buf[0] = 0xFF;
            buf.as_ptr()
        };

        // Same thread, smaller request: the pooled allocation comes back zeroed
        let buf = CopyBuffer::take(512);
        assert_eq!(buf.as_ptr(), ptr);
        assert_eq!(buf.len(), 512);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_oversized_buffer_not_pooled() {
        {
            let _buf = CopyBuffer::take(MAX_POOLED_CAPACITY + 1);
        }
        THREAD_BUFFER_POOL.with(|pool| {
            assert!(
                pool.borrow()
                    .iter()
                    .all(|v| v.capacity() <= MAX_POOLED_CAPACITY)
            );
        });
    }
}
