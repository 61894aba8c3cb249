//! Internal working-buffer management for block copies.
//!
//! This module provides a thread-local pool of copy buffers so repeated
//! copies on one thread reuse their allocation. It is an implementation
//! detail and not part of the public API.

mod pool;

pub(crate) use pool::CopyBuffer;
