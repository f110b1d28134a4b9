//! Pool — reusable chunk buffers for reader workers.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;

/// Hands out zeroed `chunk_size` buffers and takes them back on drop.
///
/// At most `max_idle` buffers are retained, so the pool never holds more than
/// the reader parallelism worth of memory.
#[derive(Debug)]
pub struct BufferPool {
    chunk_size: usize,
    max_idle: usize,
    idle: Mutex<Vec<BytesMut>>,
}

impl BufferPool {
    pub fn new(chunk_size: usize, max_idle: usize) -> Arc<Self> {
        Arc::new(Self {
            chunk_size,
            max_idle,
            idle: Mutex::new(Vec::with_capacity(max_idle)),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    pub fn rent(self: &Arc<Self>) -> PooledBuffer {
        let buf = self.idle.lock().pop().unwrap_or_else(|| {
            let mut b = BytesMut::with_capacity(self.chunk_size);
            b.resize(self.chunk_size, 0);
            b
        });
        PooledBuffer {
            buf: Some(buf),
            pool: Arc::clone(self),
        }
    }

    fn give_back(&self, buf: BytesMut) {
        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(buf);
        }
    }
}

/// A rented buffer; returns itself to the pool when dropped.
pub struct PooledBuffer {
    buf: Option<BytesMut>,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or(&[])
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or(&mut [])
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.give_back(buf);
        }
    }
}
