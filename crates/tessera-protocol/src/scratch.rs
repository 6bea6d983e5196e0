//! Pooled scratch buffers for section decompression.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Hands out byte buffers and takes them back. Implementations must be safe to share
/// between threads decoding independent messages.
pub trait BufferPool: Send + Sync {
    /// Returns an empty buffer with at least `min_size` bytes of capacity.
    fn rent(&self, min_size: usize) -> Vec<u8>;

    /// Returns a buffer obtained from [`BufferPool::rent`].
    fn release(&self, buffer: Vec<u8>);
}

/// A rented buffer that goes back to its pool when dropped, on success and error paths alike.
pub struct PooledBuffer<'a> {
    pool: &'a dyn BufferPool,
    buffer: Vec<u8>,
}

impl<'a> PooledBuffer<'a> {
    pub fn rent(pool: &'a dyn BufferPool, min_size: usize) -> Self {
        Self {
            pool,
            buffer: pool.rent(min_size),
        }
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buffer));
    }
}

/// Free-list pool. Keeps up to `max_retained` released buffers around for reuse.
#[derive(Debug)]
pub struct ScratchPool {
    free: Mutex<Vec<Vec<u8>>>,
    max_retained: usize,
    outstanding: AtomicUsize,
}

impl ScratchPool {
    pub fn new(max_retained: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_retained,
            outstanding: AtomicUsize::new(0),
        }
    }

    /// Number of rented buffers not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Number of buffers waiting for reuse.
    pub fn retained(&self) -> usize {
        self.free_list().len()
    }

    fn free_list(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        // A panic while holding the lock cannot leave the list half-updated.
        match self.free.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ScratchPool {
    fn default() -> Self {
        Self::new(4)
    }
}

impl BufferPool for ScratchPool {
    fn rent(&self, min_size: usize) -> Vec<u8> {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        let mut free = self.free_list();
        match free.iter().position(|buffer| buffer.capacity() >= min_size) {
            Some(index) => free.swap_remove(index),
            None => Vec::with_capacity(min_size),
        }
    }

    fn release(&self, mut buffer: Vec<u8>) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
        buffer.clear();
        let mut free = self.free_list();
        if free.len() < self.max_retained {
            free.push(buffer);
        }
    }
}
