//! Grow-on-demand staging buffers.
//!
//! A [`StagingBuffer`] is an owned byte arena with a capacity and a logical
//! length. Stream engines use it to hold one block while it is being
//! assembled, compressed, or decoded.
//!
//! Growth never preserves the old contents: the buffer only ever holds one
//! block at a time, and a larger block replaces it entirely. The buffer never
//! shrinks until [`StagingBuffer::release`] is called.

use crate::error::{BlockpackError, Result};

/// Owned, reusable byte buffer holding at most one block.
#[derive(Debug, Clone, Default)]
pub struct StagingBuffer {
    /// Backing storage; its length is the capacity.
    buf: Vec<u8>,
    /// Number of valid bytes at the front of `buf`.
    len: usize,
}

impl StagingBuffer {
    /// Create an empty, unallocated buffer.
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            len: 0,
        }
    }

    /// Create a buffer with `capacity` bytes allocated up front.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut staging = Self::new();
        staging.reserve(capacity)?;
        Ok(staging)
    }

    /// Allocated capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of valid bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no valid bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Free space after the valid bytes.
    #[inline]
    pub fn space_left(&self) -> usize {
        self.buf.len() - self.len
    }

    /// Whether any storage is allocated.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Make sure at least `capacity` bytes are allocated.
    ///
    /// When the buffer has to grow, the old contents are dropped and the
    /// length resets to zero.
    ///
    /// # Returns
    ///
    /// `true` if the buffer was reallocated.
    pub fn reserve(&mut self, capacity: usize) -> Result<bool> {
        if capacity <= self.buf.len() {
            return Ok(false);
        }

        let mut grown = Vec::new();
        grown
            .try_reserve_exact(capacity)
            .map_err(|_| BlockpackError::allocation_failed(capacity))?;
        grown.resize(capacity, 0);

        self.buf = grown;
        self.len = 0;
        Ok(true)
    }

    /// Forget the contents, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Free the allocation. Releasing an unallocated buffer is a no-op.
    pub fn release(&mut self) {
        self.buf = Vec::new();
        self.len = 0;
    }

    /// Valid bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Append as much of `src` as fits.
    ///
    /// # Returns
    ///
    /// Number of bytes copied.
    pub fn append(&mut self, src: &[u8]) -> usize {
        let n = src.len().min(self.space_left());
        self.buf[self.len..self.len + n].copy_from_slice(&src[..n]);
        self.len += n;
        n
    }

    /// Mutable view of the first `size` bytes of storage, for a producer that
    /// writes a whole block at once. Follow with [`StagingBuffer::set_len`].
    pub fn slot_mut(&mut self, size: usize) -> Result<&mut [u8]> {
        if size > self.buf.len() {
            return Err(BlockpackError::index_overflow(size, self.buf.len()));
        }
        Ok(&mut self.buf[..size])
    }

    /// Set the number of valid bytes.
    pub fn set_len(&mut self, len: usize) -> Result<()> {
        if len > self.buf.len() {
            return Err(BlockpackError::index_overflow(len, self.buf.len()));
        }
        self.len = len;
        Ok(())
    }
}
