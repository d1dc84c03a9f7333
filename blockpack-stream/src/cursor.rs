//! Input and output cursors.
//!
//! A cursor is a caller-owned slice plus a position. The engines advance the
//! position as they consume input or produce output; they never move it past
//! the end of the slice. When an engine returns an error, the positions still
//! reflect the work done up to the failure.

/// Read cursor over caller-supplied input.
#[derive(Debug, Clone, Copy)]
pub struct InBuffer<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> InBuffer<'a> {
    /// Create a cursor at the start of `src`.
    pub fn new(src: &'a [u8]) -> Self {
        Self { src, pos: 0 }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move the cursor to `pos`, clamped to the end of the input.
    ///
    /// Used to reposition the input before a partial decode with `reset`.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.src.len());
    }

    /// Unconsumed input.
    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.src[self.pos..]
    }

    /// Number of unconsumed bytes.
    #[inline]
    pub fn remaining_len(&self) -> usize {
        self.src.len() - self.pos
    }

    /// Whether all input has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos == self.src.len()
    }

    /// Mark `n` more bytes as consumed.
    #[inline]
    pub(crate) fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.remaining_len());
        self.pos = (self.pos + n).min(self.src.len());
    }
}

/// Write cursor over caller-supplied output space.
#[derive(Debug)]
pub struct OutBuffer<'a> {
    dst: &'a mut [u8],
    pos: usize,
}

impl<'a> OutBuffer<'a> {
    /// Create a cursor at the start of `dst`.
    pub fn new(dst: &'a mut [u8]) -> Self {
        Self { dst, pos: 0 }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes written so far.
    #[inline]
    pub fn written(&self) -> &[u8] {
        &self.dst[..self.pos]
    }

    /// Total capacity of the output slice.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.dst.len()
    }

    /// Unused output space.
    #[inline]
    pub fn space_left(&self) -> usize {
        self.dst.len() - self.pos
    }

    /// Whether no output space is left.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.pos == self.dst.len()
    }

    /// Copy as much of `data` as fits.
    ///
    /// # Returns
    ///
    /// Number of bytes copied.
    pub(crate) fn write(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.space_left());
        self.dst[self.pos..self.pos + n].copy_from_slice(&data[..n]);
        self.pos += n;
        n
    }
}
