//! Block codec contract and stream modes.
//!
//! The framing layer treats the block compressor as an opaque collaborator:
//! given a bounded chunk it returns a compressed chunk (or fails), and the
//! inverse. Both sides may keep history across calls so that later blocks can
//! reference earlier ones; `reset` ends that continuity.

use crate::error::Result;

/// Flush mode for compression.
///
/// Every mode other than [`FlushMode::NoFlush`] forces the buffered input to be
/// compressed once the caller's input is exhausted. [`FlushMode::Finish`]
/// additionally resets the compressor history afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    /// No flush - buffer data until a block is full.
    #[default]
    NoFlush,
    /// Partial flush - emit the buffered data as a block.
    Partial,
    /// Sync flush - emit the buffered data as a block.
    Sync,
    /// Full flush - emit the buffered data as a block.
    Full,
    /// Finish - emit the buffered data and end history continuity.
    Finish,
    /// Block - emit the buffered data as a block.
    Block,
}

impl FlushMode {
    /// Whether buffered data must be compressed once input runs out.
    pub fn is_flush(self) -> bool {
        !matches!(self, FlushMode::NoFlush)
    }

    /// Whether the compressor history is reset after flushing.
    pub fn ends_stream(self) -> bool {
        matches!(self, FlushMode::Finish)
    }
}

/// Block fill policy for compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BlockMode {
    /// A caller-supplied input is never split across two blocks. If it does not
    /// fit the space left in the current block, the block is emitted short.
    NoSplit,
    /// Blocks are always filled to capacity; inputs may straddle two blocks.
    #[default]
    Split,
}

/// A stateful block compressor.
///
/// Implementations may keep the previously compressed data as a dictionary
/// for the next call.
pub trait BlockCompressor {
    /// Upper bound of the compressed size of `input_len` bytes.
    fn compress_bound(input_len: usize) -> usize
    where
        Self: Sized;

    /// Compress `input` into `output`, continuing the current history.
    ///
    /// # Returns
    ///
    /// Number of bytes written to `output`. `Ok(0)` means the compressor could
    /// not produce output (for instance because `output` is too small).
    fn compress_continue(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Forget all history. The next block is compressed independently.
    fn reset(&mut self);
}

/// A stateful block decompressor, the inverse of [`BlockCompressor`].
pub trait BlockDecompressor {
    /// Upper bound of the compressed size of `input_len` bytes, as produced by
    /// the matching compressor. Used to reject implausible block headers.
    fn compress_bound(input_len: usize) -> usize
    where
        Self: Sized;

    /// Decompress one block from `input` into `output`, continuing the
    /// current history.
    ///
    /// # Returns
    ///
    /// Number of bytes written to `output`.
    fn decompress_continue(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Forget all history.
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_mode_default() {
        assert_eq!(FlushMode::default(), FlushMode::NoFlush);
        assert!(!FlushMode::NoFlush.is_flush());
    }

    #[test]
    fn test_flush_variants() {
        for mode in [
            FlushMode::Partial,
            FlushMode::Sync,
            FlushMode::Full,
            FlushMode::Finish,
            FlushMode::Block,
        ] {
            assert!(mode.is_flush(), "{:?}", mode);
            assert_eq!(mode.ends_stream(), mode == FlushMode::Finish);
        }
    }

    #[test]
    fn test_block_mode_default() {
        assert_eq!(BlockMode::default(), BlockMode::Split);
    }
}
