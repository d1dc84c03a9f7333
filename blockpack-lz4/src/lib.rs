//! LZ4-HC block codec with cross-block history.
//!
//! This crate is the block compressor behind the blockpack framing layer. It
//! produces raw LZ4 blocks (no frame, no checksums) and keeps up to 64 KiB of
//! previously processed data as history, so that a block may reference the
//! blocks before it. Compressor and decompressor must see the same sequence
//! of blocks for the history to line up; `reset` on both ends starts over.
//!
//! # Example
//!
//! ```
//! use blockpack_core::{BlockCompressor, BlockDecompressor};
//! use blockpack_lz4::{HcLevel, Lz4HcCompressor, Lz4Decompressor, compress_bound};
//!
//! let mut enc = Lz4HcCompressor::new(HcLevel::DEFAULT);
//! let mut dec = Lz4Decompressor::new();
//!
//! let mut packed = vec![0u8; compress_bound(64)];
//! let mut unpacked = vec![0u8; 64];
//! for block in [b"first block, first block, first block, first!!".as_slice(),
//!               b"second block repeats: first block, first block".as_slice()] {
//!     let n = enc.compress_continue(block, &mut packed).unwrap();
//!     let m = dec.decompress_continue(&packed[..n], &mut unpacked).unwrap();
//!     assert_eq!(&unpacked[..m], block);
//! }
//! ```

mod block;
pub mod hc;

pub use block::Lz4Decompressor;
pub use hc::{HcLevel, Lz4HcCompressor};

/// Maximum distance a match may reach back (16-bit offset).
pub const MAX_OFFSET: usize = 65535;

/// Bytes of history carried from one block to the next.
pub const HISTORY_SIZE: usize = 64 * 1024;

/// Worst-case compressed size of `input_len` bytes (incompressible input
/// becomes one literal run: a token, 255-byte length continuations, and the
/// literals themselves).
#[inline]
pub const fn compress_bound(input_len: usize) -> usize {
    input_len + input_len / 255 + 16
}

/// Keep the last [`HISTORY_SIZE`] bytes of `history` followed by `data`.
pub(crate) fn slide_history(history: &mut Vec<u8>, data: &[u8]) {
    if data.len() >= HISTORY_SIZE {
        history.clear();
        history.extend_from_slice(&data[data.len() - HISTORY_SIZE..]);
        return;
    }

    history.extend_from_slice(data);
    if history.len() > HISTORY_SIZE {
        let excess = history.len() - HISTORY_SIZE;
        history.drain(..excess);
    }
}
