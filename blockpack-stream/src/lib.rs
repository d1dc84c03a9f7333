//! # blockpack-stream
//!
//! Streaming block framing in front of a block compressor.
//!
//! Calling a block compressor directly on small, irregular writes (one disk
//! sector at a time, say) ruins the compression ratio. This crate assembles
//! an arbitrary byte stream into blocks of a configured size, compresses each
//! block with LZ4-HC, and frames it with a header carrying both sizes and a
//! CRC-32 of the uncompressed data:
//!
//! ```text
//! stream  := block*
//! block   := header payload
//! header  := compressed_size:u32 | uncompressed_size:u32 | checksum:u32
//! payload := compressed_size bytes
//! ```
//!
//! ## Components
//!
//! - [`BlockEncoder`]: buffers input, applies the split / no-split fill
//!   policy, and emits framed blocks
//! - [`BlockDecoder`]: re-entrant decoding of whole blocks from fragmentary
//!   input
//! - [`PartialDecoder`]: serves one decoded block at a time in slices of any
//!   size, with reset for seeking
//! - [`BlockStream`]: owns an encoder and a decoder behind the classic
//!   `init` / `compress` / `decompress` / `close` API
//! - [`BlockWriter`] / [`BlockReader`]: `std::io` adapters
//! - [`scan_blocks`]: header-only walk producing a seek table
//!
//! ## Example
//!
//! ```rust
//! use blockpack_stream::{StreamConfig, compress_to_vec, decompress_to_vec};
//!
//! let data = b"sector sector sector sector sector sector sector sector".repeat(20);
//! let config = StreamConfig::new().with_block_size(512);
//!
//! let packed = compress_to_vec(&data, &config).unwrap();
//! assert!(packed.len() < data.len());
//!
//! let unpacked = decompress_to_vec(&packed, true).unwrap();
//! assert_eq!(unpacked, data);
//! ```
//!
//! ## Cursor API
//!
//! ```rust
//! use blockpack_stream::{BlockDecoder, BlockEncoder, InBuffer, OutBuffer, StreamConfig};
//! use blockpack_core::FlushMode;
//!
//! let mut encoder = BlockEncoder::new(StreamConfig::new().with_block_size(64)).unwrap();
//! let mut packed = vec![0u8; 1024];
//! let mut output = OutBuffer::new(&mut packed);
//! for sector in [b"first write".as_slice(), b"second write".as_slice()] {
//!     encoder
//!         .compress(&mut InBuffer::new(sector), &mut output, FlushMode::NoFlush)
//!         .unwrap();
//! }
//! encoder
//!     .compress(&mut InBuffer::new(&[]), &mut output, FlushMode::Finish)
//!     .unwrap();
//! let packed_len = output.pos();
//!
//! let mut decoder = BlockDecoder::new();
//! let mut unpacked = vec![0u8; 64];
//! let mut output = OutBuffer::new(&mut unpacked);
//! decoder
//!     .decompress(&mut InBuffer::new(&packed[..packed_len]), &mut output, true)
//!     .unwrap();
//! assert_eq!(output.written(), b"first writesecond write");
//! ```

#![warn(missing_docs)]

mod compress;
mod config;
mod cursor;
mod decompress;
pub mod header;
mod io;
mod partial;
mod scan;
mod stream;

pub use compress::BlockEncoder;
pub use config::{DEFAULT_BLOCK_SIZE, StreamConfig};
pub use cursor::{InBuffer, OutBuffer};
pub use decompress::BlockDecoder;
pub use header::{BlockHeader, HEADER_SIZE, MAX_BLOCK_SIZE};
pub use io::{BlockReader, BlockWriter};
pub use partial::PartialDecoder;
pub use scan::{BlockInfo, scan_blocks, total_uncompressed};
pub use stream::BlockStream;

use blockpack_core::error::{BlockpackError, Result};
use blockpack_core::traits::FlushMode;
use blockpack_lz4::compress_bound;

/// Compress `data` into a framed stream in one call.
///
/// `data` is a single input, so in no-split mode it must not exceed the
/// block size.
pub fn compress_to_vec(data: &[u8], config: &StreamConfig) -> Result<Vec<u8>> {
    let mut encoder = BlockEncoder::new(*config)?;

    let blocks = data.len().div_ceil(config.block_size) + 1;
    let capacity = blocks * (compress_bound(config.block_size) + HEADER_SIZE);
    let mut packed = alloc_zeroed(capacity)?;

    let mut output = OutBuffer::new(&mut packed);
    encoder.compress(&mut InBuffer::new(data), &mut output, FlushMode::Finish)?;
    let written = output.pos();
    packed.truncate(written);
    Ok(packed)
}

/// Decompress a complete framed stream in one call.
///
/// The stream is scanned first to size the output exactly; a stream that
/// ends inside a block is damaged.
pub fn decompress_to_vec(data: &[u8], check_crc: bool) -> Result<Vec<u8>> {
    let blocks = scan_blocks(data)?;
    let total = total_uncompressed(&blocks);
    let total = usize::try_from(total).map_err(|_| BlockpackError::allocation_failed(usize::MAX))?;
    let mut unpacked = alloc_zeroed(total)?;

    let mut decoder = BlockDecoder::new();
    let mut output = OutBuffer::new(&mut unpacked);
    decoder.decompress(&mut InBuffer::new(data), &mut output, check_crc)?;
    debug_assert!(output.is_full());
    Ok(unpacked)
}

fn alloc_zeroed(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| BlockpackError::allocation_failed(len))?;
    buf.resize(len, 0);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpack_core::{BlockMode, ErrorKind};

    #[test]
    fn test_one_shot_roundtrip() {
        let data = b"one shot helpers".repeat(100);
        for mode in [BlockMode::Split, BlockMode::NoSplit] {
            let config = StreamConfig::new().with_block_mode(mode);
            let packed = compress_to_vec(&data, &config).unwrap();
            assert_eq!(decompress_to_vec(&packed, true).unwrap(), data);
        }
    }

    #[test]
    fn test_one_shot_empty() {
        let packed = compress_to_vec(&[], &StreamConfig::new()).unwrap();
        assert!(packed.is_empty());
        assert!(decompress_to_vec(&packed, true).unwrap().is_empty());
    }

    #[test]
    fn test_one_shot_nosplit_too_large() {
        let config = StreamConfig::new()
            .with_block_size(16)
            .with_block_mode(BlockMode::NoSplit);
        let err = compress_to_vec(&[0u8; 17], &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BlockSize);
    }
}
