//! Header-only walk over a framed stream.
//!
//! [`scan_blocks`] reads each header, validates it, and skips the payload
//! without decompressing. The result doubles as a seek table for
//! [`PartialDecoder::decompress_partial`](crate::PartialDecoder::decompress_partial).

use crate::decompress::BlockDecoder;
use crate::header::BlockHeader;
use blockpack_core::error::{BlockpackError, Result};
use blockpack_lz4::Lz4Decompressor;

/// Location and header fields of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BlockInfo {
    /// Offset of the block header in the stream.
    pub offset: u64,
    /// Compressed payload size.
    pub compressed_size: u32,
    /// Uncompressed block size.
    pub uncompressed_size: u32,
    /// CRC-32 of the uncompressed block.
    pub checksum: u32,
}

impl BlockInfo {
    fn new(offset: usize, header: &BlockHeader) -> Self {
        Self {
            offset: offset as u64,
            compressed_size: header.compressed_size,
            uncompressed_size: header.uncompressed_size,
            checksum: header.checksum,
        }
    }

    /// Offset one past the end of the block.
    pub fn end_offset(&self) -> u64 {
        self.offset + crate::header::HEADER_SIZE as u64 + u64::from(self.compressed_size)
    }
}

/// Walk the headers of an LZ4 framed stream.
///
/// Fails with a damaged-block error on an invalid header or if the stream
/// ends inside a block.
pub fn scan_blocks(data: &[u8]) -> Result<Vec<BlockInfo>> {
    let max_compressed = BlockDecoder::<Lz4Decompressor>::max_compressed_size();
    let mut blocks = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let header = BlockHeader::parse(&data[pos..], max_compressed)
            .map_err(|e| BlockpackError::damaged_header(format!("block at offset {}: {}", pos, e)))?;
        let end = pos + header.framed_len();
        if end > data.len() {
            return Err(BlockpackError::damaged_header(format!(
                "block at offset {} needs {} bytes, stream has {}",
                pos,
                header.framed_len(),
                data.len() - pos
            )));
        }
        blocks.push(BlockInfo::new(pos, &header));
        pos = end;
    }

    Ok(blocks)
}

/// Sum of the uncompressed sizes of `blocks`.
pub fn total_uncompressed(blocks: &[BlockInfo]) -> u64 {
    blocks.iter().map(|b| u64::from(b.uncompressed_size)).sum()
}
