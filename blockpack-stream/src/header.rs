//! Block header codec.
//!
//! Every block on the wire starts with a fixed 12-byte header:
//!
//! ```text
//! +-----------------+-------------------+----------+
//! | compressed_size | uncompressed_size | checksum |
//! |       u32       |        u32        |   u32    |
//! +-----------------+-------------------+----------+
//! ```
//!
//! The fields are stored in the host's native byte order, so both ends of a
//! stream must agree on endianness. The checksum is the CRC-32 of the
//! uncompressed block. A header with any zero field is damaged.

use blockpack_core::error::{BlockpackError, Result};

/// Size of a serialized block header.
pub const HEADER_SIZE: usize = 12;

/// Hard upper limit of a block's uncompressed size (4 MiB).
pub const MAX_BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Header preceding every compressed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHeader {
    /// Size of the compressed payload following the header.
    pub compressed_size: u32,
    /// Size of the block once decompressed.
    pub uncompressed_size: u32,
    /// CRC-32 of the uncompressed block.
    pub checksum: u32,
}

impl BlockHeader {
    /// Create a header.
    pub fn new(compressed_size: u32, uncompressed_size: u32, checksum: u32) -> Self {
        Self {
            compressed_size,
            uncompressed_size,
            checksum,
        }
    }

    /// Serialize to wire bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.compressed_size.to_ne_bytes());
        bytes[4..8].copy_from_slice(&self.uncompressed_size.to_ne_bytes());
        bytes[8..12].copy_from_slice(&self.checksum.to_ne_bytes());
        bytes
    }

    /// Deserialize from wire bytes without validation.
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            compressed_size: u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            uncompressed_size: u32::from_ne_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            checksum: u32::from_ne_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        }
    }

    /// Read and validate a header from the front of `data`.
    ///
    /// `max_compressed` is the largest payload the block codec can produce for
    /// a block of [`MAX_BLOCK_SIZE`] bytes.
    pub fn parse(data: &[u8], max_compressed: usize) -> Result<Self> {
        let bytes: &[u8; HEADER_SIZE] = data
            .get(..HEADER_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| {
                BlockpackError::damaged_header(format!(
                    "truncated header: {} of {} bytes",
                    data.len(),
                    HEADER_SIZE
                ))
            })?;
        let header = Self::from_bytes(bytes);
        header.validate(max_compressed)?;
        Ok(header)
    }

    /// Check the header fields for damage.
    pub fn validate(&self, max_compressed: usize) -> Result<()> {
        if self.compressed_size == 0 {
            return Err(BlockpackError::damaged_header("zero compressed size"));
        }
        if self.uncompressed_size == 0 {
            return Err(BlockpackError::damaged_header("zero uncompressed size"));
        }
        if self.checksum == 0 {
            return Err(BlockpackError::damaged_header("zero checksum"));
        }
        if self.uncompressed_len() > MAX_BLOCK_SIZE {
            return Err(BlockpackError::damaged_header(format!(
                "uncompressed size {} exceeds maximum {}",
                self.uncompressed_size, MAX_BLOCK_SIZE
            )));
        }
        if self.compressed_len() > max_compressed {
            return Err(BlockpackError::damaged_header(format!(
                "compressed size {} exceeds maximum {}",
                self.compressed_size, max_compressed
            )));
        }
        Ok(())
    }

    /// Compressed payload size as `usize`.
    #[inline]
    pub fn compressed_len(&self) -> usize {
        self.compressed_size as usize
    }

    /// Uncompressed block size as `usize`.
    #[inline]
    pub fn uncompressed_len(&self) -> usize {
        self.uncompressed_size as usize
    }

    /// Size of the whole framed block, header included.
    #[inline]
    pub fn framed_len(&self) -> usize {
        HEADER_SIZE + self.compressed_len()
    }
}
