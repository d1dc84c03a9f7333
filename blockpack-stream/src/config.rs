//! Stream configuration.

use crate::header::MAX_BLOCK_SIZE;
use blockpack_core::error::{BlockpackError, Result};
use blockpack_core::traits::BlockMode;
use blockpack_lz4::HcLevel;

/// Default block size: 255 sectors of 256 bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 65_280;

/// Knobs of a block stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StreamConfig {
    /// Uncompressed size of a full block.
    pub block_size: usize,
    /// Whether caller inputs may straddle block boundaries.
    pub block_mode: BlockMode,
    /// LZ4-HC compression level.
    pub level: HcLevel,
    /// Verify block checksums when decoding.
    pub check_crc: bool,
}

impl StreamConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            block_mode: BlockMode::default(),
            level: HcLevel::default(),
            check_crc: true,
        }
    }

    /// Set the block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the block mode.
    pub fn with_block_mode(mut self, block_mode: BlockMode) -> Self {
        self.block_mode = block_mode;
        self
    }

    /// Set the compression level.
    pub fn with_level(mut self, level: HcLevel) -> Self {
        self.level = level;
        self
    }

    /// Enable or disable checksum verification.
    pub fn with_check_crc(mut self, check_crc: bool) -> Self {
        self.check_crc = check_crc;
        self
    }

    /// Reject block sizes that are zero or above [`MAX_BLOCK_SIZE`].
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(BlockpackError::block_too_large(0, MAX_BLOCK_SIZE));
        }
        if self.block_size > MAX_BLOCK_SIZE {
            return Err(BlockpackError::block_too_large(
                self.block_size,
                MAX_BLOCK_SIZE,
            ));
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new()
    }
}
