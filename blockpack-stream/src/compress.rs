//! Compression engine.
//!
//! [`BlockEncoder`] accumulates caller input into blocks of the configured
//! size, compresses each block with a [`BlockCompressor`] and writes it to the
//! output cursor behind a [`BlockHeader`].
//!
//! ## Fill policies
//!
//! - [`BlockMode::Split`]: the accumulation buffer is always filled to
//!   capacity before a block is compressed. One input may straddle two blocks.
//! - [`BlockMode::NoSplit`]: an input that does not fit the space left in the
//!   current block causes the buffered data to be emitted as a short block
//!   first. An input larger than a whole block is rejected.
//!
//! ## Output back-pressure
//!
//! A block is written to the output cursor whole or not at all. If the cursor
//! cannot hold it, [`BlockEncoder::compress`] returns a buffer error and keeps
//! the compressed block staged; the next call writes it before anything else.

use crate::config::StreamConfig;
use crate::cursor::{InBuffer, OutBuffer};
use crate::header::{BlockHeader, HEADER_SIZE};
use blockpack_core::buffer::StagingBuffer;
use blockpack_core::crc::crc32;
use blockpack_core::error::{BlockpackError, Result};
use blockpack_core::traits::{BlockCompressor, BlockMode, FlushMode};
use blockpack_lz4::Lz4HcCompressor;
use tracing::{debug, trace, warn};

/// Streaming block compressor.
#[derive(Debug)]
pub struct BlockEncoder<C: BlockCompressor = Lz4HcCompressor> {
    compressor: C,
    config: StreamConfig,
    /// Uncompressed bytes of the block being assembled.
    input: StagingBuffer,
    /// Header and payload of a compressed block not yet written out.
    staged: StagingBuffer,
    total_in: u64,
    total_out: u64,
}

impl BlockEncoder<Lz4HcCompressor> {
    /// Create an LZ4-HC encoder at the configured level.
    pub fn new(config: StreamConfig) -> Result<Self> {
        config.validate()?;
        Self::with_compressor(config, Lz4HcCompressor::new(config.level))
    }
}

impl<C: BlockCompressor> BlockEncoder<C> {
    /// Create an encoder around an existing block compressor.
    ///
    /// Both staging buffers are allocated here; allocation failure is a
    /// buffer error.
    pub fn with_compressor(config: StreamConfig, compressor: C) -> Result<Self> {
        config.validate()?;
        let input = StagingBuffer::with_capacity(config.block_size)?;
        let staged = StagingBuffer::with_capacity(C::compress_bound(config.block_size) + HEADER_SIZE)?;

        debug!(
            block_size = config.block_size,
            block_mode = ?config.block_mode,
            level = config.level.level(),
            "block encoder initialized"
        );

        Ok(Self {
            compressor,
            config,
            input,
            staged,
            total_in: 0,
            total_out: 0,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Total bytes consumed from input cursors.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Total bytes written to output cursors.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Bytes accumulated for the next block.
    pub fn buffered(&self) -> usize {
        self.input.len()
    }

    /// Whether a compressed block is waiting for output space.
    pub fn has_staged_block(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Consume input and emit zero or more framed blocks.
    ///
    /// With [`FlushMode::NoFlush`] input that does not complete a block stays
    /// buffered. Every other mode compresses the buffered data once the input
    /// is exhausted; [`FlushMode::Finish`] then resets the compressor history.
    ///
    /// On error the cursors reflect the bytes consumed and written before the
    /// failure.
    ///
    /// A block whose CRC-32 is zero cannot be framed, since a zero checksum
    /// marks a damaged header. Such a block fails with a compression error,
    /// nothing is written and its bytes stay buffered.
    pub fn compress(
        &mut self,
        input: &mut InBuffer<'_>,
        output: &mut OutBuffer<'_>,
        flush: FlushMode,
    ) -> Result<()> {
        let block_size = self.config.block_size;
        let nosplit = self.config.block_mode == BlockMode::NoSplit;

        if nosplit && input.remaining_len() > block_size {
            return Err(BlockpackError::block_too_large(
                input.remaining_len(),
                block_size,
            ));
        }

        self.emit_staged(output)?;

        loop {
            if nosplit && input.remaining_len() > self.input.space_left() {
                if self.input.is_empty() {
                    return Err(BlockpackError::block_too_large(
                        input.remaining_len(),
                        block_size,
                    ));
                }
                // Close the current block short so the input starts a fresh one
                self.compress_block(output)?;
                continue;
            }

            let n = self.input.append(input.remaining());
            input.advance(n);
            self.total_in += n as u64;

            if self.input.space_left() == 0 {
                self.compress_block(output)?;
                continue;
            }
            break;
        }

        if flush.is_flush() && !self.input.is_empty() {
            self.compress_block(output)?;
        }

        if flush.ends_stream() {
            self.compressor.reset();
            debug!(
                total_in = self.total_in,
                total_out = self.total_out,
                "stream finished, compressor history reset"
            );
        }

        Ok(())
    }

    /// Drop buffered and staged data, forget the history and zero the counters.
    pub fn reset(&mut self) {
        self.input.clear();
        self.staged.clear();
        self.compressor.reset();
        self.total_in = 0;
        self.total_out = 0;
    }

    /// Compress the accumulated bytes into a framed block and try to emit it.
    fn compress_block(&mut self, output: &mut OutBuffer<'_>) -> Result<()> {
        let raw = self.input.data();
        let checksum = crc32(raw);
        if checksum == 0 {
            warn!(len = raw.len(), "block checksum is zero, refusing to frame it");
            return Err(BlockpackError::compression_failed(format!(
                "block of {} bytes has a zero CRC-32",
                raw.len()
            )));
        }

        let slot = self.staged.slot_mut(self.staged.capacity())?;
        let (head, payload) = slot.split_at_mut(HEADER_SIZE);

        let compressed = match self.compressor.compress_continue(raw, payload) {
            Ok(0) => {
                return Err(BlockpackError::compression_failed(format!(
                    "compressor produced no output for {} bytes",
                    raw.len()
                )));
            }
            Ok(n) => n,
            Err(e) => return Err(BlockpackError::compression_failed(e.to_string())),
        };

        let header = BlockHeader::new(compressed as u32, raw.len() as u32, checksum);
        head.copy_from_slice(&header.to_bytes());
        trace!(
            compressed = header.compressed_size,
            uncompressed = header.uncompressed_size,
            crc = header.checksum,
            "block compressed"
        );

        self.staged.set_len(header.framed_len())?;
        self.input.clear();
        self.emit_staged(output)
    }

    /// Write the staged block to `output` if it fits.
    fn emit_staged(&mut self, output: &mut OutBuffer<'_>) -> Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }

        let block = self.staged.data();
        if block.len() > output.space_left() {
            return Err(BlockpackError::buffer_too_small(
                block.len(),
                output.space_left(),
            ));
        }

        output.write(block);
        self.total_out += block.len() as u64;
        self.staged.clear();
        Ok(())
    }
}
