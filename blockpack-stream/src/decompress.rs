//! Decompression engine.
//!
//! [`BlockDecoder`] reads framed blocks from an input cursor and writes the
//! decoded bytes to an output cursor. It is re-entrant at any byte boundary:
//! a header or payload split across many calls is accumulated internally and
//! the block is decoded once its last byte arrives.
//!
//! A block is only decoded if the output cursor can take all of it. Decoded
//! bytes are verified (size, then optionally CRC) before any of them reach the
//! caller.

use crate::cursor::{InBuffer, OutBuffer};
use crate::header::{BlockHeader, HEADER_SIZE, MAX_BLOCK_SIZE};
use blockpack_core::buffer::StagingBuffer;
use blockpack_core::crc::crc32;
use blockpack_core::error::{BlockpackError, Result};
use blockpack_core::traits::BlockDecompressor;
use blockpack_lz4::Lz4Decompressor;
use tracing::{debug, trace, warn};

/// Position inside the block being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Collecting header bytes.
    Header {
        buf: [u8; HEADER_SIZE],
        filled: usize,
    },
    /// Header accepted, collecting the compressed payload.
    Payload { header: BlockHeader },
}

impl DecodeState {
    const START: Self = Self::Header {
        buf: [0; HEADER_SIZE],
        filled: 0,
    };
}

/// Streaming block decompressor.
#[derive(Debug)]
pub struct BlockDecoder<D: BlockDecompressor = Lz4Decompressor> {
    decompressor: D,
    state: DecodeState,
    /// Compressed payload of the block in progress.
    input: StagingBuffer,
    /// Decoded block not yet delivered to the caller.
    output: StagingBuffer,
    ready: bool,
    total_in: u64,
    total_out: u64,
}

impl BlockDecoder<Lz4Decompressor> {
    /// Create an LZ4 decoder. Staging buffers are allocated on first use.
    pub fn new() -> Self {
        Self::with_decompressor(Lz4Decompressor::new())
    }
}

impl Default for BlockDecoder<Lz4Decompressor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: BlockDecompressor> BlockDecoder<D> {
    /// Create a decoder around an existing block decompressor.
    pub fn with_decompressor(decompressor: D) -> Self {
        Self {
            decompressor,
            state: DecodeState::START,
            input: StagingBuffer::new(),
            output: StagingBuffer::new(),
            ready: false,
            total_in: 0,
            total_out: 0,
        }
    }

    /// Largest payload a valid header may declare.
    pub fn max_compressed_size() -> usize {
        D::compress_bound(MAX_BLOCK_SIZE)
    }

    /// Total bytes consumed from input cursors.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Total bytes written to output cursors.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Whether a block has been started but not finished.
    pub fn has_partial_block(&self) -> bool {
        match self.state {
            DecodeState::Header { filled, .. } => filled > 0,
            DecodeState::Payload { .. } => true,
        }
    }

    /// Whether a decoded block is waiting for output space.
    pub fn has_pending_output(&self) -> bool {
        self.ready
    }

    /// Decode whole blocks until the output or the input runs out.
    ///
    /// Input that ends inside a block is kept and the block resumes on the
    /// next call. Fails with a buffer error, without consuming the header,
    /// if the next block does not fit the remaining output.
    pub fn decompress(
        &mut self,
        input: &mut InBuffer<'_>,
        output: &mut OutBuffer<'_>,
        check_crc: bool,
    ) -> Result<()> {
        self.deliver(output)?;

        while !output.is_full() && !input.is_empty() {
            let mut decoded = std::mem::take(&mut self.output);
            let result = self.advance(input, &mut decoded, output.space_left(), check_crc);
            self.output = decoded;

            if result?.is_none() {
                break;
            }
            self.ready = true;
            self.deliver(output)?;
        }

        Ok(())
    }

    /// Drop the block in progress and any undelivered output, forget the
    /// history and zero the counters.
    pub fn reset(&mut self) {
        self.discard_block();
        self.output.clear();
        self.ready = false;
        self.decompressor.reset();
        self.total_in = 0;
        self.total_out = 0;
    }

    /// Forget the block in progress so the next byte read starts a header.
    /// The decompressor history is kept.
    pub(crate) fn discard_block(&mut self) {
        self.state = DecodeState::START;
        self.input.clear();
    }

    /// Forget the block in progress and the decompressor history, keeping
    /// the counters. The next byte read must start an independent block.
    pub(crate) fn restart(&mut self) {
        self.discard_block();
        self.decompressor.reset();
    }

    /// Free the staging buffers.
    pub(crate) fn release(&mut self) {
        self.reset();
        self.input.release();
        self.output.release();
    }

    /// Feed input to the block in progress and decode it into `dest` once
    /// complete.
    ///
    /// `room` is the largest uncompressed size the caller can accept; a header
    /// declaring more is left unconsumed.
    ///
    /// # Returns
    ///
    /// The header of the decoded block, or `None` if the input ran out first.
    pub(crate) fn advance(
        &mut self,
        input: &mut InBuffer<'_>,
        dest: &mut StagingBuffer,
        room: usize,
        check_crc: bool,
    ) -> Result<Option<BlockHeader>> {
        loop {
            match self.state {
                DecodeState::Header { mut buf, filled } => {
                    let needed = HEADER_SIZE - filled;
                    let available = input.remaining();

                    if available.len() < needed {
                        buf[filled..filled + available.len()].copy_from_slice(available);
                        self.state = DecodeState::Header {
                            buf,
                            filled: filled + available.len(),
                        };
                        self.total_in += available.len() as u64;
                        input.advance(available.len());
                        return Ok(None);
                    }

                    // Parse before consuming so a rejected header can be retried
                    buf[filled..].copy_from_slice(&available[..needed]);
                    let header = BlockHeader::from_bytes(&buf);
                    if let Err(e) = header.validate(Self::max_compressed_size()) {
                        warn!(offset = self.total_in, error = %e, "damaged block header");
                        return Err(e);
                    }
                    if header.uncompressed_len() > room {
                        return Err(BlockpackError::buffer_too_small(
                            header.uncompressed_len(),
                            room,
                        ));
                    }

                    if self.input.reserve(header.compressed_len())? {
                        debug!(capacity = header.compressed_len(), "grew input staging buffer");
                    }
                    if dest.reserve(header.uncompressed_len())? {
                        debug!(capacity = header.uncompressed_len(), "grew output staging buffer");
                    }

                    input.advance(needed);
                    self.total_in += needed as u64;
                    self.input.clear();
                    self.state = DecodeState::Payload { header };
                }

                DecodeState::Payload { header } => {
                    let expected = header.compressed_len();
                    if self.input.len() > expected {
                        return Err(BlockpackError::index_overflow(self.input.len(), expected));
                    }

                    let wanted = (expected - self.input.len()).min(input.remaining_len());
                    let n = self.input.append(&input.remaining()[..wanted]);
                    input.advance(n);
                    self.total_in += n as u64;

                    if self.input.len() < expected {
                        return Ok(None);
                    }

                    // The payload is consumed whatever the outcome of decoding
                    self.state = DecodeState::START;
                    self.decode_into(header, dest, check_crc)?;
                    self.input.clear();
                    return Ok(Some(header));
                }
            }
        }
    }

    /// Decode the complete payload in `self.input` into `dest` and verify it.
    fn decode_into(
        &mut self,
        header: BlockHeader,
        dest: &mut StagingBuffer,
        check_crc: bool,
    ) -> Result<()> {
        let expected = header.uncompressed_len();
        let slot = dest.slot_mut(expected)?;

        let produced = self
            .decompressor
            .decompress_continue(self.input.data(), slot)
            .map_err(|e| {
                warn!(error = %e, "block payload rejected by decompressor");
                BlockpackError::decode_failed(expected, e.to_string())
            })?;
        if produced != expected {
            warn!(expected, produced, "decoded block size mismatch");
            return Err(BlockpackError::size_mismatch(expected, produced));
        }
        dest.set_len(produced)?;

        if check_crc {
            let computed = crc32(dest.data());
            if computed != header.checksum {
                warn!(
                    expected = header.checksum,
                    computed, "block checksum mismatch"
                );
                return Err(BlockpackError::crc_mismatch(header.checksum, computed));
            }
        }

        trace!(
            compressed = header.compressed_size,
            uncompressed = header.uncompressed_size,
            "block decoded"
        );
        Ok(())
    }

    /// Copy a ready decoded block to `output` if it fits.
    fn deliver(&mut self, output: &mut OutBuffer<'_>) -> Result<()> {
        if !self.ready {
            return Ok(());
        }

        let block = self.output.data();
        if block.len() > output.space_left() {
            return Err(BlockpackError::buffer_too_small(
                block.len(),
                output.space_left(),
            ));
        }

        output.write(block);
        self.total_out += block.len() as u64;
        self.output.clear();
        self.ready = false;
        Ok(())
    }
}
