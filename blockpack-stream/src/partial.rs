//! Partial (seekable) decoder.
//!
//! [`PartialDecoder`] decodes one block at a time into its own staging buffer
//! and serves it to the caller in slices of any size. A new block is only
//! decoded once the previous one has been handed out completely, so the
//! caller controls how far ahead of its reads decoding runs.
//!
//! Seeking is the caller's job: reposition the input cursor at a block
//! boundary (for example one found with [`crate::scan_blocks`]) and pass
//! `reset = true`, which also clears the decompressor history. A block that
//! references earlier blocks then fails to decode instead of reading stale
//! history; streams meant to be seekable are written with a
//! [`FlushMode::Finish`](blockpack_core::FlushMode::Finish) after every block.

use crate::cursor::{InBuffer, OutBuffer};
use crate::decompress::BlockDecoder;
use blockpack_core::buffer::StagingBuffer;
use blockpack_core::error::Result;
use blockpack_core::traits::BlockDecompressor;
use blockpack_lz4::Lz4Decompressor;
use tracing::trace;

/// Block-at-a-time decoder serving output in arbitrary slices.
#[derive(Debug)]
pub struct PartialDecoder<D: BlockDecompressor = Lz4Decompressor> {
    decoder: BlockDecoder<D>,
    /// The current decoded block.
    staged: StagingBuffer,
    /// Bytes of `staged` already handed out.
    delivered: usize,
    total_out: u64,
}

impl PartialDecoder<Lz4Decompressor> {
    /// Create an LZ4 partial decoder.
    pub fn new() -> Self {
        Self::with_decoder(BlockDecoder::new())
    }
}

impl Default for PartialDecoder<Lz4Decompressor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: BlockDecompressor> PartialDecoder<D> {
    /// Wrap an existing block decoder.
    pub fn with_decoder(decoder: BlockDecoder<D>) -> Self {
        Self {
            decoder,
            staged: StagingBuffer::new(),
            delivered: 0,
            total_out: 0,
        }
    }

    /// The underlying block decoder.
    pub fn decoder(&self) -> &BlockDecoder<D> {
        &self.decoder
    }

    /// Mutable access to the underlying block decoder.
    pub fn decoder_mut(&mut self) -> &mut BlockDecoder<D> {
        &mut self.decoder
    }

    /// Total bytes consumed from input cursors.
    pub fn total_in(&self) -> u64 {
        self.decoder.total_in()
    }

    /// Total bytes served to output cursors.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Decoded bytes of the current block not yet served.
    pub fn staged_remaining(&self) -> usize {
        self.staged.len() - self.delivered
    }

    /// Whether the input ended inside a block.
    pub fn has_partial_block(&self) -> bool {
        self.decoder.has_partial_block()
    }

    /// Serve decoded bytes until the output is full or both the staged block
    /// and the input are exhausted.
    ///
    /// With `reset`, the staged block, any partially read block and the
    /// decompressor history are discarded first, and the input cursor must
    /// sit on the header of a block that does not depend on earlier ones.
    /// A block cut short by the end of the input is not an error; the next
    /// call continues it.
    pub fn decompress_partial(
        &mut self,
        input: &mut InBuffer<'_>,
        output: &mut OutBuffer<'_>,
        reset: bool,
        check_crc: bool,
    ) -> Result<()> {
        if reset {
            trace!(discarded = self.staged_remaining(), "partial decoder reset");
            self.staged.clear();
            self.delivered = 0;
            self.decoder.restart();
        }

        while !output.is_full() {
            if self.staged_remaining() == 0 {
                if input.is_empty() {
                    break;
                }
                self.staged.clear();
                self.delivered = 0;
                let decoded = self
                    .decoder
                    .advance(input, &mut self.staged, usize::MAX, check_crc)?;
                if decoded.is_none() {
                    break;
                }
            }

            let n = output.write(&self.staged.data()[self.delivered..]);
            self.delivered += n;
            self.total_out += n as u64;
        }

        Ok(())
    }

    /// Discard all state, including the decompressor history.
    pub fn reset(&mut self) {
        self.decoder.reset();
        self.staged.clear();
        self.delivered = 0;
        self.total_out = 0;
    }

    /// Free every staging buffer.
    pub(crate) fn release(&mut self) {
        self.reset();
        self.decoder.release();
        self.staged.release();
    }
}
