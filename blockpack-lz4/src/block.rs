//! LZ4 block sequences.
//!
//! LZ4 block format:
//! - Sequences of (token, [literal_length_ext], literals, offset, [match_length_ext])
//! - Token: 4-bit literal length + 4-bit match length
//! - If a 4-bit length is 15, additional bytes follow (add 255 until byte < 255)
//! - Offset: 2 bytes little-endian (match offset, 1-65535)
//! - Match length is +4 (minimum match = 4)
//! - The last sequence carries literals only
//!
//! Matches may reach back past the start of the block into the history kept
//! from earlier blocks.

use crate::{HISTORY_SIZE, slide_history};
use blockpack_core::error::{BlockpackError, Result};
use blockpack_core::traits::BlockDecompressor;

/// Minimum match length for LZ4.
pub(crate) const MIN_MATCH: usize = 4;

/// The last literals of a block are never covered by a match.
pub(crate) const LAST_LITERALS: usize = 5;

/// A match may not start within the last 12 bytes of a block.
pub(crate) const MF_LIMIT: usize = 12;

/// Append an LZ4 length continuation (`len` already reduced by 15).
fn write_length_ext(output: &mut Vec<u8>, mut len: usize) {
    while len >= 255 {
        output.push(255);
        len -= 255;
    }
    output.push(len as u8);
}

/// Emit a sequence: `literals` followed by a match of `match_len` bytes at `offset`.
pub(crate) fn emit_sequence(output: &mut Vec<u8>, literals: &[u8], offset: usize, match_len: usize) {
    let lit_len = literals.len();
    let ml = match_len - MIN_MATCH;
    let token = ((lit_len.min(15) << 4) | ml.min(15)) as u8;
    output.push(token);

    if lit_len >= 15 {
        write_length_ext(output, lit_len - 15);
    }
    output.extend_from_slice(literals);

    output.extend_from_slice(&(offset as u16).to_le_bytes());

    if ml >= 15 {
        write_length_ext(output, ml - 15);
    }
}

/// Emit the final literal-only sequence.
pub(crate) fn emit_last_literals(output: &mut Vec<u8>, literals: &[u8]) {
    let lit_len = literals.len();
    output.push((lit_len.min(15) << 4) as u8);
    if lit_len >= 15 {
        write_length_ext(output, lit_len - 15);
    }
    output.extend_from_slice(literals);
}

/// Decode one block into `output`, resolving far matches against `history`.
///
/// # Returns
///
/// Number of bytes written to `output`.
pub(crate) fn decode_block(input: &[u8], output: &mut [u8], history: &[u8]) -> Result<usize> {
    let mut decoder = SequenceReader { input, pos: 0 };
    let mut op = 0usize;

    while decoder.pos < input.len() {
        let token = decoder.read_byte()?;
        let literal_len = decoder.read_length((token >> 4) as usize)?;

        if decoder.pos + literal_len > input.len() {
            return Err(BlockpackError::corrupted(
                decoder.pos as u64,
                "truncated literals",
            ));
        }
        if op + literal_len > output.len() {
            return Err(BlockpackError::corrupted(
                decoder.pos as u64,
                "literals overflow output",
            ));
        }
        output[op..op + literal_len].copy_from_slice(&input[decoder.pos..decoder.pos + literal_len]);
        decoder.pos += literal_len;
        op += literal_len;

        // The last sequence has no match part
        if decoder.pos >= input.len() {
            break;
        }

        let offset = decoder.read_u16_le()? as usize;
        if offset == 0 {
            return Err(BlockpackError::corrupted(decoder.pos as u64, "zero offset"));
        }
        let match_len = decoder.read_length((token & 0x0F) as usize)? + MIN_MATCH;

        if op + match_len > output.len() {
            return Err(BlockpackError::corrupted(
                decoder.pos as u64,
                "match overflows output",
            ));
        }

        let mut copied = 0;
        if offset > op {
            // Match starts in the history
            let back = offset - op;
            if back > history.len() {
                return Err(BlockpackError::corrupted(
                    decoder.pos as u64,
                    "offset exceeds history",
                ));
            }
            let start = history.len() - back;
            let from_history = match_len.min(back);
            output[op..op + from_history].copy_from_slice(&history[start..start + from_history]);
            copied = from_history;
        }

        // Byte-wise copy handles overlapping matches
        if copied < match_len {
            let src = op + copied - offset;
            for i in copied..match_len {
                output[op + i] = output[src + i - copied];
            }
        }
        op += match_len;
    }

    Ok(op)
}

struct SequenceReader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl SequenceReader<'_> {
    fn read_byte(&mut self) -> Result<u8> {
        let b = *self
            .input
            .get(self.pos)
            .ok_or_else(|| BlockpackError::corrupted(self.pos as u64, "unexpected end of block"))?;
        self.pos += 1;
        Ok(b)
    }

    fn read_u16_le(&mut self) -> Result<u16> {
        if self.pos + 2 > self.input.len() {
            return Err(BlockpackError::corrupted(
                self.pos as u64,
                "truncated match offset",
            ));
        }
        let value = u16::from_le_bytes([self.input[self.pos], self.input[self.pos + 1]]);
        self.pos += 2;
        Ok(value)
    }

    fn read_length(&mut self, base: usize) -> Result<usize> {
        let mut len = base;
        if base == 15 {
            loop {
                let b = self.read_byte()? as usize;
                len += b;
                if b != 255 {
                    break;
                }
            }
        }
        Ok(len)
    }
}

/// Streaming LZ4 block decompressor.
///
/// Keeps the last 64 KiB of decoded output so that the next block can refer
/// back into it.
#[derive(Debug, Default)]
pub struct Lz4Decompressor {
    history: Vec<u8>,
}

impl Lz4Decompressor {
    /// Create a decompressor with empty history.
    pub fn new() -> Self {
        Self {
            history: Vec::with_capacity(HISTORY_SIZE),
        }
    }

    /// Bytes of history currently retained.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl BlockDecompressor for Lz4Decompressor {
    fn compress_bound(input_len: usize) -> usize {
        crate::compress_bound(input_len)
    }

    fn decompress_continue(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let produced = decode_block(input, output, &self.history)?;
        slide_history(&mut self.history, &output[..produced]);
        Ok(produced)
    }

    fn reset(&mut self) {
        self.history.clear();
    }
}
