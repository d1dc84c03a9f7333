//! LZ4-HC (High Compression) block compressor with cross-block history.
//!
//! LZ4-HC trades compression speed for better compression ratios.
//! It uses a more aggressive match finding strategy with:
//! - Larger hash table
//! - Chain table for multiple matches at same hash position
//! - Better match selection (longest match rather than first)
//! - Lazy matching from level 4 upwards
//! - Compression levels 1-12
//!
//! Up to 64 KiB of previously compressed input is kept as history and
//! searched together with the current block. The window and the match tables
//! persist across blocks; positions are rebased when the window is compacted.

use crate::block::{LAST_LITERALS, MF_LIMIT, MIN_MATCH, emit_last_literals, emit_sequence};
use crate::{HISTORY_SIZE, MAX_OFFSET};
use blockpack_core::error::{BlockpackError, Result};
use blockpack_core::traits::BlockCompressor;

/// LZ4-HC compression level (1-12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "u8", into = "u8")
)]
pub struct HcLevel(u8);

impl HcLevel {
    /// Minimum HC compression level.
    pub const MIN: Self = Self(1);
    /// Default HC compression level.
    pub const DEFAULT: Self = Self(9);
    /// Maximum HC compression level.
    pub const MAX: Self = Self(12);

    /// Create a new compression level.
    ///
    /// Returns None if level is outside 1-12 range.
    pub fn new(level: u8) -> Option<Self> {
        if (1..=12).contains(&level) {
            Some(Self(level))
        } else {
            None
        }
    }

    /// Map any integer onto a valid level the way LZ4-HC does: values below 1
    /// select the default, values above 12 select the maximum.
    pub fn clamped(level: i32) -> Self {
        if level < 1 {
            Self::DEFAULT
        } else if level > 12 {
            Self::MAX
        } else {
            Self(level as u8)
        }
    }

    /// Get the level value.
    pub fn level(self) -> u8 {
        self.0
    }

    /// Maximum number of chain candidates examined per position.
    fn max_attempts(self) -> usize {
        match self.0 {
            1..=3 => 64,
            4..=6 => 256,
            7..=9 => 1024,
            10..=11 => 4096,
            _ => 16384,
        }
    }

    /// Match length at which the search stops early.
    fn nice_length(self) -> usize {
        match self.0 {
            1..=3 => 32,
            4..=6 => 64,
            7..=9 => 128,
            _ => 4096,
        }
    }

    /// Whether to defer a match by one byte when the next position matches longer.
    fn lazy(self) -> bool {
        self.0 >= 4
    }
}

impl Default for HcLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for HcLevel {
    type Error = BlockpackError;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level).ok_or_else(|| {
            BlockpackError::compression_failed(format!(
                "compression level {} outside 1-12",
                level
            ))
        })
    }
}

impl From<HcLevel> for u8 {
    fn from(level: HcLevel) -> u8 {
        level.0
    }
}

/// Hash table size (must be power of 2).
const HASH_SIZE: usize = 1 << 16;

/// Chain table size; covers the whole match distance.
const CHAIN_SIZE: usize = 1 << 16;

/// Window length past which old input is dropped before the next block.
const COMPACT_THRESHOLD: usize = 4 * HISTORY_SIZE;

/// Streaming LZ4-HC compressor.
///
/// Each call to [`BlockCompressor::compress_continue`] emits one independent
/// LZ4 block whose matches may reach into the previous 64 KiB of input.
pub struct Lz4HcCompressor {
    level: HcLevel,
    /// Earlier input followed by the block being compressed.
    window: Vec<u8>,
    /// Compressed block before it is copied out.
    scratch: Vec<u8>,
    /// Most recent position + 1 for each hash, 0 when empty.
    hash_table: Vec<u32>,
    /// Previous position + 1 with the same hash, indexed by position.
    chain_table: Vec<u32>,
    /// Next window position to enter into the tables.
    next_insert: usize,
}

impl Lz4HcCompressor {
    /// Create a compressor with the given level and empty history.
    pub fn new(level: HcLevel) -> Self {
        Self {
            level,
            window: Vec::new(),
            scratch: Vec::new(),
            hash_table: vec![0; HASH_SIZE],
            chain_table: vec![0; CHAIN_SIZE],
            next_insert: 0,
        }
    }

    /// Compression level in use.
    pub fn level(&self) -> HcLevel {
        self.level
    }

    /// Bytes of history currently retained.
    pub fn history_len(&self) -> usize {
        self.window.len().min(HISTORY_SIZE)
    }

    /// Drop window bytes that can no longer be referenced and rebase the tables.
    ///
    /// The shift is a multiple of the chain size so chain slots keep their index.
    fn compact(&mut self) {
        if self.window.len() <= COMPACT_THRESHOLD {
            return;
        }
        let shift = (self.window.len() - HISTORY_SIZE) & !(CHAIN_SIZE - 1);
        self.window.drain(..shift);

        let rebase = |entry: &mut u32| {
            *entry = (*entry as usize).saturating_sub(shift) as u32;
        };
        self.hash_table.iter_mut().for_each(rebase);
        self.chain_table.iter_mut().for_each(rebase);
        self.next_insert = self.next_insert.saturating_sub(shift);
    }

    /// Forget every indexed position; the window itself is kept.
    fn clear_tables(&mut self) {
        self.hash_table.fill(0);
        self.chain_table.fill(0);
        self.next_insert = 0;
    }

    /// Hash 4 bytes for position lookup.
    #[inline]
    fn hash4(window: &[u8], pos: usize) -> usize {
        let val = u32::from_le_bytes([
            window[pos],
            window[pos + 1],
            window[pos + 2],
            window[pos + 3],
        ]);
        ((val.wrapping_mul(2654435761)) >> 16) as usize & (HASH_SIZE - 1)
    }

    /// Enter every position before `target` into the hash and chain tables.
    fn insert_up_to(&mut self, window: &[u8], target: usize) {
        let last = window.len().saturating_sub(MIN_MATCH - 1);
        while self.next_insert < target.min(last) {
            let pos = self.next_insert;
            let h = Self::hash4(window, pos);
            self.chain_table[pos & (CHAIN_SIZE - 1)] = self.hash_table[h];
            self.hash_table[h] = (pos + 1) as u32;
            self.next_insert += 1;
        }
    }

    /// Find the longest match for `pos` ending no later than `match_limit`.
    fn find_best_match(
        &mut self,
        window: &[u8],
        pos: usize,
        match_limit: usize,
    ) -> Option<(usize, usize)> {
        self.insert_up_to(window, pos);

        let max_len = match_limit - pos;
        let mut candidate = self.hash_table[Self::hash4(window, pos)] as usize;
        let mut best_len = MIN_MATCH - 1;
        let mut best_offset = 0;
        let mut attempts = 0;

        while candidate != 0 && attempts < self.level.max_attempts() {
            let match_pos = candidate - 1;
            let offset = pos - match_pos;
            if offset > MAX_OFFSET {
                break;
            }
            attempts += 1;

            // Quick reject: the byte that would extend the best match must agree
            if best_len < max_len && window[match_pos + best_len] != window[pos + best_len] {
                candidate = self.next_candidate(match_pos);
                continue;
            }

            let len = window[match_pos..]
                .iter()
                .zip(&window[pos..pos + max_len])
                .take_while(|(a, b)| a == b)
                .count();

            if len > best_len {
                best_len = len;
                best_offset = offset;
                if len >= self.level.nice_length() || len == max_len {
                    break;
                }
            }

            candidate = self.next_candidate(match_pos);
        }

        (best_len >= MIN_MATCH).then_some((best_offset, best_len))
    }

    /// Older chain entry for `match_pos`, or 0 once the chain wraps.
    #[inline]
    fn next_candidate(&self, match_pos: usize) -> usize {
        let next = self.chain_table[match_pos & (CHAIN_SIZE - 1)] as usize;
        if next == 0 || next - 1 >= match_pos {
            0
        } else {
            next
        }
    }

    /// Compress `window[start..]` into `self.scratch`.
    fn encode(&mut self, window: &[u8], start: usize) {
        self.scratch.clear();

        let len = window.len();
        if len - start <= MF_LIMIT {
            emit_last_literals(&mut self.scratch, &window[start..]);
            return;
        }

        let match_limit = len - LAST_LITERALS;
        let search_end = len - MF_LIMIT;
        let mut pos = start;
        let mut anchor = start;

        while pos < search_end {
            let Some((offset, match_len)) = self.find_best_match(window, pos, match_limit) else {
                pos += 1;
                continue;
            };

            if self.level.lazy() && pos + 1 < search_end {
                if let Some((_, next_len)) = self.find_best_match(window, pos + 1, match_limit) {
                    if next_len > match_len {
                        pos += 1;
                        continue;
                    }
                }
            }

            emit_sequence(&mut self.scratch, &window[anchor..pos], offset, match_len);
            pos += match_len;
            anchor = pos;
        }

        emit_last_literals(&mut self.scratch, &window[anchor..]);
    }
}

impl Default for Lz4HcCompressor {
    fn default() -> Self {
        Self::new(HcLevel::default())
    }
}

impl std::fmt::Debug for Lz4HcCompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lz4HcCompressor")
            .field("level", &self.level)
            .field("history_len", &self.history_len())
            .finish_non_exhaustive()
    }
}

impl BlockCompressor for Lz4HcCompressor {
    fn compress_bound(input_len: usize) -> usize {
        crate::compress_bound(input_len)
    }

    fn compress_continue(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        if input.is_empty() {
            return Ok(0);
        }

        self.compact();
        let start = self.window.len();
        let mut window = std::mem::take(&mut self.window);
        window.extend_from_slice(input);

        self.encode(&window, start);
        self.window = window;

        let produced = self.scratch.len();
        if produced > output.len() {
            tracing::trace!(
                produced,
                capacity = output.len(),
                "compressed block does not fit output"
            );
            // The tables may index the rejected block
            self.window.truncate(start);
            self.clear_tables();
            return Ok(0);
        }

        output[..produced].copy_from_slice(&self.scratch);
        Ok(produced)
    }

    fn reset(&mut self) {
        self.window.clear();
        self.clear_tables();
    }
}
