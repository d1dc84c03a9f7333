//! Integration tests for block-by-block LZ4-HC compression with history.
//!
//! Compressor and decompressor are driven over the same sequence of blocks;
//! every block must decode back to its input using only the history both
//! sides accumulated.

use blockpack_core::{BlockCompressor, BlockDecompressor};
use blockpack_lz4::{HISTORY_SIZE, HcLevel, Lz4Decompressor, Lz4HcCompressor, compress_bound};

fn roundtrip_blocks(level: HcLevel, data: &[u8], block_size: usize) -> usize {
    let mut enc = Lz4HcCompressor::new(level);
    let mut dec = Lz4Decompressor::new();
    let mut packed = vec![0u8; compress_bound(block_size)];
    let mut unpacked = vec![0u8; block_size];
    let mut total_compressed = 0;

    for block in data.chunks(block_size) {
        let n = enc
            .compress_continue(block, &mut packed)
            .expect("compress failed");
        assert!(n > 0, "compressor produced nothing");
        total_compressed += n;

        let m = dec
            .decompress_continue(&packed[..n], &mut unpacked)
            .expect("decompress failed");
        assert_eq!(&unpacked[..m], block);
    }

    total_compressed
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_text_in_small_blocks() {
    let data = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(200);
    let total = roundtrip_blocks(HcLevel::DEFAULT, &data, 64);
    assert!(total < data.len(), "total: {}, original: {}", total, data.len());
}

#[test]
fn test_every_level_with_history() {
    let data = b"abcabcabdabcabcabeabcabcabf0123456789".repeat(300);
    for level in 1..=12 {
        let level = HcLevel::new(level).expect("valid level");
        roundtrip_blocks(level, &data, 1000);
    }
}

#[test]
fn test_incompressible_blocks() {
    let mut state = 0x1234_5678u32;
    let data: Vec<u8> = (0..20_000)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect();

    let total = roundtrip_blocks(HcLevel::MAX, &data, 4096);
    assert!(total <= compress_bound(data.len()) + 5 * 16);
}

#[test]
fn test_history_window_slides_past_64k() {
    // Repeats with a period longer than the history window
    let pattern: Vec<u8> = (0..HISTORY_SIZE as u32 + 5000)
        .map(|i| (i.wrapping_mul(0x9E37_79B9) >> 24) as u8)
        .collect();
    let mut data = pattern.clone();
    data.extend_from_slice(&pattern);
    roundtrip_blocks(HcLevel::new(3).expect("valid level"), &data, 32 * 1024);
}

#[test]
fn test_single_byte_blocks() {
    let data = b"tiny blocks still decode in order";
    roundtrip_blocks(HcLevel::DEFAULT, data, 1);
}

// ============================================================================
// History divergence
// ============================================================================

#[test]
fn test_reset_on_both_sides_restarts_stream() {
    let block = b"shared prefix shared prefix shared prefix shared prefix".to_vec();
    let mut enc = Lz4HcCompressor::default();
    let mut dec = Lz4Decompressor::new();
    let mut packed = vec![0u8; compress_bound(block.len())];
    let mut unpacked = vec![0u8; block.len()];

    for _ in 0..3 {
        let n = enc.compress_continue(&block, &mut packed).unwrap();
        let m = dec.decompress_continue(&packed[..n], &mut unpacked).unwrap();
        assert_eq!(&unpacked[..m], &block[..]);
        enc.reset();
        dec.reset();
    }
    assert_eq!(enc.history_len(), 0);
    assert_eq!(dec.history_len(), 0);
}

#[test]
fn test_block_referencing_missing_history_fails() {
    let block = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ".to_vec();
    let mut enc = Lz4HcCompressor::default();
    let mut packed = vec![0u8; compress_bound(block.len())];
    enc.compress_continue(&block, &mut packed).unwrap();
    let n = enc.compress_continue(&block, &mut packed).unwrap();

    let mut dec = Lz4Decompressor::new();
    let mut unpacked = vec![0u8; block.len()];
    let err = dec
        .decompress_continue(&packed[..n], &mut unpacked)
        .unwrap_err();
    assert_eq!(err.kind(), blockpack_core::ErrorKind::BlockDamaged);
}
