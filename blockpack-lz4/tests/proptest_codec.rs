//! Property-based tests for the LZ4-HC block codec.
//!
//! Run with: cargo test -p blockpack-lz4 --test proptest_codec

use proptest::prelude::*;

use blockpack_core::{BlockCompressor, BlockDecompressor};
use blockpack_lz4::{HcLevel, Lz4Decompressor, Lz4HcCompressor, compress_bound};

/// Strategy for data with plenty of short repeats.
fn repetitive_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::collection::vec(0u8..4, 1..24), 0..64)
        .prop_map(|runs| runs.concat())
}

/// Strategy for block sizes.
fn block_size_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1usize), Just(13), Just(64), Just(512), Just(4096)]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    })]

    /// Property: any input split into blocks decodes back to itself.
    #[test]
    fn prop_block_stream_roundtrip(
        data in prop::collection::vec(any::<u8>(), 0..8192),
        block_size in block_size_strategy(),
        level in 1u8..=12,
    ) {
        let mut enc = Lz4HcCompressor::new(HcLevel::new(level).unwrap());
        let mut dec = Lz4Decompressor::new();
        let mut packed = vec![0u8; compress_bound(block_size)];
        let mut unpacked = vec![0u8; block_size];

        for block in data.chunks(block_size) {
            let n = enc.compress_continue(block, &mut packed).unwrap();
            prop_assert!(n > 0 && n <= compress_bound(block.len()));
            let m = dec.decompress_continue(&packed[..n], &mut unpacked).unwrap();
            prop_assert_eq!(&unpacked[..m], block);
        }
    }

    /// Property: repetitive input compresses and round-trips.
    #[test]
    fn prop_repetitive_roundtrip(data in repetitive_strategy()) {
        prop_assume!(!data.is_empty());
        let mut enc = Lz4HcCompressor::default();
        let mut dec = Lz4Decompressor::new();
        let mut packed = vec![0u8; compress_bound(data.len())];
        let mut unpacked = vec![0u8; data.len()];

        let n = enc.compress_continue(&data, &mut packed).unwrap();
        let m = dec.decompress_continue(&packed[..n], &mut unpacked).unwrap();
        prop_assert_eq!(m, data.len());
        prop_assert_eq!(unpacked, data);
    }
}
