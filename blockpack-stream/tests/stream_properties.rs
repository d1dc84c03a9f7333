//! Integration tests for the block stream engines.
//!
//! These tests drive the encoder, decoder and partial decoder through their
//! cursor API with the input and output shapes a streaming caller produces:
//! fragmented input, tiny output slices, tampered headers and seeks.

use blockpack_core::{BlockMode, ErrorKind, FlushMode, crc32};
use blockpack_lz4::HcLevel;
use blockpack_stream::{
    BlockDecoder, BlockEncoder, BlockHeader, BlockStream, HEADER_SIZE, InBuffer, OutBuffer,
    PartialDecoder, StreamConfig, compress_to_vec, decompress_to_vec, scan_blocks,
};

// ============================================================================
// Helpers
// ============================================================================

fn text(len: usize) -> Vec<u8> {
    b"Pack my box with five dozen liquor jugs. "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

/// Encode `chunks` as separate inputs, then finish.
fn encode_chunks(config: StreamConfig, chunks: &[&[u8]]) -> Vec<u8> {
    let mut enc = BlockEncoder::new(config).expect("encoder init failed");
    let total: usize = chunks.iter().map(|c| c.len()).sum();
    let mut storage = vec![0u8; total * 2 + 64 * (HEADER_SIZE + 32) + 1024];
    let mut output = OutBuffer::new(&mut storage);

    for chunk in chunks {
        let mut input = InBuffer::new(chunk);
        enc.compress(&mut input, &mut output, FlushMode::NoFlush)
            .expect("compress failed");
        assert!(input.is_empty());
    }
    enc.compress(&mut InBuffer::new(&[]), &mut output, FlushMode::Finish)
        .expect("finish failed");

    let n = output.pos();
    storage.truncate(n);
    storage
}

fn decode_all(stream: &[u8], capacity: usize, check_crc: bool) -> Vec<u8> {
    let mut dec = BlockDecoder::new();
    let mut storage = vec![0u8; capacity];
    let mut output = OutBuffer::new(&mut storage);
    dec.decompress(&mut InBuffer::new(stream), &mut output, check_crc)
        .expect("decompress failed");
    let n = output.pos();
    storage.truncate(n);
    storage
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_roundtrip_modes_and_crc_settings() {
    let data = text(5000);
    let chunks: Vec<&[u8]> = data.chunks(37).collect();

    for mode in [BlockMode::Split, BlockMode::NoSplit] {
        for block_size in [64, 100, 512, 4096] {
            let config = StreamConfig::new()
                .with_block_size(block_size)
                .with_block_mode(mode);
            let stream = encode_chunks(config, &chunks);
            for check_crc in [true, false] {
                assert_eq!(
                    decode_all(&stream, data.len(), check_crc),
                    data,
                    "mode {:?}, block size {}",
                    mode,
                    block_size
                );
            }
        }
    }
}

#[test]
fn test_nosplit_never_splits_an_input() {
    let data = text(990);
    let chunks: Vec<&[u8]> = data.chunks(30).collect();
    let config = StreamConfig::new()
        .with_block_size(100)
        .with_block_mode(BlockMode::NoSplit);
    let stream = encode_chunks(config, &chunks);

    for block in scan_blocks(&stream).unwrap() {
        assert_eq!(block.uncompressed_size % 30, 0, "{:?}", block);
        assert!(block.uncompressed_size <= 100);
    }
}

#[test]
fn test_two_hundred_bytes_in_64_byte_blocks() {
    let data = text(200);
    let config = StreamConfig::new()
        .with_block_size(64)
        .with_block_mode(BlockMode::Split)
        .with_level(HcLevel::new(6).unwrap());
    let stream = encode_chunks(config, &[&data]);

    let blocks = scan_blocks(&stream).unwrap();
    assert_eq!(blocks.len(), 4);
    let mut start = 0;
    for block in &blocks {
        let len = block.uncompressed_size as usize;
        assert!(len <= 64);
        assert_eq!(block.checksum, crc32(&data[start..start + len]));
        start += len;
    }
    assert_eq!(start, 200);
    assert_eq!(decompress_to_vec(&stream, true).unwrap(), data);
}

#[test]
fn test_match_entirely_in_previous_block() {
    // Block 1 opens with a copy of the first 8 bytes of block 0
    let first: Vec<u8> = (0..64u8).map(|b| b.wrapping_mul(37)).collect();
    let mut data = first.clone();
    data.extend_from_slice(&first[..8]);
    data.extend((0..56u8).map(|b| b.wrapping_mul(53).wrapping_add(200)));

    let config = StreamConfig::new().with_block_size(64);
    let stream = compress_to_vec(&data, &config).unwrap();
    assert_eq!(scan_blocks(&stream).unwrap().len(), 2);
    assert_eq!(decompress_to_vec(&stream, true).unwrap(), data);
}

#[test]
fn test_repeats_across_many_blocks() {
    let segment: Vec<u8> = (0..700u32)
        .map(|i| (i.wrapping_mul(2654435761) >> 7) as u8)
        .collect();
    let mut data = Vec::new();
    for round in 0..40 {
        data.extend_from_slice(&segment[round % 7 * 100..]);
        data.extend_from_slice(&segment[..round % 5 * 50]);
    }

    for block_size in [64, 100, 333, 4096] {
        let config = StreamConfig::new().with_block_size(block_size);
        let stream = compress_to_vec(&data, &config).unwrap();
        assert!(stream.len() < data.len() * 3 / 4, "block size {}", block_size);
        assert_eq!(decompress_to_vec(&stream, true).unwrap(), data);
    }
}

// ============================================================================
// Rejections
// ============================================================================

#[test]
fn test_zero_crc_block_cannot_be_framed() {
    let data = [0x9d, 0x0a, 0xd9, 0x6d];
    let err = compress_to_vec(&data, &StreamConfig::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compression);

    // The same bytes frame fine once they share a block with others
    let mut padded = data.to_vec();
    padded.push(0);
    let stream = compress_to_vec(&padded, &StreamConfig::new()).unwrap();
    assert_eq!(decompress_to_vec(&stream, true).unwrap(), padded);
}

#[test]
fn test_nosplit_oversized_input_writes_nothing() {
    let config = StreamConfig::new()
        .with_block_size(64)
        .with_block_mode(BlockMode::NoSplit);
    let mut enc = BlockEncoder::new(config).unwrap();

    // Something already buffered must not be flushed by the rejected call
    let mut storage = vec![0u8; 1024];
    let mut output = OutBuffer::new(&mut storage);
    enc.compress(&mut InBuffer::new(b"buffered"), &mut output, FlushMode::NoFlush)
        .unwrap();

    let big = text(65);
    let mut input = InBuffer::new(&big);
    let err = enc
        .compress(&mut input, &mut output, FlushMode::Finish)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BlockSize);
    assert_eq!(err.code(), -1);
    assert_eq!(input.pos(), 0);
    assert_eq!(output.pos(), 0);
    assert_eq!(enc.buffered(), 8);
}

#[test]
fn test_tampered_checksum_detected_only_with_crc() {
    let data = text(300);
    let stream = encode_chunks(StreamConfig::new().with_block_size(128), &[&data]);
    let blocks = scan_blocks(&stream).unwrap();

    for block in &blocks {
        for bit in [0, 7, 13, 31] {
            let mut tampered = stream.clone();
            let at = block.offset as usize + 8 + bit / 8;
            tampered[at] ^= 1 << (bit % 8);

            let mut dec = BlockDecoder::new();
            let mut storage = vec![0u8; data.len()];
            let err = dec
                .decompress(&mut InBuffer::new(&tampered), &mut OutBuffer::new(&mut storage), true)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BlockDamaged);
            assert_eq!(err.code(), -4);

            assert_eq!(decode_all(&tampered, data.len(), false), data);
        }
    }
}

#[test]
fn test_zero_size_fields_rejected() {
    let payload = [0x50, b'h', b'e', b'l', b'l', b'o'];
    for header in [
        BlockHeader::new(0, 5, crc32(b"hello")),
        BlockHeader::new(payload.len() as u32, 0, crc32(b"hello")),
    ] {
        let mut stream = header.to_bytes().to_vec();
        stream.extend_from_slice(&payload);

        let mut dec = BlockDecoder::new();
        let mut storage = [0u8; 64];
        let err = dec
            .decompress(&mut InBuffer::new(&stream), &mut OutBuffer::new(&mut storage), false)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BlockDamaged, "{:?}", header);
    }

    // The same payload behind a valid header decodes
    let mut stream = BlockHeader::new(payload.len() as u32, 5, crc32(b"hello"))
        .to_bytes()
        .to_vec();
    stream.extend_from_slice(&payload);
    assert_eq!(decode_all(&stream, 64, true), b"hello");
}

#[test]
fn test_undersized_output_writes_nothing() {
    let data = text(100);
    let stream = encode_chunks(StreamConfig::new().with_block_size(100), &[&data]);

    let mut dec = BlockDecoder::new();
    let mut storage = vec![0xAAu8; 99];
    let mut output = OutBuffer::new(&mut storage);
    let err = dec
        .decompress(&mut InBuffer::new(&stream), &mut output, true)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Buffer);
    assert_eq!(err.code(), -2);
    assert_eq!(output.pos(), 0);
    assert!(storage.iter().all(|&b| b == 0xAA));
}

// ============================================================================
// Fragmentation and slicing
// ============================================================================

#[test]
fn test_one_byte_input_fragments() {
    let data = text(3000);
    let stream = encode_chunks(StreamConfig::new().with_block_size(256), &[&data]);
    let whole = decode_all(&stream, data.len(), true);

    let mut dec = BlockDecoder::new();
    let mut storage = vec![0u8; data.len()];
    let mut output = OutBuffer::new(&mut storage);
    for byte in stream.chunks(1) {
        let mut input = InBuffer::new(byte);
        dec.decompress(&mut input, &mut output, true).unwrap();
        assert!(input.is_empty());
    }
    assert_eq!(output.written(), &whole[..]);
    assert_eq!(dec.total_in(), stream.len() as u64);
}

#[test]
fn test_partial_slices_match_full_decode() {
    let data = text(700);
    let stream = encode_chunks(StreamConfig::new().with_block_size(256), &[&data]);
    let whole = decode_all(&stream, data.len(), true);

    for slice in [1, 2, 3, 7, 64, 255, 256, 1000] {
        let mut dec = PartialDecoder::new();
        let mut input = InBuffer::new(&stream);
        let mut result = Vec::new();
        let mut buf = vec![0u8; slice];

        loop {
            let mut output = OutBuffer::new(&mut buf);
            dec.decompress_partial(&mut input, &mut output, false, true)
                .unwrap();
            let n = output.pos();
            if n == 0 {
                break;
            }
            result.extend_from_slice(&buf[..n]);
        }
        assert_eq!(result, whole, "slice size {}", slice);
    }
}

#[test]
fn test_partial_fragmented_input_and_output() {
    let data = text(900);
    let stream = encode_chunks(StreamConfig::new().with_block_size(128), &[&data]);

    let mut dec = PartialDecoder::new();
    let mut result = Vec::new();
    let mut buf = [0u8; 5];
    for piece in stream.chunks(3) {
        let mut input = InBuffer::new(piece);
        while !input.is_empty() || dec.staged_remaining() > 0 {
            let mut output = OutBuffer::new(&mut buf);
            dec.decompress_partial(&mut input, &mut output, false, true)
                .unwrap();
            let n = output.pos();
            result.extend_from_slice(&buf[..n]);
            if n == 0 {
                break;
            }
        }
    }
    assert_eq!(result, data);
}

#[test]
fn test_partial_seek_to_independent_block() {
    // Finishing after every block keeps each block free of history references
    let data = text(1024);
    let config = StreamConfig::new().with_block_size(256);
    let mut enc = BlockEncoder::new(config).unwrap();
    let mut storage = vec![0u8; 4096];
    let mut output = OutBuffer::new(&mut storage);
    for chunk in data.chunks(256) {
        enc.compress(&mut InBuffer::new(chunk), &mut output, FlushMode::Finish)
            .unwrap();
    }
    let n = output.pos();
    let stream = &storage[..n];

    let blocks = scan_blocks(stream).unwrap();
    assert_eq!(blocks.len(), 4);

    let mut dec = PartialDecoder::new();
    let mut input = InBuffer::new(stream);
    let mut buf = [0u8; 10];

    // Read a little of block 0, then jump to block 2
    dec.decompress_partial(&mut input, &mut OutBuffer::new(&mut buf), false, true)
        .unwrap();
    assert_eq!(&buf[..], &data[..10]);

    input.set_pos(blocks[2].offset as usize);
    dec.decompress_partial(&mut input, &mut OutBuffer::new(&mut buf), true, true)
        .unwrap();
    assert_eq!(&buf[..], &data[512..522]);

    // And back to block 1
    input.set_pos(blocks[1].offset as usize);
    let mut whole = [0u8; 256];
    dec.decompress_partial(&mut input, &mut OutBuffer::new(&mut whole), true, true)
        .unwrap();
    assert_eq!(&whole[..], &data[256..512]);
}

// ============================================================================
// Resource owner
// ============================================================================

#[test]
fn test_stream_owner_lifecycle() {
    let mut stream = BlockStream::default();
    stream.close();

    stream
        .init(StreamConfig::new().with_block_size(64))
        .unwrap();
    let data = text(150);
    let mut packed = vec![0u8; 1024];
    let mut output = OutBuffer::new(&mut packed);
    stream
        .compress(&mut InBuffer::new(&data), &mut output, FlushMode::Finish)
        .unwrap();
    let n = output.pos();

    let mut unpacked = vec![0u8; 150];
    let mut pos = 0;
    let mut input = InBuffer::new(&packed[..n]);
    while pos < unpacked.len() {
        let end = (pos + 11).min(unpacked.len());
        let mut output = OutBuffer::new(&mut unpacked[pos..end]);
        stream
            .decompress_partial(&mut input, &mut output, false, true)
            .unwrap();
        pos += output.pos();
    }
    assert_eq!(unpacked, data);

    stream.close();
    stream.close();
    assert!(stream.is_closed());
}
