//! CRC-32 throughput benchmarks.

use blockpack_core::crc::{Crc32, crc32};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_crc32(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32");

    for size in [64usize, 2048, 65_280, 1 << 20] {
        let data: Vec<u8> = (0..size).map(|i| (i * 7 + 3) as u8).collect();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("oneshot", size), &data, |b, data| {
            b.iter(|| crc32(black_box(data)))
        });
        group.bench_with_input(BenchmarkId::new("sector_chunks", size), &data, |b, data| {
            b.iter(|| {
                let mut crc = Crc32::new();
                for chunk in data.chunks(2048) {
                    crc.update(black_box(chunk));
                }
                crc.finalize()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_crc32);
criterion_main!(benches);
