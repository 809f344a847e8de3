//! Benchmarks for spill buffer components.
//!
//! Run with: cargo bench --package alopex-spill
//!
//! ## Benchmark Categories
//!
//! - **In-Memory**: Write/read cycles that stay within the memory budget
//! - **Spilled**: Write/read cycles that go through the spill file
//! - **Reader**: Caller-sized copies through the stream overlay
//! - **Codec**: Varint and zlib block compression

use alopex_spill::codec::{compress, decode_uint, decompress, encode_uint_to, CompressionMethod};
use alopex_spill::spillbuf::{SpillBuffer, SpillConfig, SpillReader};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;

const BLOCK_SIZE: usize = 16 * 1024;

/// Generate a payload with some repetition so compression has work to do.
fn generate_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i / 7) % 251) as u8).collect()
}

fn bench_memory_roundtrip(c: &mut Criterion) {
    let payload = generate_payload(BLOCK_SIZE);
    let mut group = c.benchmark_group("memory_roundtrip");
    group.throughput(Throughput::Bytes((payload.len() * 64) as u64));

    group.bench_function("64_blocks", |b| {
        b.iter(|| {
            let mut buf = SpillBuffer::new(BLOCK_SIZE, 64 * BLOCK_SIZE).unwrap();
            for _ in 0..64 {
                buf.write(black_box(&payload)).unwrap();
            }
            let mut total = 0;
            while let Some(chunk) = buf.read().unwrap() {
                total += chunk.len();
            }
            black_box(total)
        })
    });
    group.finish();
}

fn bench_spilled_roundtrip(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let payload = generate_payload(BLOCK_SIZE);
    let mut group = c.benchmark_group("spilled_roundtrip");

    for spill_all in [false, true] {
        group.throughput(Throughput::Bytes((payload.len() * 64) as u64));
        group.bench_with_input(
            BenchmarkId::new("spill_all", spill_all),
            &spill_all,
            |b, &spill_all| {
                b.iter(|| {
                    let config = SpillConfig::new(BLOCK_SIZE, 4 * BLOCK_SIZE)
                        .with_spill_all_contents(spill_all)
                        .with_dirpath(temp_dir.path());
                    let mut buf = SpillBuffer::with_config(config).unwrap();
                    for _ in 0..64 {
                        buf.write(black_box(&payload)).unwrap();
                    }
                    let mut total = 0;
                    while let Some(chunk) = buf.read().unwrap() {
                        total += chunk.len();
                    }
                    black_box(total)
                })
            },
        );
    }
    group.finish();
}

fn bench_reader_copy(c: &mut Criterion) {
    let payload = generate_payload(BLOCK_SIZE * 16);
    let mut group = c.benchmark_group("reader_copy");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    for read_size in [64usize, 1024, 4096] {
        group.bench_with_input(
            BenchmarkId::from_parameter(read_size),
            &read_size,
            |b, &read_size| {
                b.iter(|| {
                    let mut reader = SpillReader::new(BLOCK_SIZE, payload.len()).unwrap();
                    reader.write(&payload).unwrap();
                    let mut dst = vec![0u8; read_size];
                    let mut total = 0;
                    loop {
                        let n = reader.read(&mut dst).unwrap();
                        if n == 0 {
                            break;
                        }
                        total += n;
                    }
                    black_box(total)
                })
            },
        );
    }
    group.finish();
}

fn bench_varint(c: &mut Criterion) {
    let values: Vec<u64> = (0..1000u64).map(|i| i.wrapping_mul(0x9e37_79b9_7f4a_7c15)).collect();

    c.bench_function("varint_encode_decode_1k", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(10 * values.len());
            for &v in &values {
                encode_uint_to(&mut out, v);
            }
            let mut pos = 0;
            let mut sum = 0u64;
            while let Some((v, n)) = decode_uint(&out[pos..]) {
                sum = sum.wrapping_add(v);
                pos += n;
            }
            black_box(sum)
        })
    });
}

fn bench_compress(c: &mut Criterion) {
    let payload = generate_payload(64 * 1024);
    let mut group = c.benchmark_group("compress_64k");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    for method in [
        CompressionMethod::ZlibMin,
        CompressionMethod::ZlibDefault,
        CompressionMethod::ZlibMax,
    ] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", method)),
            &method,
            |b, &method| {
                let mut out = Vec::new();
                b.iter(|| compress(black_box(&payload), &mut out, method).unwrap())
            },
        );
    }
    group.finish();

    let mut compressed = Vec::new();
    compress(&payload, &mut compressed, CompressionMethod::ZlibDefault).unwrap();
    c.bench_function("decompress_64k", |b| {
        let mut out = Vec::new();
        b.iter(|| decompress(black_box(&compressed), &mut out, payload.len()).unwrap())
    });
}

criterion_group!(
    benches,
    bench_memory_roundtrip,
    bench_spilled_roundtrip,
    bench_reader_copy,
    bench_varint,
    bench_compress,
);
criterion_main!(benches);
