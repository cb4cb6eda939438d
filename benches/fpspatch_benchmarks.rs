//! Benchmarks for box scanning, detection and patching.
//!
//! Run with: cargo bench
//!
//! Inputs are synthetic: a small `moov` tree followed by a large `mdat`
//! payload, so the scan cost is dominated by the sample data the locator
//! has to walk past.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput};
use fpspatch::{FourCC, apply_patch, detect_fps, find_all};

fn boxed(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(payload.len() + 8);
    data.extend_from_slice(&((payload.len() + 8) as u32).to_be_bytes());
    data.extend_from_slice(tag);
    data.extend_from_slice(payload);
    data
}

fn timing_box(tag: &[u8; 4], timescale: u32, duration: u32, extra: usize) -> Vec<u8> {
    let mut body = vec![0; 12];
    body.extend_from_slice(&timescale.to_be_bytes());
    body.extend_from_slice(&duration.to_be_bytes());
    body.resize(body.len() + extra, 0);
    boxed(tag, &body)
}

fn sample_movie(mdat_len: usize) -> Vec<u8> {
    let mut stts = vec![0; 4];
    stts.extend_from_slice(&1u32.to_be_bytes());
    stts.extend_from_slice(&250u32.to_be_bytes());
    stts.extend_from_slice(&40u32.to_be_bytes());

    let mut mdia = timing_box(b"mdhd", 1000, 10_000, 4);
    mdia.extend(boxed(b"minf", &boxed(b"stbl", &boxed(b"stts", &stts))));

    let mut moov = timing_box(b"mvhd", 1000, 10_000, 80);
    moov.extend(boxed(b"trak", &boxed(b"mdia", &mdia)));

    let mut data = boxed(b"ftyp", b"isom\0\0\x02\0isomiso2");
    data.extend(boxed(b"mdat", &vec![0x5A; mdat_len]));
    data.extend(boxed(b"moov", &moov));
    data
}

fn benchmark_locator(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("locate mdhd");
    for size in [64 * 1024, 1024 * 1024, 16 * 1024 * 1024] {
        let data = sample_movie(size);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |bencher, data| {
            bencher.iter(|| find_all(black_box(data), FourCC(*b"mdhd")).count());
        });
    }
    group.finish();
}

fn benchmark_detection(criterion: &mut Criterion) {
    let data = sample_movie(1024 * 1024);
    criterion.bench_function("detect fps (1 MiB mdat)", |bencher| {
        bencher.iter(|| detect_fps(black_box(&data)));
    });
}

fn benchmark_patch(criterion: &mut Criterion) {
    let data = sample_movie(1024 * 1024);
    criterion.bench_function("apply patch (1 MiB mdat)", |bencher| {
        bencher.iter(|| apply_patch(black_box(&data), 25.0, 50.0).patched_count);
    });
}

criterion::criterion_group!(benches, benchmark_locator, benchmark_detection, benchmark_patch);
criterion::criterion_main!(benches);
