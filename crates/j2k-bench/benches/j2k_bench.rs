//! Benchmarks for the DWT and bit-plane primitives.
//!
//! Run with: `cargo bench -p j2k-bench`

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use j2k_bench::{coefficients, tile_f32, tile_i32};
use j2k_compute::{Backend, BitPlaneOps, Processor, ScalarBitPlane, SimdBitPlane, dwt};
use j2k_core::FilterKernel;

/// Single 2D level for both fixed filters.
fn bench_dwt_2d(c: &mut Criterion) {
    let mut group = c.benchmark_group("dwt_2d");

    for size in [64usize, 256, 1024] {
        let ints = tile_i32(size, size);
        let floats = tile_f32(size, size);
        group.throughput(Throughput::Elements((size * size) as u64));

        group.bench_with_input(BenchmarkId::new("53_forward", size), &ints, |b, d| {
            b.iter(|| dwt::forward_2d(black_box(d), size, size, &FilterKernel::reversible53()))
        });

        group.bench_with_input(BenchmarkId::new("97_forward", size), &floats, |b, d| {
            b.iter(|| dwt::forward_2d(black_box(d), size, size, &FilterKernel::irreversible97()))
        });

        group.bench_with_input(BenchmarkId::new("lifting_cdf97_forward", size), &floats, |b, d| {
            b.iter(|| dwt::forward_2d(black_box(d), size, size, &FilterKernel::lifting_cdf97()))
        });
    }

    group.finish();
}

/// Five-level pyramid, forward then inverse.
fn bench_multi_level(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_level");
    let filter = FilterKernel::reversible53();

    for size in [256usize, 1024] {
        let data = tile_i32(size, size);
        group.throughput(Throughput::Elements((size * size) as u64));

        group.bench_with_input(BenchmarkId::new("53_roundtrip", size), &data, |b, d| {
            b.iter(|| {
                let dec = dwt::forward_multi_level(black_box(d), size, size, Some(5), &filter, 5)?;
                dwt::inverse_multi_level(&dec, &filter)
            })
        });
    }

    group.finish();
}

/// Scalar vs SIMD bit-plane strategies.
fn bench_bitplane(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitplane");
    let strategies: [&dyn BitPlaneOps; 2] = [&ScalarBitPlane, &SimdBitPlane];

    for len in [1024usize, 65_536] {
        let coeffs = coefficients(len);
        group.throughput(Throughput::Elements(len as u64));

        for ops in strategies {
            group.bench_with_input(BenchmarkId::new(format!("{}_significance", ops.name()), len), &coeffs, |b, c| {
                b.iter(|| ops.significance(black_box(c), 7))
            });
            group.bench_with_input(BenchmarkId::new(format!("{}_magnitude_sign", ops.name()), len), &coeffs, |b, c| {
                b.iter(|| ops.magnitude_sign_separate(black_box(c)))
            });
            group.bench_with_input(BenchmarkId::new(format!("{}_max_abs", ops.name()), len), &coeffs, |b, c| {
                b.iter(|| ops.max_abs_value(black_box(c)))
            });
        }
    }

    group.finish();
}

/// Tiled dispatch through the processor.
fn bench_tiled(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiled");
    let filter = FilterKernel::reversible53();
    let (w, h) = (2048usize, 1536);
    let image = tile_i32(w, h);
    group.throughput(Throughput::Elements((w * h) as u64));

    for backend in [Backend::Cpu, Backend::Auto] {
        let Ok(proc) = Processor::builder().backend(backend).tile_size(256).build() else {
            continue;
        };
        group.bench_function(BenchmarkId::new("53_forward", backend.name()), |b| {
            b.iter(|| proc.forward_tiled(black_box(&image), w, h, Some(5), &filter))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dwt_2d, bench_multi_level, bench_bitplane, bench_tiled);
criterion_main!(benches);
