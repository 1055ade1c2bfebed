//! Criterion benchmarks for assetpipe critical paths
//!
//! Benchmarks the operations a coordinator runs for every source or product:
//! - Routing: pattern matching across a registry
//! - Hashing: streaming content fingerprints
//! - Inference: legacy product type and sub id

use assetpipe::builder::BuilderRegistry;
use assetpipe::fingerprint::ContentHasher;
use assetpipe::legacy::{infer_asset_type, infer_sub_id};
use assetpipe::{BuilderDescriptor, BuilderPattern, PatternMatcher};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;
use uuid::Uuid;

// =============================================================================
// Test Data Generators
// =============================================================================

/// Registry with `n` builders, alternating wildcard and regex patterns.
fn make_registry(n: usize) -> BuilderRegistry {
    let mut registry = BuilderRegistry::new();
    for i in 0..n {
        let pattern = if i % 2 == 0 {
            BuilderPattern::wildcard(format!("*.ext{}", i))
        } else {
            BuilderPattern::regex(format!(".*/lod[0-9]+\\.ext{}", i))
        };
        let descriptor =
            BuilderDescriptor::new(format!("builder_{}", i), Uuid::from_u128(i as u128 + 1)).with_pattern(pattern);
        let _ = registry.register(descriptor);
    }
    registry
}

/// Deterministic pseudo-random bytes.
fn make_content(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8).collect()
}

// =============================================================================
// Routing Benchmarks
// =============================================================================

fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing");

    let wildcard = PatternMatcher::wildcard("*.tif");
    group.bench_function("wildcard_match", |b| {
        b.iter(|| wildcard.matches_path(black_box("textures/terrain/Rock_Diffuse.TIF")))
    });

    let regex = PatternMatcher::regex(".*/rock_[a-z]+\\.(tif|tiff)");
    group.bench_function("regex_match", |b| {
        b.iter(|| regex.matches_path(black_box("textures/terrain/rock_diffuse.tiff")))
    });

    for size in [8, 32, 128].iter() {
        let registry = make_registry(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("find_builders", size), &registry, |b, registry| {
            b.iter(|| registry.find_descriptors_for_path(black_box("objects/props/lod3.ext7")))
        });
    }

    group.finish();
}

// =============================================================================
// Hashing Benchmarks
// =============================================================================

fn bench_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashing");
    let hasher = ContentHasher::new();

    for size in [4 * 1024, 256 * 1024, 4 * 1024 * 1024].iter() {
        let content = make_content(*size);
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("hash_stream", size), &content, |b, content| {
            b.iter(|| hasher.hash_stream(&mut Cursor::new(black_box(content.as_slice()))))
        });
    }

    group.finish();
}

// =============================================================================
// Inference Benchmarks
// =============================================================================

fn bench_inference(c: &mut Criterion) {
    let mut group = c.benchmark_group("inference");

    let names = ["textures/rock_cm.dds", "textures/rock_cm_diff.dds.3a", "objects/tree.cgf.2", "anim/walk.motion"];
    group.throughput(Throughput::Elements(names.len() as u64));
    group.bench_function("infer_type_and_sub_id", |b| {
        b.iter(|| {
            for name in names.iter() {
                let ty = infer_asset_type(black_box(name));
                black_box(infer_sub_id(ty, name));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_routing, bench_hashing, bench_inference);
criterion_main!(benches);
