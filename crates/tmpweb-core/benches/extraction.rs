//! Extraction throughput benchmarks.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use tempfile::TempDir;
use tmpweb_core::ArchiveKind;
use tmpweb_core::ExtractionConfig;
use tmpweb_core::SafeArchiveExtractor;
use tmpweb_core::resolve_web_root;
use tmpweb_core::test_utils::TarTestBuilder;
use tmpweb_core::test_utils::ZipTestBuilder;

/// A site of `file_count` small pages under one wrapper directory.
fn many_pages_zip(file_count: usize) -> Vec<u8> {
    let mut builder = ZipTestBuilder::new();
    for i in 0..file_count {
        let body = format!("<!DOCTYPE html><p>page {i}</p>");
        builder = builder.add_file(&format!("site/page{i:04}.html"), body.as_bytes());
    }
    builder.build()
}

fn many_pages_tar_gz(file_count: usize) -> Vec<u8> {
    let mut builder = TarTestBuilder::new();
    for i in 0..file_count {
        let body = format!("<!DOCTYPE html><p>page {i}</p>");
        builder = builder.add_file(&format!("site/page{i:04}.html"), body.as_bytes());
    }
    builder.build_gz()
}

fn bench_many_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("many_files");
    let extractor = SafeArchiveExtractor::new(&ExtractionConfig::default());

    for count in [10, 100, 1000] {
        let zip = many_pages_zip(count);
        let tar = many_pages_tar_gz(count);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("zip", count), &zip, |b, data| {
            b.iter(|| {
                let temp = TempDir::new().unwrap();
                extractor.extract(data, ArchiveKind::Zip, temp.path()).unwrap();
                resolve_web_root(temp.path()).unwrap()
            });
        });
        group.bench_with_input(BenchmarkId::new("tar_gz", count), &tar, |b, data| {
            b.iter(|| {
                let temp = TempDir::new().unwrap();
                extractor.extract(data, ArchiveKind::Tar, temp.path()).unwrap();
                resolve_web_root(temp.path()).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_large_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("large_file");
    let extractor = SafeArchiveExtractor::new(&ExtractionConfig::default());

    for size in [1024 * 1024, 10 * 1024 * 1024] {
        let data = ZipTestBuilder::new()
            .add_file("video.bin", &vec![0xAB_u8; size])
            .build();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                let temp = TempDir::new().unwrap();
                extractor.extract(data, ArchiveKind::Zip, temp.path()).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_bomb_rejection(c: &mut Criterion) {
    let extractor = SafeArchiveExtractor::new(&ExtractionConfig {
        max_total_size: 1024 * 1024,
        max_file_count: 10,
    });
    let bomb = ZipTestBuilder::new()
        .add_file("bomb.bin", &vec![0u8; 64 * 1024 * 1024])
        .build();

    c.bench_function("bomb_rejection", |b| {
        b.iter(|| {
            let temp = TempDir::new().unwrap();
            extractor
                .extract(&bomb, ArchiveKind::Zip, temp.path())
                .unwrap_err()
        });
    });
}

criterion_group!(benches, bench_many_files, bench_large_file, bench_bomb_rejection);
criterion_main!(benches);
