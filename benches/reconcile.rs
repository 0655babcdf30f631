// Benchmarks for merging refreshed ticker snapshots into cached sets

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use marketx_rs::market_data::reconcile::{reconcile_records, union_view};
use marketx_rs::market_data::{MarketRecord, SourceId};

fn snapshot(source: SourceId, n: usize, offset: usize, price: f64) -> Vec<MarketRecord> {
    (offset..offset + n)
        .map(|i| {
            let symbol = format!("C{i:04}");
            MarketRecord {
                display_name: symbol.clone(),
                source_symbol: format!("{symbol}USDT"),
                symbol,
                price,
                absolute_change: 0.0,
                percent_change: 0.0,
                volume: 1_000.0,
                quote_volume: 1_000.0 * price,
                estimated_market_cap: 10_000.0 * price,
                source,
            }
        })
        .collect()
}

fn benchmark_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    // typical spot universes after the liquidity gate
    for size in [200usize, 600, 2_000] {
        let previous = snapshot(SourceId::Binance, size, 0, 100.0);
        // 90% overlap: a few delistings, a few listings
        let refreshed = snapshot(SourceId::Binance, size, size / 10, 101.0);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("overlapping", size), &size, |b, _| {
            b.iter(|| black_box(reconcile_records(black_box(&previous), black_box(&refreshed))))
        });
        group.bench_with_input(BenchmarkId::new("identical", size), &size, |b, _| {
            b.iter(|| black_box(reconcile_records(black_box(&previous), black_box(&previous))))
        });
    }
    group.finish();
}

fn benchmark_union(c: &mut Criterion) {
    let sets: Vec<Vec<MarketRecord>> = SourceId::ALL
        .iter()
        .map(|&source| snapshot(source, 600, 0, 50.0))
        .collect();

    c.bench_function("union_view_5x600", |b| {
        b.iter(|| black_box(union_view(sets.iter().map(|s| s.as_slice()))))
    });
}

criterion_group!(benches, benchmark_reconcile, benchmark_union);
criterion_main!(benches);
