//! Correlation engine benchmark.
#![allow(clippy::cast_precision_loss)]
//!
//! Run with: `cargo bench --bench correlation_benchmark`

use std::sync::Arc;

use affinity_core::{
    DataModel, GenericDataModel, GenericItemCorrelation, ItemCorrelation, ItemId,
    PearsonCorrelation, SpearmanCorrelation, User, UserCorrelation, UserId,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Deterministic ratings: each user rates roughly `density` of the items.
fn generate_model(users: usize, items: usize, density: u64) -> Arc<dyn DataModel> {
    let mut state = 42u64;
    let users = (0..users).map(|u| {
        let prefs: Vec<(ItemId, f64)> = (0..items)
            .filter_map(|i| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
                let roll = (state >> 16) % 100;
                (roll < density).then(|| (ItemId::from(format!("i{i}")), (roll % 5 + 1) as f64))
            })
            .collect();
        User::new(format!("u{u}"), prefs).expect("finite values")
    });
    Arc::new(GenericDataModel::new(users))
}

fn bench_user_correlation(c: &mut Criterion) {
    let mut group = c.benchmark_group("user_correlation");

    for items in [100, 1_000, 10_000] {
        let data = generate_model(2, items, 50);
        let a = data.user(&UserId::from("u0")).expect("user");
        let b = data.user(&UserId::from("u1")).expect("user");
        let pearson = PearsonCorrelation::new(Arc::clone(&data));
        let weighted = PearsonCorrelation::new(Arc::clone(&data)).weighted(true);
        let spearman = SpearmanCorrelation::new(Arc::clone(&data));

        group.bench_with_input(BenchmarkId::new("pearson", items), &items, |bench, _| {
            bench.iter(|| black_box(pearson.user_correlation(&a, &b)));
        });
        group.bench_with_input(BenchmarkId::new("weighted", items), &items, |bench, _| {
            bench.iter(|| black_box(weighted.user_correlation(&a, &b)));
        });
        group.bench_with_input(BenchmarkId::new("spearman", items), &items, |bench, _| {
            bench.iter(|| black_box(spearman.user_correlation(&a, &b)));
        });
    }

    group.finish();
}

fn bench_item_correlation(c: &mut Criterion) {
    let mut group = c.benchmark_group("item_correlation");
    group.sample_size(20);

    let data = generate_model(2_000, 50, 40);
    let pearson = PearsonCorrelation::new(Arc::clone(&data));
    let (x, y) = (ItemId::from("i3"), ItemId::from("i7"));

    group.bench_function("pearson_live", |bench| {
        bench.iter(|| black_box(pearson.item_correlation(&x, &y)));
    });

    let table = GenericItemCorrelation::from_correlation(&pearson, data.as_ref()).expect("table");
    group.bench_function("precomputed_lookup", |bench| {
        bench.iter(|| black_box(table.item_correlation(&x, &y)));
    });

    group.bench_function("precompute_table", |bench| {
        bench.iter(|| black_box(GenericItemCorrelation::from_correlation(&pearson, data.as_ref())));
    });

    group.finish();
}

criterion_group!(benches, bench_user_correlation, bench_item_correlation);
criterion_main!(benches);
