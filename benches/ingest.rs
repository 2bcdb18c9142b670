
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use mcstore::{per_second, Series, SeriesDataset, SeriesRepository};

fn bench_dataset_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("dataset_add");

    for (name, repeat_percent) in [("changing", 0), ("mixed", 50), ("mostly_constant", 95)] {
        let ops = datasets::generate_add_ops(datasets::DEFAULT_SEED, 10_000, 1, 1, repeat_percent);
        group.bench_function(format!("add_10k_{}", name), |b| {
            b.iter_batched(
                || SeriesDataset::new(Series::new("bench"), "server", 60).expect("dataset"),
                |mut set| {
                    for op in &ops {
                        set = set.add(black_box(op.time), black_box(op.value));
                    }
                    set
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_repository_add(c: &mut Criterion) {
    let ops = datasets::generate_add_ops(datasets::DEFAULT_SEED, 100_000, 64, 4, 50);
    let series: Vec<Series> = (0..64)
        .map(|i| Series::new("Metric").with_tag("ns", format!("s{}", i)))
        .collect();
    let instances: Vec<String> = (0..4).map(|i| format!("instance{}", i)).collect();

    let mut group = c.benchmark_group("repository");
    group.bench_function("add_100k_256_pairs", |b| {
        b.iter_batched(
            || SeriesRepository::new(60).expect("repository"),
            |repo| {
                for op in &ops {
                    repo.add(
                        black_box(&series[op.series]),
                        black_box(&instances[op.instance]),
                        black_box(op.time),
                        black_box(op.value),
                    )
                    .unwrap();
                }
                repo
            },
            BatchSize::LargeInput,
        )
    });

    let repo = SeriesRepository::new(60).expect("repository");
    for op in &ops {
        repo.add(&series[op.series], &instances[op.instance], op.time, op.value)
            .unwrap();
    }
    group.bench_function("select_all_series_points", |b| {
        b.iter(|| {
            let selected = repo.select_all_series().unwrap();
            selected.iter().map(|set| per_second(&set.points()).len()).sum::<usize>()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_dataset_add, bench_repository_add);
criterion_main!(benches);
