use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use ridership_processing::processing::{aggregate, compact, merge, normalize};
use ridership_processing::types::{RawRecord, UnifiedTable};

const STATIONS: usize = 120;

/// One month of synthetic OD rows: every hour, a fixed fan-out of station pairs.
fn synthetic_month() -> UnifiedTable {
    let names: Vec<String> = (0..STATIONS).map(|i| format!("S{i:03}")).collect();
    let mut records = Vec::new();
    for day in 1..=30 {
        for hour in 0..24 {
            for from in 0..STATIONS {
                for step in [1, 7, 31] {
                    let to = (from + step) % STATIONS;
                    records.push(RawRecord {
                        date: format!("2024-04-{day:02}"),
                        hour: hour.to_string(),
                        entry_station: names[from].clone(),
                        exit_station: names[to].clone(),
                        passenger_count: ((from * 13 + hour * 7 + day) % 50) as i64,
                    });
                }
            }
        }
    }
    UnifiedTable::new(records)
}

fn bench_stages(c: &mut Criterion) {
    let table = synthetic_month();
    let normalized = normalize(table.clone());
    let compacted = compact(&normalized).unwrap();
    let (entries, exits) = aggregate(&compacted).unwrap();

    let mut group = c.benchmark_group("stages");
    group.sample_size(20);

    group.bench_function("normalize", |b| {
        b.iter_batched(|| table.clone(), |t| black_box(normalize(t)), BatchSize::LargeInput)
    });
    group.bench_function("compact", |b| b.iter(|| black_box(compact(&normalized).unwrap())));
    group.bench_function("aggregate", |b| b.iter(|| black_box(aggregate(&compacted).unwrap())));
    group.bench_function("merge", |b| b.iter(|| black_box(merge(&entries, &exits, "S042").unwrap())));
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let table = synthetic_month();

    c.bench_function("normalize_to_series", |b| {
        b.iter_batched(
            || table.clone(),
            |t| {
                let compacted = compact(&normalize(t)).unwrap();
                let (entries, exits) = aggregate(&compacted).unwrap();
                black_box(merge(&entries, &exits, "S042").unwrap())
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_stages, bench_end_to_end);
criterion_main!(benches);
