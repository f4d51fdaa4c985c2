//! Benchmark for combinator pipelines against hand-rolled loops.
//!
//! Run with: cargo bench --package drift-core --bench pipeline_benchmark

use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;

use drift_core::SystemArena;
use drift_core::sequences::average::average;
use drift_core::sequences::buffer::SliceSequence;
use drift_core::sequences::map::Map;
use drift_core::sequences::sequence::Sequence;
use drift_core::sequences::set_operation::intersect_slices;

const ELEMENTS: usize = 10_000;

fn bench_map_average(c: &mut Criterion) {
    let data: Vec<i64> = (0..ELEMENTS as i64).collect();

    c.bench_function("map_average_pipeline", |b| {
        b.iter(|| {
            let seq = SliceSequence::from_slice(black_box(&data));
            let squared = Map::new(seq, |input: &i64, output: &mut i64| *output = input * input);
            black_box(average(&squared))
        })
    });

    c.bench_function("map_average_loop_baseline", |b| {
        b.iter(|| {
            let data = black_box(&data);
            let mut sum = 0.0;
            for value in data {
                sum += (value * value) as f64;
            }
            black_box(if data.is_empty() { None } else { Some(sum / data.len() as f64) })
        })
    });
}

fn bench_intersect(c: &mut Criterion) {
    let first: Vec<i64> = (0..ELEMENTS as i64).collect();
    let second: Vec<i64> = (0..ELEMENTS as i64).map(|i| i * 2).collect();

    c.bench_function("intersect_10k", |b| {
        b.iter(|| {
            let result = intersect_slices(
                black_box(&first),
                black_box(&second),
                |a: &i64, b: &i64| a.cmp(b),
                SystemArena,
            );
            black_box(result.count())
        })
    });
}

criterion_group!(benches, bench_map_average, bench_intersect);
criterion_main!(benches);
