//! Criterion benchmarks for key derivation: normalization and fingerprinting.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use memora_core::Arg;
use memora_keys::{derive_key, normalize};

fn nested_payload() -> Arg {
    Arg::map((0..32).map(|i| {
        (
            format!("field_{i}"),
            Arg::list([
                Arg::map([("z", i), ("a", i * 2)]),
                Arg::from(format!("value-{i}")),
            ]),
        )
    }))
}

fn bench_normalize(c: &mut Criterion) {
    let payload = nested_payload();
    let mut g = c.benchmark_group("normalize");
    g.throughput(Throughput::Elements(1));
    g.bench_function("nested_map_32", |b| {
        b.iter(|| black_box(normalize(&payload)));
    });
    g.finish();
}

fn bench_derive_key(c: &mut Criterion) {
    let scalars = [Arg::Int(1), Arg::Int(2)];
    let nested = [nested_payload()];
    let kwargs = vec![("flag".to_string(), Arg::from("on"))];

    let mut g = c.benchmark_group("derive_key");
    g.throughput(Throughput::Elements(1));
    g.bench_function("two_ints", |b| {
        b.iter(|| black_box(derive_key(&scalars, &[])));
    });
    g.bench_function("nested_with_kwargs", |b| {
        b.iter(|| black_box(derive_key(&nested, &kwargs)));
    });
    g.finish();
}

criterion_group!(benches, bench_normalize, bench_derive_key);
criterion_main!(benches);
