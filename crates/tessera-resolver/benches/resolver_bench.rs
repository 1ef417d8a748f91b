//! Resolver and configurator benchmarks.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tessera_core::ModuleIdQuery;
use tessera_resolver::{configure, configure_paths, resolve};
use tessera_test_utils::fixtures::Fixtures;

fn layer_roots(width: usize) -> Vec<ModuleIdQuery> {
    (0..width)
        .map(|slot| ModuleIdQuery::parse(&format!("m0x{slot}")).unwrap())
        .collect()
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    let diamond = Fixtures::diamond();
    let diamond_roots = vec![ModuleIdQuery::parse("x@1").unwrap()];
    group.bench_function("diamond", |b| {
        b.iter(|| resolve(&diamond, &diamond_roots).unwrap());
    });

    for (width, depth) in [(2, 3), (4, 4), (6, 5)] {
        let catalog = Fixtures::layered(width, depth);
        let roots = layer_roots(width);
        group.bench_with_input(
            BenchmarkId::new("layered", format!("{width}x{depth}")),
            &(catalog, roots),
            |b, (catalog, roots)| {
                b.iter(|| resolve(catalog, roots).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_configure(c: &mut Criterion) {
    let mut group = c.benchmark_group("configure");

    let catalog = Fixtures::layered(4, 4);
    let roots = layer_roots(4);
    let resolution = resolve(&catalog, &roots).unwrap();

    group.bench_function("classes", |b| {
        b.iter(|| configure(&resolution).unwrap());
    });
    group.bench_function("paths", |b| {
        b.iter(|| configure_paths(&resolution).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_configure);
criterion_main!(benches);
