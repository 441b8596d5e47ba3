//! Classify -> route -> solve pipeline benchmarks

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

use symb_solve::classify::{LinearTextModel, UnifiedClassifier};
use symb_solve::config::{ClassifierConfig, SolveLimits};
use symb_solve::parse;
use symb_solve::router::route_query;

const QUERIES: &[(&str, &str)] = &[
    ("equation", "x**2 - 4 = 0"),
    ("equation", "x**3 - 6*x**2 + 11*x - 6 = 0"),
    ("system", "2*x + 3*y - 5, x - y - 1"),
    ("system", "x**2 + y**2 - 2, x - y"),
    ("convexity", "x**4 - 6*x**2"),
    ("convexity", "x**2 + x*y + y**2"),
    ("derivative", "diff(x**3 - 3*x, x)"),
    ("integral", "x**2*exp(x)"),
    ("integral", "1/(x**2 - 1)"),
];

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    group.bench_function("poly_x^3+2x^2+x", |b| b.iter(|| parse(black_box("x^3 + 2x^2 + x"))));
    group.bench_function("construct_diff", |b| {
        b.iter(|| parse(black_box("Derivative(sin(x)*exp(x), (x, 2))")))
    });
    group.bench_function("srepr", |b| {
        b.iter(|| parse(black_box("Add(Pow(Symbol('x'), Integer(2)), Integer(-4))")))
    });

    group.finish();
}

fn bench_classification(c: &mut Criterion) {
    let Ok(model) = LinearTextModel::bundled() else {
        return;
    };
    let classifier = UnifiedClassifier::new(Arc::new(model), ClassifierConfig::default());
    let mut group = c.benchmark_group("classification");

    group.bench_function("deterministic_system", |b| {
        b.iter(|| classifier.classify(black_box("x + y = 1, x - y = 3")))
    });
    group.bench_function("statistical_text", |b| {
        b.iter(|| classifier.classify(black_box("slope of the tangent line")))
    });

    group.finish();
}

fn bench_routing(c: &mut Criterion) {
    let limits = SolveLimits::default();
    let mut group = c.benchmark_group("routing");

    for (query_type, expr) in QUERIES {
        group.bench_function(format!("{}_{}", query_type, expr), |b| {
            b.iter(|| route_query(black_box(query_type), black_box(expr), &limits))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parsing, bench_classification, bench_routing);
criterion_main!(benches);
