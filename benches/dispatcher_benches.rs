use RustedFormula::formula::dispatcher::{ComputeMode, ComputeRequest, compute};
use RustedFormula::formula::substitution::resolve;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_simplify(c: &mut Criterion) {
    let request = ComputeRequest::new(
        "\\frac{x^{2} - 1}{x - 1} + \\sin^{2}{x} + \\cos^{2}{x}",
        ComputeMode::Simplify,
    );
    c.bench_function("simplify quotient and identity", |b| {
        b.iter(|| compute(black_box(&request)))
    });
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");
    for (name, text) in [
        ("quadratic", "x^2 - 5 x + 6 = 0"),
        ("cubic", "x^3 - 6 x^2 + 11 x - 6 = 0"),
        ("quintic", "x^5 + x - 3 = 0"),
    ] {
        let request = ComputeRequest::new(text, ComputeMode::Solve).with_variable("x");
        group.bench_function(name, |b| b.iter(|| compute(black_box(&request))));
    }
    group.finish();
}

fn bench_calculus(c: &mut Criterion) {
    let derivative =
        ComputeRequest::new("x^{3} \\sin{x} e^{2 x}", ComputeMode::Differentiate).with_variable("x");
    let integral =
        ComputeRequest::new("x \\cos{x} + \\frac{1}{x}", ComputeMode::Integrate).with_variable("x");
    c.bench_function("differentiate product", |b| {
        b.iter(|| compute(black_box(&derivative)))
    });
    c.bench_function("integrate by parts", |b| {
        b.iter(|| compute(black_box(&integral)))
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let substitutions = resolve("x=2, y=3.5, \\alpha=0.25").unwrap_or_default();
    let request = ComputeRequest::new("\\sqrt{x^{2} + y^{2}} \\cos{\\alpha}", ComputeMode::Evaluate)
        .with_substitutions(substitutions);
    c.bench_function("evaluate with substitutions", |b| {
        b.iter(|| compute(black_box(&request)))
    });
}

criterion_group!(benches, bench_simplify, bench_solve, bench_calculus, bench_evaluate);
criterion_main!(benches);
