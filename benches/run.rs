use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dfa_trace::prelude::*;

fn identifier() -> DFA {
    parse_definition(include_str!("../demos/identifier.txt"))
        .expect("demo definition is well-formed")
        .validate()
        .expect("demo definition is valid")
}

fn validate_string(c: &mut Criterion) {
    let dfa = identifier();
    let input = "some_rather_long_identifier_0123456789".repeat(32);
    c.bench_function("validate_string", |b| {
        b.iter(|| dfa.validate_string(black_box(&input)).unwrap())
    });
}

fn edge_groups(c: &mut Criterion) {
    let dfa = identifier();
    c.bench_function("edge_groups", |b| b.iter(|| black_box(&dfa).edge_groups()));
}

criterion_group!(benches, validate_string, edge_groups);
criterion_main!(benches);
