use std::fmt::Write;
use std::hint::black_box;

use alder_ast::FileId;
use alder_infer::{bind_program, collect_program, ScopeGraph, Unifier};
use alder_syntax::parse_program_source;
use divan::Bencher;

fn main() {
    divan::main();
}

/// A module of chained numeric bindings and function calls.
fn build_numeric_source(binding_count: usize) -> String {
    let mut source = String::from("module Bench.Numeric\n");
    source.push_str("const base = 1\n");
    source.push_str("const scale = (x: number): number => x * 2\n");
    for i in 0..binding_count {
        let prev = if i == 0 {
            "base".to_string()
        } else {
            format!("v{}", i - 1)
        };
        writeln!(&mut source, "const v{i} = scale({prev}) + {i}").expect("write to string");
    }
    source
}

/// A module exercising enums, matches, and records.
fn build_enum_source(clause_count: usize) -> String {
    let mut source = String::from("module Bench.Enums\n");
    source.push_str("enum Option<T> { Some(T), None, }\n");
    for i in 0..clause_count {
        writeln!(
            &mut source,
            "const opt{i} = Option.Some({i})\nconst got{i} = match opt{i} {{\n  Option.Some(x{i}) -> x{i}\n  Option.None -> 0\n}}"
        )
        .expect("write to string");
    }
    source
}

fn analyze(source: &str) {
    let mut program =
        parse_program_source(source, FileId(0)).expect("benchmark source parses");
    let mut graph = ScopeGraph::new();
    bind_program(&mut graph, &mut program).expect("benchmark source binds");
    let constraints = collect_program(&mut graph, &program).expect("benchmark source collects");
    let mut unifier = Unifier::new(&mut graph);
    unifier.solve(constraints).expect("benchmark source solves");
    black_box(graph.len());
}

#[divan::bench(args = [32, 128, 512])]
fn parse_numeric_module(bencher: Bencher, binding_count: usize) {
    let source = build_numeric_source(binding_count);
    bencher.bench(|| {
        let program = parse_program_source(black_box(&source), FileId(0))
            .expect("benchmark source parses");
        black_box(program.body.len())
    });
}

#[divan::bench(args = [32, 128, 512])]
fn analyze_numeric_module(bencher: Bencher, binding_count: usize) {
    let source = build_numeric_source(binding_count);
    bencher.bench(|| analyze(black_box(&source)));
}

#[divan::bench(args = [8, 32, 128])]
fn analyze_enum_matches(bencher: Bencher, clause_count: usize) {
    let source = build_enum_source(clause_count);
    bencher.bench(|| analyze(black_box(&source)));
}
