use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use orbc::ast::CompilationUnit;
use orbc::context::Context;
use orbc::decl::{DeclTable, UnitInput};
use orbc::diag::DiagnosticBuffer;
use orbc::filer::MemoryFiler;
use orbc::pass::PassId;
use orbc::pipeline::process_round;
use orbc::render::default_renderer;
use orbc::source::FileId;
use orbc::{parser, prelude};

// Sample declaration sources of varying complexity
const SIMPLE: &str = r#"
package com.example;

interface Hello extends Actor {
    Task<String> sayHello(String greeting);
}
"#;

const INHERITANCE: &str = r#"
package com.example.shop;

interface Named { Task<String> name(); }

interface Priced {
    Task<Double> price(String currency);
    Task<Void> reprice(String currency, double amount);
}

/** A catalog entry. */
interface Product extends Actor, Named, Priced {
    Task<Integer> stock();
    @OneWay Task<Void> restock(int count);
}

@StatelessWorker
interface Catalog extends Actor {
    Task<String[]> search(String query, int limit);
    Task<Product> find(String sku);
}

interface CatalogListener extends ActorObserver {
    Task<Void> added(String sku);
    Task<Void> removed(String sku);
}

abstract class BaseProduct implements Product;
class ProductActor extends BaseProduct;
"#;

const OVERLOADS: &str = r#"
package com.example.chat;

interface IRoom extends Actor {
    Task<Void> say(String text);
    Task<Void> say(String text, int priority);
    Task<Void> say(String text, int priority, boolean pinned);
    Task<String[]> history();
    Task<String[]> history(int last);
    @OneWay Task leave();

    interface IModerator extends Actor {
        Task<Boolean> mute(String member, long seconds);
    }
}
"#;

fn scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("simple", SIMPLE),
        ("inheritance", INHERITANCE),
        ("overloads", OVERLOADS),
    ]
}

/// Scaling generator: `n` actor interfaces, each extending the previous one.
fn generate_scaling_source(n_interfaces: usize) -> String {
    let mut src = String::from("package scale;\n\n");
    for i in 0..n_interfaces {
        let parent = if i == 0 {
            "Actor".to_string()
        } else {
            format!("I{}", i - 1)
        };
        src.push_str(&format!("interface I{} extends {} {{\n", i, parent));
        src.push_str(&format!("    Task<String> get{}(String key, int version);\n", i));
        src.push_str(&format!("    @OneWay Task<Void> put{}(String key, String value);\n", i));
        src.push_str("}\n\n");
    }
    src
}

fn parse_with_prelude(source: &str) -> Vec<(FileId, CompilationUnit)> {
    let mut units: Vec<(FileId, CompilationUnit)> = prelude::sources()
        .iter()
        .enumerate()
        .map(|(i, (_, text))| {
            let unit = parser::parse(text).unit.expect("prelude must parse");
            (FileId(i as u32), unit)
        })
        .collect();
    let unit = parser::parse(source)
        .unit
        .expect("benchmark scenario must parse");
    units.push((FileId(units.len() as u32), unit));
    units
}

/// Declaration table, passes, rendering and manifests for one round.
fn run_round(units: &[(FileId, CompilationUnit)], terminal: PassId) {
    let last = units.len() - 1;
    let inputs: Vec<UnitInput<'_>> = units
        .iter()
        .enumerate()
        .map(|(i, (file, unit))| UnitInput {
            unit,
            file: *file,
            package_hint: None,
            is_root: i == last,
        })
        .collect();
    let diags = DiagnosticBuffer::new();
    let table = DeclTable::build(&inputs, &diags);
    let filer = MemoryFiler::new();
    let ctx = Context::new(&table, &filer, &diags);
    let out = process_round(&ctx, &default_renderer(), terminal);
    assert!(!diags.has_errors());
    black_box(out);
}

// KPI: parser latency for representative scenarios.
fn bench_kpi_parse_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("kpi/parse_latency");

    for (name, source) in scenarios() {
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| {
                let result = parser::parse(black_box(source));
                black_box(&result.unit);
            });
        });
    }

    group.finish();
}

// KPI: full round latency (decl table -> walk -> ... -> render -> register).
fn bench_kpi_full_round_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("kpi/full_round_latency");

    for (name, source) in scenarios() {
        let units = parse_with_prelude(source);
        group.bench_with_input(BenchmarkId::from_parameter(name), &units, |b, units| {
            b.iter(|| run_round(black_box(units), PassId::Register));
        });
    }

    group.finish();
}

// KPI: plan-only latency versus full generation on a non-trivial source.
fn bench_kpi_terminal_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("kpi/terminal_latency");
    let units = parse_with_prelude(INHERITANCE);

    for (name, terminal) in [
        ("walk", PassId::Walk),
        ("assign_ids", PassId::AssignIds),
        ("plan", PassId::Plan),
        ("register", PassId::Register),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &terminal, |b, &terminal| {
            b.iter(|| run_round(&units, terminal));
        });
    }

    group.finish();
}

// KPI: compile scalability over interface count.
fn bench_kpi_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("kpi/scaling");

    for n in [1usize, 10, 50, 100] {
        let source = generate_scaling_source(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &source, |b, source| {
            b.iter_batched(
                || parse_with_prelude(source),
                |units| run_round(&units, PassId::Register),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_kpi_parse_latency,
    bench_kpi_full_round_latency,
    bench_kpi_terminal_latency,
    bench_kpi_scaling
);
criterion_main!(benches);
