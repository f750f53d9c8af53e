// compiler_bench.rs — Pipeline stage benchmarks
//
// Measures the four pipeline stages (expand, build graph, GraphML
// render, codegen) independently on a fixed sample program, so a
// regression in one stage doesn't hide behind the others' cost.

use criterion::{criterion_group, criterion_main, Criterion};

use aiecad::extension::{CodegenExtensionRegistry, ExtensionRegistry};
use aiecad::pipeline::example_passthrough_program;

fn bench_expand(c: &mut Criterion) {
    let program = example_passthrough_program();
    c.bench_function("expand_to_complete_xml", |b| {
        b.iter(|| aiecad::expander::expand_to_string(&program));
    });
}

fn bench_build_graph(c: &mut Criterion) {
    let program = example_passthrough_program();
    let xml = aiecad::expander::expand_to_string(&program);
    let extensions = ExtensionRegistry::with_builtins();
    c.bench_function("build_semantic_graph", |b| {
        b.iter(|| aiecad::graph::build_graph(&xml, &extensions).unwrap());
    });
}

fn bench_codegen(c: &mut Criterion) {
    let program = example_passthrough_program();
    let xml = aiecad::expander::expand_to_string(&program);
    let extensions = ExtensionRegistry::with_builtins();
    let graph = aiecad::graph::build_graph(&xml, &extensions).unwrap();
    let codegen_extensions = CodegenExtensionRegistry::new();
    c.bench_function("generate_python", |b| {
        b.iter(|| aiecad::codegen::generate(&graph, &codegen_extensions));
    });
}

criterion_group!(benches, bench_expand, bench_build_graph, bench_codegen);
criterion_main!(benches);
