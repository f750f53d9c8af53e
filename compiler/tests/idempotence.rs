// Idempotence properties from spec §8: running the expander twice on
// the same input, or the generator twice on the same graph, produces
// byte-identical output.

use std::collections::BTreeMap;

use aiecad::builder::ProgramBuilder;
use aiecad::extension::{CodegenExtensionRegistry, ExtensionRegistry};
use aiecad::hlir::TileKind;
use aiecad::types::{DimExpr, ScalarKind, TensorType, TypeRef};

fn sample_program() -> aiecad::hlir::Program {
    let mut b = ProgramBuilder::new("p");
    b.add_tile("shim0", TileKind::Shim, 0, 0, BTreeMap::new(), None);
    b.add_tile("compute0", TileKind::Compute, 0, 2, BTreeMap::new(), None);
    b.add_symbol(
        "chunk_ty",
        aiecad::hlir::SymbolValue::TensorType(TensorType::new(vec![DimExpr::Symbolic("N".into())], ScalarKind::Int32)),
        None,
        true,
        None,
    );
    b.add_fifo(
        "of_in",
        TypeRef::Scalar(ScalarKind::Int32),
        2,
        Some("shim0".into()),
        vec!["compute0".into()],
        BTreeMap::new(),
        None,
    );
    b.add_core_function("fn0", vec!["of_in".into()], vec![], None, None);
    b.add_worker("w0", "fn0", vec![], "compute0", None);
    let rt = b.create_runtime("rt").add_worker("w0").build();
    rt.build().expect("sample program validates")
}

#[test]
fn expanding_the_same_program_twice_is_byte_identical() {
    let program = sample_program();
    let first = aiecad::expander::expand_to_string(&program);
    let second = aiecad::expander::expand_to_string(&program);
    assert_eq!(first, second);
}

#[test]
fn generating_the_same_graph_twice_is_byte_identical() {
    let program = sample_program();
    let complete_xml = aiecad::expander::expand_to_string(&program);
    let graph_exts = ExtensionRegistry::with_builtins();
    let graph = aiecad::graph::build_graph(&complete_xml, &graph_exts).expect("graph should build");

    let codegen_exts = CodegenExtensionRegistry::new();
    let (first, _) = aiecad::codegen::generate(&graph, &codegen_exts);
    let (second, _) = aiecad::codegen::generate(&graph, &codegen_exts);
    assert_eq!(first, second);
}

#[test]
fn graphml_rendering_of_the_same_graph_twice_is_byte_identical() {
    let program = sample_program();
    let complete_xml = aiecad::expander::expand_to_string(&program);
    let graph_exts = ExtensionRegistry::with_builtins();
    let graph = aiecad::graph::build_graph(&complete_xml, &graph_exts).expect("graph should build");

    let first = aiecad::graphml::render(&graph);
    let second = aiecad::graphml::render(&graph);
    assert_eq!(first, second);
}
