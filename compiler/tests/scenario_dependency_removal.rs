// Concrete end-to-end scenario 5 (spec §8): removing a type symbol
// still referenced by a FIFO is blocked and reports the dependent.

use std::collections::BTreeMap;

use aiecad::builder::ProgramBuilder;
use aiecad::builder_result::{BuilderResult, ErrorCode};
use aiecad::hlir::{SymbolValue, TileKind};
use aiecad::registry::Namespace;
use aiecad::types::{DimExpr, ScalarKind, TensorType, TypeRef};

#[test]
fn removing_a_type_used_by_a_fifo_is_blocked_with_the_dependent_named() {
    let mut b = ProgramBuilder::new("p");
    b.add_tile("shim0", TileKind::Shim, 0, 0, BTreeMap::new(), None);
    b.add_tile("compute0", TileKind::Compute, 0, 2, BTreeMap::new(), None);
    let chunk_ty = b
        .add_symbol(
            "chunk_ty",
            SymbolValue::TensorType(TensorType::new(vec![DimExpr::Literal(1024)], ScalarKind::Int32)),
            None,
            true,
            None,
        )
        .id()
        .unwrap();
    b.add_fifo(
        "f0",
        TypeRef::named("chunk_ty"),
        2,
        Some("shim0".into()),
        vec!["compute0".into()],
        BTreeMap::new(),
        None,
    );

    let removed = b.remove(Namespace::Symbol, "chunk_ty");
    match removed {
        BuilderResult::Err { code, dependencies, .. } => {
            assert_eq!(code, ErrorCode::DependencyExists);
            assert_eq!(dependencies, Some(vec!["FIFO 'f0'".to_string()]));
        }
        _ => panic!("expected removal to be blocked"),
    }
    assert!(b.program().symbols.contains("chunk_ty"));
    let _ = chunk_ty;
}
