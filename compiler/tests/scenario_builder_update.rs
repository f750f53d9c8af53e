// Concrete end-to-end scenario 4 (spec §8): updating a symbol through
// `provided_id` rebinds it in place rather than creating a duplicate.

use aiecad::builder::ProgramBuilder;
use aiecad::hlir::SymbolValue;
use aiecad::types::{DimExpr, ScalarKind, TensorType};

#[test]
fn provided_id_update_replaces_tensor_type_without_duplicating_the_binding() {
    let mut b = ProgramBuilder::new("p");
    let r1 = b.add_symbol(
        "chunk_ty",
        SymbolValue::TensorType(TensorType::new(vec![DimExpr::Literal(1024)], ScalarKind::Int32)),
        None,
        true,
        None,
    );
    let id = r1.id().unwrap();

    let r2 = b.add_symbol(
        "chunk_ty",
        SymbolValue::TensorType(TensorType::new(vec![DimExpr::Literal(2048)], ScalarKind::Int32)),
        None,
        true,
        Some(id),
    );
    assert!(r2.is_ok());
    assert_eq!(r2.id(), Some(id));

    let program = b.program();
    assert_eq!(program.symbols.len(), 1);
    match &program.symbols.get("chunk_ty").unwrap().value {
        SymbolValue::TensorType(t) => assert_eq!(t.dims, vec![DimExpr::Literal(2048)]),
        other => panic!("expected a tensor type symbol, got {other:?}"),
    }
}
