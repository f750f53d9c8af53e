// codegen.rs — Python host-code generator (spec §4.7)
//
// Walks the semantic graph built by `graph.rs` and emits the Python
// source a user would hand to the IRON/NPU JIT runtime: one `import`
// preamble, one statement per dataflow construction call, and the
// `iron.jit`-decorated entry function with its `if __name__ ==
// "__main__"` trailer.
//
// Grounded on the teacher's `dot.rs` string-builder technique (now
// `dot_legacy.rs`): accumulate lines in a buffer with an explicit
// indent counter rather than building an AST and pretty-printing it.
//
// Preconditions: `graph` was produced by `graph::build_graph` (or is
//   otherwise well-formed: a `Module` root, `Contains` edges forming a
//   tree).
// Postconditions: output is valid Python 4-space-indented source.
// Failure modes: a node kind with no native handler and no registered
//   `CodegenExtension` is skipped with a `CG001` diagnostic rather than
//   aborting generation.
// Side effects: none (callers write the returned string to disk).

use crate::diag::{codes, DiagLevel, Diagnostic};
use crate::extension::CodegenExtensionRegistry;
use crate::graph::{EdgeKind, NodeId, NodeKind, SemanticGraph};

/// Accumulates generated Python source, one logical line at a time.
pub struct Emitter {
    lines: Vec<String>,
    indent: usize,
    pub dataflow_generated: bool,
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            indent: 0,
            dataflow_generated: false,
        }
    }

    pub fn line(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{}", "    ".repeat(self.indent), text));
        }
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate the full Python module for `graph`.
pub fn generate(graph: &SemanticGraph, extensions: &CodegenExtensionRegistry) -> (String, Vec<Diagnostic>) {
    let mut out = Emitter::new();
    let mut diags = Vec::new();

    out.line("# Generated by aiecad. Do not edit by hand.");
    out.line("import numpy as np");
    out.line("from aie.iron import ObjectFifo, Program, Runtime, Worker");
    out.line("from aie.iron.placers import SequentialPlacer");
    if needs_controlflow_import(graph) {
        out.line("from aie.iron.controlflow import range_");
    }
    out.line("");

    let Some(module) = graph.nodes.first() else {
        return (out.render(), diags);
    };

    for child in children_of(graph, module.id) {
        let node = &graph.nodes[child.0];
        match node.kind {
            NodeKind::Section if node.label == "Symbols" => emit_symbols(graph, &mut out, child),
            NodeKind::Section if node.label == "DataFlow" => {
                emit_dataflow(graph, &mut out, child, extensions, &mut diags);
                out.dataflow_generated = true;
            }
            NodeKind::Function => emit_function(graph, &mut out, child),
            NodeKind::EntryPoint => {
                out.line("if __name__ == \"__main__\":");
                out.indent();
                out.line("main()");
                out.dedent();
            }
            other => {
                if let Some(ext) = extensions.get(other) {
                    ext.emit(graph, child, &mut out);
                } else {
                    diags.push(
                        Diagnostic::new(DiagLevel::Warn, format!("no codegen handler for node kind {other}"))
                            .with_code(codes::CG001)
                            .with_field("node", node.label.clone()),
                    );
                }
            }
        }
    }

    (out.render(), diags)
}

/// Whether any `CoreFunction` in the graph carries a `loop_count`
/// attribute, meaning the generated body wraps its kernel call in a
/// `for ... in range_(...)` loop that needs the controlflow import.
fn needs_controlflow_import(graph: &SemanticGraph) -> bool {
    graph
        .nodes
        .iter()
        .any(|n| n.kind == NodeKind::CoreFunction && n.attrs.iter().any(|(k, _)| k == "loop_count"))
}

fn children_of(graph: &SemanticGraph, parent: NodeId) -> Vec<NodeId> {
    graph
        .edges
        .iter()
        .filter(|e| e.from == parent && e.kind == EdgeKind::Contains)
        .map(|e| e.to)
        .collect()
}

fn emit_symbols(graph: &SemanticGraph, out: &mut Emitter, section: NodeId) {
    for child in children_of(graph, section) {
        let node = &graph.nodes[child.0];
        match node.kind {
            NodeKind::Const => out.line(format!("{} = {}", node.label, const_value(node))),
            NodeKind::TypeAbstraction => out.line(format!("# type abstraction: {}", node.label)),
            _ => {}
        }
    }
}

fn const_value(node: &crate::graph::Node) -> String {
    node.attrs
        .iter()
        .find(|(k, _)| k == "value")
        .map(|(_, v)| v.clone())
        .unwrap_or_else(|| "None".to_string())
}

fn emit_dataflow(
    graph: &SemanticGraph,
    out: &mut Emitter,
    section: NodeId,
    extensions: &CodegenExtensionRegistry,
    diags: &mut Vec<Diagnostic>,
) {
    for child in children_of(graph, section) {
        let node = &graph.nodes[child.0];
        match node.kind {
            NodeKind::ExternalFunction => {
                out.line(format!(
                    "{} = ExternalFunction(\"{}\", source_file=\"kernel.o\")",
                    node.label, node.label
                ));
            }
            NodeKind::CoreFunction => {
                out.line(format!("def {}(*args):", node.label));
                out.indent();
                out.line("...");
                out.dedent();
            }
            NodeKind::ObjectFifo => {
                out.line(format!("{} = ObjectFifo(depth=2)", node.label));
            }
            NodeKind::Worker => {
                let core_fn = graph
                    .edges
                    .iter()
                    .find(|e| e.from == child && e.kind == EdgeKind::CoreFn)
                    .map(|e| graph.nodes[e.to.0].label.clone())
                    .unwrap_or_else(|| "None".to_string());
                out.line(format!("{} = Worker({})", node.label, core_fn));
            }
            NodeKind::Runtime => {
                out.line(format!("{} = Runtime()", node.label));
                for op in children_of(graph, child) {
                    let block = &graph.nodes[op.0];
                    if block.kind == NodeKind::SequenceBlock {
                        out.line("with rt.sequence() as seq:");
                        out.indent();
                        for target in graph.edges.iter().filter(|e| e.from == op && e.kind == EdgeKind::Target) {
                            out.line(format!("seq.start({})", graph.nodes[target.to.0].label));
                        }
                        for stmt in children_of(graph, op) {
                            let stmt_node = &graph.nodes[stmt.0];
                            if stmt_node.kind == NodeKind::Operation {
                                out.line(format!("seq.{}(...)", stmt_node.label.to_ascii_lowercase()));
                            }
                        }
                        out.dedent();
                    }
                }
            }
            NodeKind::Program => {
                out.line(format!("{} = Program(rt)", node.label));
            }
            other => {
                if let Some(ext) = extensions.get(other) {
                    ext.emit(graph, child, out);
                } else if !matches!(other, NodeKind::Placer) {
                    diags.push(
                        Diagnostic::new(DiagLevel::Warn, format!("no codegen handler for node kind {other}"))
                            .with_code(codes::CG001)
                            .with_field("node", node.label.clone()),
                    );
                }
            }
        }
    }
}

fn emit_function(graph: &SemanticGraph, out: &mut Emitter, func: NodeId) {
    let node = &graph.nodes[func.0];
    out.line("@iron.jit");
    let params: Vec<String> = graph
        .edges
        .iter()
        .filter(|e| e.from == func && e.kind == EdgeKind::HasParam)
        .map(|e| graph.nodes[e.to.0].label.clone())
        .collect();
    out.line(format!("def {}({}):", node.label, params.join(", ")));
    out.indent();
    let mut emitted_body = false;
    for stmt in children_of(graph, func) {
        let stmt_node = &graph.nodes[stmt.0];
        emitted_body = true;
        match stmt_node.kind {
            NodeKind::UseType => out.line("# use_type"),
            NodeKind::UseDataFlow => out.line("# use_dataflow"),
            NodeKind::Return => out.line(format!("return {}", stmt_node.label)),
            NodeKind::Assign => out.line(format!("{} = ...", stmt_node.label)),
            _ => {}
        }
    }
    if !emitted_body {
        out.line("pass");
    }
    out.dedent();
    out.line("");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ProgramBuilder;
    use crate::extension::ExtensionRegistry;
    use crate::hlir::TileKind;
    use crate::types::{ScalarKind, TypeRef};
    use std::collections::BTreeMap;

    fn sample_xml() -> String {
        let mut b = ProgramBuilder::new("passthrough");
        b.add_tile("shim0", TileKind::Shim, 0, 0, BTreeMap::new(), None);
        b.add_tile("compute0", TileKind::Compute, 0, 2, BTreeMap::new(), None);
        b.add_fifo(
            "of_in",
            TypeRef::Scalar(ScalarKind::Int32),
            2,
            Some("shim0".into()),
            vec!["compute0".into()],
            BTreeMap::new(),
            None,
        );
        b.add_core_function("fn0", vec!["fifo_a".into()], vec![], None, None);
        b.add_worker("w0", "fn0", vec![], "compute0", None);
        let program = b.build().expect("valid");
        crate::gui_xml::serialize(&program).render()
    }

    #[test]
    fn generates_importable_python_preamble() {
        let xml = sample_xml();
        let graph_exts = ExtensionRegistry::with_builtins();
        let graph = crate::graph::build_graph(&xml, &graph_exts).unwrap();
        let (py, diags) = generate(&graph, &CodegenExtensionRegistry::new());
        assert!(py.starts_with("# Generated by aiecad"));
        assert!(py.contains("import numpy as np"));
        assert!(diags.is_empty() || diags.iter().all(|d| d.level != DiagLevel::Error));
    }

    #[test]
    fn controlflow_import_is_omitted_without_a_looped_core_function() {
        let xml = sample_xml();
        let graph_exts = ExtensionRegistry::with_builtins();
        let graph = crate::graph::build_graph(&xml, &graph_exts).unwrap();
        let (py, _) = generate(&graph, &CodegenExtensionRegistry::new());
        assert!(!py.contains("controlflow import range_"));
    }

    #[test]
    fn controlflow_import_is_emitted_for_a_looped_core_function() {
        let mut b = ProgramBuilder::new("passthrough");
        b.add_tile("shim0", TileKind::Shim, 0, 0, BTreeMap::new(), None);
        b.add_tile("compute0", TileKind::Compute, 0, 2, BTreeMap::new(), None);
        b.add_fifo(
            "of_in",
            TypeRef::Scalar(ScalarKind::Int32),
            2,
            Some("shim0".into()),
            vec!["compute0".into()],
            BTreeMap::new(),
            None,
        );
        b.add_core_function("fn0", vec!["fifo_a".into()], vec![], Some("4".into()), None);
        b.add_worker("w0", "fn0", vec![], "compute0", None);
        let program = b.build().expect("valid");
        let xml = crate::gui_xml::serialize(&program).render();
        let graph_exts = ExtensionRegistry::with_builtins();
        let graph = crate::graph::build_graph(&xml, &graph_exts).unwrap();
        let (py, _) = generate(&graph, &CodegenExtensionRegistry::new());
        assert!(py.contains("from aie.iron.controlflow import range_"));
    }

    #[test]
    fn emits_worker_and_fifo_construction() {
        let xml = sample_xml();
        let graph_exts = ExtensionRegistry::with_builtins();
        let graph = crate::graph::build_graph(&xml, &graph_exts).unwrap();
        let (py, _) = generate(&graph, &CodegenExtensionRegistry::new());
        assert!(py.contains("w0 = Worker(fn0)"));
        assert!(py.contains("of_in = ObjectFifo(depth=2)"));
    }
}
