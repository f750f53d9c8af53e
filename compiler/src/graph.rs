// graph.rs — Semantic graph builder (spec §3.4, §4.6)
//
// Consumes Complete XML and produces a directed labeled graph: nodes
// carry `(id, kind, label, attrs)`, edges carry a closed, semantic
// (not structural) label. The builder's outer loop dispatches by tag,
// falling through to a registered `extension::GraphExtension` for tags
// it doesn't recognize natively (spec §4.6).
//
// Grounded on the teacher's `graph.rs` in one respect only: deterministic,
// insertion-ordered emission (sorted only where the teacher's `dot.rs`
// sorts for rendering) so two runs over the same input produce byte-
// identical GraphML (see `graphml.rs`).
//
// Preconditions: `xml` is well-formed Complete XML (spec §6.4).
// Postconditions: every node reachable from the root is linked by at
//   least one edge (except the root itself).
// Failure modes: malformed/unresolvable input yields `Diagnostic`s with
//   `GB001`/`GB002`/`XML00x` codes; the builder never panics on
//   attacker-controlled XML content.
// Side effects: none.

use std::collections::HashMap;
use std::fmt;

use roxmltree::Document;

use crate::diag::{codes, DiagLevel, Diagnostic};
use crate::extension::ExtensionRegistry;
use crate::xml_tree::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// The closed set of node kinds spec §3.4 enumerates (around 40
/// discriminants across structural, dataflow, and expression nodes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Module,
    Section,
    Function,
    ObjectFifo,
    Call,
    MethodCall,
    MethodChain,
    BinaryOp,
    ComparisonOp,
    UnaryOp,
    IndexExpr,
    For,
    If,
    Print,
    Assign,
    Const,
    VarRef,
    Variable,
    Binding,
    TypeAbstraction,
    TensorTiler2D,
    Operation,
    SequenceBlock,
    ExternalFunction,
    CoreFunction,
    Worker,
    List,
    Runtime,
    Program,
    Placer,
    ResolveProgram,
    EntryPoint,
    Constructor,
    StringLiteral,
    NumpyDtype,
    UseType,
    UseDataFlow,
    Return,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        use NodeKind::*;
        match self {
            Module => "Module",
            Section => "Section",
            Function => "Function",
            ObjectFifo => "ObjectFifo",
            Call => "Call",
            MethodCall => "MethodCall",
            MethodChain => "MethodChain",
            BinaryOp => "BinaryOp",
            ComparisonOp => "ComparisonOp",
            UnaryOp => "UnaryOp",
            IndexExpr => "IndexExpr",
            For => "For",
            If => "If",
            Print => "Print",
            Assign => "Assign",
            Const => "Const",
            VarRef => "VarRef",
            Variable => "Variable",
            Binding => "Binding",
            TypeAbstraction => "TypeAbstraction",
            TensorTiler2D => "TensorTiler2D",
            Operation => "Operation",
            SequenceBlock => "SequenceBlock",
            ExternalFunction => "ExternalFunction",
            CoreFunction => "CoreFunction",
            Worker => "Worker",
            List => "List",
            Runtime => "Runtime",
            Program => "Program",
            Placer => "Placer",
            ResolveProgram => "ResolveProgram",
            EntryPoint => "EntryPoint",
            Constructor => "Constructor",
            StringLiteral => "StringLiteral",
            NumpyDtype => "NumpyDtype",
            UseType => "UseType",
            UseDataFlow => "UseDataFlow",
            Return => "Return",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The closed edge-label set spec §3.4 enumerates. Edge type is
/// semantic, never structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Contains,
    Calls,
    DependsOn,
    Uses,
    UsesType,
    Source,
    Condition,
    Then,
    Else,
    Base,
    Index,
    Operand,
    Lhs,
    Rhs,
    HasArg,
    HasKwarg,
    HasParam,
    HasCall,
    PlacedBy,
    Target,
    CoreFn,
    Iterates,
    Binds,
    NestedCall,
    SourceExpr,
    Assigns,
    RefersTo,
    Defines,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        use EdgeKind::*;
        match self {
            Contains => "contains",
            Calls => "calls",
            DependsOn => "depends_on",
            Uses => "uses",
            UsesType => "uses_type",
            Source => "source",
            Condition => "condition",
            Then => "then",
            Else => "else",
            Base => "base",
            Index => "index",
            Operand => "operand",
            Lhs => "lhs",
            Rhs => "rhs",
            HasArg => "has_arg",
            HasKwarg => "has_kwarg",
            HasParam => "has_param",
            HasCall => "has_call",
            PlacedBy => "placed_by",
            Target => "target",
            CoreFn => "core_fn",
            Iterates => "iterates",
            Binds => "binds",
            NestedCall => "nested_call",
            SourceExpr => "source_expr",
            Assigns => "assigns",
            RefersTo => "refers_to",
            Defines => "defines",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

/// A typed directed graph plus the helper vocabulary spec §4.6 names
/// (`_add_node`, `_link`, `_lookup`, `_declare_symbol`) so extensions
/// can participate without reimplementing bookkeeping.
#[derive(Debug, Default)]
pub struct SemanticGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    scopes: Vec<HashMap<String, NodeId>>,
}

impl SemanticGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            scopes: vec![HashMap::new()],
        }
    }

    pub fn add_node(&mut self, kind: NodeKind, label: impl Into<String>, attrs: Vec<(String, String)>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            kind,
            label: label.into(),
            attrs,
        });
        id
    }

    pub fn link(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) {
        self.edges.push(Edge { from, to, kind });
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
        if self.scopes.is_empty() {
            self.scopes.push(HashMap::new());
        }
    }

    /// Declare `name` in the innermost scope, unless it already exists
    /// there (duplicate-within-frame is a no-op) or in an outer frame
    /// (in which case this declaration shadows it locally).
    pub fn declare(&mut self, name: &str, node: NodeId) {
        let top = self.scopes.len() - 1;
        if self.scopes[top].contains_key(name) {
            return;
        }
        self.scopes[top].insert(name.to_string(), node);
    }

    /// Search inner-to-outer. Returns `None` if not found anywhere.
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    /// `lookup`, but creates a `VarRef` placeholder node (and declares it
    /// in the current scope) if the name is unresolved — used while
    /// building expression trees, where an unresolved name must still
    /// yield a usable node id rather than aborting the walk.
    pub fn lookup_or_placeholder(&mut self, name: &str) -> NodeId {
        if let Some(id) = self.lookup(name) {
            return id;
        }
        let id = self.add_node(NodeKind::VarRef, name, Vec::new());
        self.declare(name, id);
        id
    }

    /// Every `contains` edge added since `mark` — used by `If` handling
    /// to relabel a branch's edges into `then`/`else` after the fact
    /// (spec §4.6).
    pub fn contains_edges_since(&self, mark: usize) -> Vec<usize> {
        self.edges[mark..]
            .iter()
            .enumerate()
            .filter(|(_, e)| e.kind == EdgeKind::Contains)
            .map(|(i, _)| mark + i)
            .collect()
    }

    pub fn relabel(&mut self, edge_index: usize, kind: EdgeKind) {
        self.edges[edge_index].kind = kind;
    }
}

/// Build the semantic graph from a Complete XML document.
pub fn build_graph(xml: &str, extensions: &ExtensionRegistry) -> Result<SemanticGraph, Vec<Diagnostic>> {
    let doc = Document::parse(xml).map_err(|e| {
        vec![Diagnostic::new(DiagLevel::Error, format!("XML parse error: {e}")).with_code(codes::XML004)]
    })?;
    let root_el = doc.root_element();
    if root_el.tag_name().name() != "Module" {
        return Err(vec![Diagnostic::new(
            DiagLevel::Error,
            format!("expected root element <Module>, found <{}>", root_el.tag_name().name()),
        )
        .with_code(codes::GB002)]);
    }

    let mut graph = SemanticGraph::new();
    let module = graph.add_node(
        NodeKind::Module,
        root_el.attribute("name").unwrap_or("module"),
        Vec::new(),
    );
    let mut diags = Vec::new();

    for child in root_el.children().filter(|n| n.is_element()) {
        let tag = child.tag_name().name();
        match tag {
            "Symbols" => process_symbols(&mut graph, &child, module),
            "DataFlow" => process_dataflow(&mut graph, &child, module, &mut diags),
            "Function" => process_function(&mut graph, &child, module),
            "EntryPoint" => {
                let node = graph.add_node(NodeKind::EntryPoint, "entry_point", Vec::new());
                graph.link(module, node, EdgeKind::Contains);
            }
            other => {
                let elem = roxml_to_tree(&child);
                if let Some(ext) = extensions.get(other) {
                    ext.process(&mut graph, &elem, module);
                } else {
                    diags.push(
                        Diagnostic::new(DiagLevel::Warn, format!("no handler for tag {other}"))
                            .with_code(codes::XML001)
                            .with_field("tag", other.to_string()),
                    );
                }
            }
        }
    }

    if diags.iter().any(|d| d.level == DiagLevel::Error) {
        Err(diags)
    } else {
        Ok(graph)
    }
}

fn process_symbols(graph: &mut SemanticGraph, el: &roxmltree::Node, parent: NodeId) {
    let section = graph.add_node(NodeKind::Section, "Symbols", Vec::new());
    graph.link(parent, section, EdgeKind::Contains);
    for child in el.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "TypeAbstraction" => {
                let name = child.attribute("name").unwrap_or("type").to_string();
                let node = graph.add_node(NodeKind::TypeAbstraction, name.clone(), Vec::new());
                graph.link(section, node, EdgeKind::Contains);
                graph.declare(&name, node);
            }
            "Const" => {
                let name = child.attribute("name").unwrap_or("const").to_string();
                let node = graph.add_node(NodeKind::Const, name.clone(), Vec::new());
                graph.link(section, node, EdgeKind::Contains);
                graph.declare(&name, node);
            }
            _ => {}
        }
    }
}

fn process_dataflow(graph: &mut SemanticGraph, el: &roxmltree::Node, parent: NodeId, diags: &mut Vec<Diagnostic>) {
    let section = graph.add_node(NodeKind::Section, "DataFlow", Vec::new());
    graph.link(parent, section, EdgeKind::Contains);

    for child in el.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "Tiles" => {}
            "ExternalFunction" => {
                let name = child.attribute("name").unwrap_or("kernel").to_string();
                let node = graph.add_node(NodeKind::ExternalFunction, name.clone(), Vec::new());
                graph.link(section, node, EdgeKind::Contains);
                graph.declare(&name, node);
            }
            "CoreFunction" => {
                let name = child.attribute("name").unwrap_or("core_fn").to_string();
                let attrs = match child.attribute("loop_count") {
                    Some(lc) => vec![("loop_count".to_string(), lc.to_string())],
                    None => Vec::new(),
                };
                let node = graph.add_node(NodeKind::CoreFunction, name.clone(), attrs);
                graph.link(section, node, EdgeKind::Contains);
                graph.declare(&name, node);
            }
            "ObjectFifo" | "ObjectFifoSplit" | "ObjectFifoJoin" | "ObjectFifoForward" => {
                let name = child.attribute("name").unwrap_or("fifo").to_string();
                let node = graph.add_node(NodeKind::ObjectFifo, name.clone(), Vec::new());
                graph.link(section, node, EdgeKind::Contains);
                if let Some(src) = child.attribute("source").or_else(|| child.attribute("dest")) {
                    let src_node = graph.lookup_or_placeholder(src);
                    graph.link(node, src_node, EdgeKind::Source);
                }
                graph.declare(&name, node);
            }
            "Worker" => {
                let name = child.attribute("name").unwrap_or("worker").to_string();
                let node = graph.add_node(NodeKind::Worker, name.clone(), Vec::new());
                graph.link(section, node, EdgeKind::Contains);
                if let Some(core_fn) = child.attribute("core_fn") {
                    match graph.lookup(core_fn) {
                        Some(cf) => graph.link(node, cf, EdgeKind::CoreFn),
                        None => diags.push(
                            Diagnostic::new(DiagLevel::Error, format!("unknown symbol referenced: '{core_fn}'"))
                                .with_code(codes::XML007)
                                .with_field("symbol", core_fn.to_string()),
                        ),
                    }
                }
                if let Some(placement) = child.attribute("placement") {
                    let p = graph.lookup_or_placeholder(placement);
                    graph.link(node, p, EdgeKind::PlacedBy);
                }
                graph.declare(&name, node);
            }
            "Runtime" => {
                let name = child.attribute("name").unwrap_or("runtime").to_string();
                let runtime = graph.add_node(NodeKind::Runtime, name, Vec::new());
                graph.link(section, runtime, EdgeKind::Contains);
                if let Some(seq) = child.children().find(|n| n.has_tag_name("Sequence")) {
                    let block = graph.add_node(NodeKind::SequenceBlock, "sequence", Vec::new());
                    graph.link(runtime, block, EdgeKind::Contains);
                    if let Some(start) = seq.children().find(|n| n.has_tag_name("Start")) {
                        for w in start.attribute("workers").unwrap_or("").split(',').map(str::trim).filter(|s| !s.is_empty()) {
                            let wn = graph.lookup_or_placeholder(w);
                            graph.link(block, wn, EdgeKind::Target);
                        }
                    }
                    for op in seq.children().filter(|n| n.is_element() && n.tag_name().name() != "Start") {
                        let kind_label = op.tag_name().name();
                        let op_node = graph.add_node(NodeKind::Operation, kind_label, Vec::new());
                        graph.link(block, op_node, EdgeKind::Contains);
                        if let Some(fifo) = op.attribute("fifo") {
                            let f = graph.lookup_or_placeholder(fifo);
                            graph.link(op_node, f, EdgeKind::Target);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    let program_node = graph.add_node(NodeKind::Program, "program", Vec::new());
    graph.link(section, program_node, EdgeKind::Contains);
    let placer = graph.add_node(NodeKind::Placer, "SequentialPlacer", Vec::new());
    graph.link(program_node, placer, EdgeKind::Uses);
}

fn process_function(graph: &mut SemanticGraph, el: &roxmltree::Node, parent: NodeId) {
    let name = el.attribute("name").unwrap_or("main").to_string();
    let func = graph.add_node(NodeKind::Function, name, Vec::new());
    graph.link(parent, func, EdgeKind::Contains);
    graph.push_scope();
    if let Some(params) = el.children().find(|n| n.has_tag_name("parameters")) {
        for p in params.children().filter(|n| n.has_tag_name("param")) {
            if let Some(pname) = p.attribute("name") {
                let pn = graph.add_node(NodeKind::Binding, pname, Vec::new());
                graph.link(func, pn, EdgeKind::HasParam);
                graph.declare(pname, pn);
            }
        }
    }
    if let Some(body) = el.children().find(|n| n.has_tag_name("body")) {
        for stmt in body.children().filter(|n| n.is_element()) {
            match stmt.tag_name().name() {
                "UseType" => {
                    let n = graph.add_node(NodeKind::UseType, "use_type", Vec::new());
                    graph.link(func, n, EdgeKind::Contains);
                }
                "UseDataFlow" => {
                    let n = graph.add_node(NodeKind::UseDataFlow, "use_dataflow", Vec::new());
                    graph.link(func, n, EdgeKind::Contains);
                }
                "Return" => {
                    let n = graph.add_node(NodeKind::Return, stmt.text().unwrap_or("").to_string(), Vec::new());
                    graph.link(func, n, EdgeKind::Contains);
                }
                "Assign" => {
                    let target = stmt.attribute("name").unwrap_or("_").to_string();
                    let n = graph.add_node(NodeKind::Assign, target.clone(), Vec::new());
                    graph.link(func, n, EdgeKind::Contains);
                    graph.declare(&target, n);
                }
                _ => {}
            }
        }
    }
    graph.pop_scope();
}

fn roxml_to_tree(node: &roxmltree::Node) -> Element {
    let mut el = Element::new(node.tag_name().name());
    for attr in node.attributes() {
        el = el.attr(attr.name(), attr.value());
    }
    for child in node.children() {
        if child.is_element() {
            el.push(roxml_to_tree(&child));
        } else if let Some(text) = child.text() {
            if !text.trim().is_empty() {
                el = el.text(text);
            }
        }
    }
    el
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ProgramBuilder;
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
    fn builds_module_section_and_worker_nodes() {
        let xml = sample_xml();
        let extensions = ExtensionRegistry::with_builtins();
        let graph = build_graph(&xml, &extensions).expect("should build");
        assert!(graph.nodes.iter().any(|n| n.kind == NodeKind::Module));
        assert!(graph.nodes.iter().any(|n| n.kind == NodeKind::Worker && n.label == "w0"));
        assert!(graph.nodes.iter().any(|n| n.kind == NodeKind::CoreFunction));
    }

    #[test]
    fn worker_links_to_its_core_function() {
        let xml = sample_xml();
        let extensions = ExtensionRegistry::with_builtins();
        let graph = build_graph(&xml, &extensions).unwrap();
        let worker = graph.nodes.iter().find(|n| n.kind == NodeKind::Worker).unwrap();
        assert!(graph.edges.iter().any(|e| e.from == worker.id && e.kind == EdgeKind::CoreFn));
    }

    #[test]
    fn unknown_symbol_reference_is_reported() {
        let xml = r#"<?xml version="1.0"?><Module name="p"><DataFlow><Worker name="w0" core_fn="missing_fn" placement="t0"/></DataFlow></Module>"#;
        let extensions = ExtensionRegistry::with_builtins();
        let err = build_graph(xml, &extensions).unwrap_err();
        assert_eq!(err[0].code, Some(codes::XML007));
    }

    #[test]
    fn scope_lookup_prefers_innermost_frame() {
        let mut g = SemanticGraph::new();
        let outer = g.add_node(NodeKind::Const, "x", Vec::new());
        g.declare("x", outer);
        g.push_scope();
        let inner = g.add_node(NodeKind::Const, "x_inner", Vec::new());
        g.declare("x", inner);
        assert_eq!(g.lookup("x"), Some(inner));
        g.pop_scope();
        assert_eq!(g.lookup("x"), Some(outer));
    }
}
