// extension.rs — Pluggable tag/kind handlers (spec §4.6, §4.7, §9)
//
// The graph builder's dispatch falls through to a registered extension
// for any XML tag it doesn't recognize natively, and the code generator
// mirrors this with a registry keyed by graph node kind. Four built-in
// extensions ship for `Worker`, `ExternalFunction`, `CoreFunction`, and
// `List` — the same four tags graph.rs and codegen.rs also handle
// natively, registered here so a caller can override the built-in
// behavior without forking the builder.
//
// Preconditions: none.
// Postconditions: none.
// Failure modes: a missing extension for an unrecognized tag surfaces as
//   an `XML001` diagnostic at the call site, not a panic here.
// Side effects: none.

use std::collections::HashMap;

use crate::graph::{EdgeKind, NodeId, SemanticGraph};

/// A pluggable handler for one XML element tag during graph building.
/// Implementors translate a parsed element into graph nodes/edges and
/// link the result to `parent` with an appropriate edge.
pub trait GraphExtension {
    fn tag(&self) -> &'static str;

    /// Process `elem`, linking whatever it creates under `parent`.
    /// Returns the id of the primary node created, if any.
    fn process(&self, graph: &mut SemanticGraph, elem: &crate::xml_tree::Element, parent: NodeId) -> Option<NodeId>;
}

/// Registry mapping lower-cased tag names to extensions, built once at
/// graph-builder construction and consulted for every unrecognized tag.
#[derive(Default)]
pub struct ExtensionRegistry {
    by_tag: HashMap<String, Box<dyn GraphExtension>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, ext: Box<dyn GraphExtension>) {
        self.by_tag.insert(ext.tag().to_ascii_lowercase(), ext);
    }

    pub fn get(&self, tag: &str) -> Option<&dyn GraphExtension> {
        self.by_tag.get(&tag.to_ascii_lowercase()).map(|b| b.as_ref())
    }

    /// The four built-in extensions spec §4.6 names, registered so
    /// callers that want the default behavior don't have to know about
    /// the native dispatch table that already handles these tags.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register(Box::new(WorkerExtension));
        reg.register(Box::new(ExternalFunctionExtension));
        reg.register(Box::new(CoreFunctionExtension));
        reg.register(Box::new(ListExtension));
        reg
    }
}

struct WorkerExtension;
impl GraphExtension for WorkerExtension {
    fn tag(&self) -> &'static str {
        "worker"
    }
    fn process(&self, graph: &mut SemanticGraph, elem: &crate::xml_tree::Element, parent: NodeId) -> Option<NodeId> {
        let label = elem.get_attr("name").unwrap_or("worker").to_string();
        let node = graph.add_node(crate::graph::NodeKind::Worker, label, Vec::new());
        graph.link(parent, node, EdgeKind::Contains);
        Some(node)
    }
}

struct ExternalFunctionExtension;
impl GraphExtension for ExternalFunctionExtension {
    fn tag(&self) -> &'static str {
        "externalfunction"
    }
    fn process(&self, graph: &mut SemanticGraph, elem: &crate::xml_tree::Element, parent: NodeId) -> Option<NodeId> {
        let label = elem.get_attr("name").unwrap_or("external_function").to_string();
        let node = graph.add_node(crate::graph::NodeKind::ExternalFunction, label, Vec::new());
        graph.link(parent, node, EdgeKind::Contains);
        Some(node)
    }
}

struct CoreFunctionExtension;
impl GraphExtension for CoreFunctionExtension {
    fn tag(&self) -> &'static str {
        "corefunction"
    }
    fn process(&self, graph: &mut SemanticGraph, elem: &crate::xml_tree::Element, parent: NodeId) -> Option<NodeId> {
        let label = elem.get_attr("name").unwrap_or("core_function").to_string();
        let node = graph.add_node(crate::graph::NodeKind::CoreFunction, label, Vec::new());
        graph.link(parent, node, EdgeKind::Contains);
        Some(node)
    }
}

struct ListExtension;
impl GraphExtension for ListExtension {
    fn tag(&self) -> &'static str {
        "list"
    }
    fn process(&self, graph: &mut SemanticGraph, elem: &crate::xml_tree::Element, parent: NodeId) -> Option<NodeId> {
        let label = elem.get_attr("name").unwrap_or("list").to_string();
        let node = graph.add_node(crate::graph::NodeKind::List, label, Vec::new());
        graph.link(parent, node, EdgeKind::Contains);
        Some(node)
    }
}

/// Code-generation counterpart: extensions keyed by graph node `kind`,
/// mirroring the graph builder's tag-keyed registry (spec §4.7).
pub trait CodegenExtension {
    fn kind(&self) -> crate::graph::NodeKind;
    fn emit(&self, graph: &SemanticGraph, node: NodeId, out: &mut crate::codegen::Emitter);
}

#[derive(Default)]
pub struct CodegenExtensionRegistry {
    by_kind: HashMap<crate::graph::NodeKind, Box<dyn CodegenExtension>>,
}

impl CodegenExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, ext: Box<dyn CodegenExtension>) {
        self.by_kind.insert(ext.kind(), ext);
    }

    pub fn get(&self, kind: crate::graph::NodeKind) -> Option<&dyn CodegenExtension> {
        self.by_kind.get(&kind).map(|b| b.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_resolves_by_lowercased_tag() {
        let reg = ExtensionRegistry::with_builtins();
        assert!(reg.get("Worker").is_some());
        assert!(reg.get("worker").is_some());
        assert!(reg.get("Unrelated").is_none());
    }
}
