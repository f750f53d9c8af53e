// graphml.rs — GraphML emission for the semantic graph (spec §6.5)
//
// A debugging/inspection artifact: every `SemanticGraph` node becomes a
// `<node>` with `kind`/`label` data attributes, every edge a `<edge>`
// with a `type` data attribute carrying the `EdgeKind`. Built on
// `xml_tree.rs`, the same hand-rolled writer `gui_xml.rs` uses, rather
// than introducing a second XML-emission technique for one format.
//
// Preconditions: none.
// Postconditions: output is a well-formed GraphML document; re-running
//   over an unchanged graph produces byte-identical output (node/edge
//   order follows the graph's own insertion order, never a hash order).
// Failure modes: none.
// Side effects: none.

use crate::graph::SemanticGraph;
use crate::xml_tree::Element;

const XMLNS: &str = "http://graphml.graphdrawing.org/xmlns";

pub fn render(graph: &SemanticGraph) -> String {
    let mut root = Element::new("graphml").attr("xmlns", XMLNS);
    root.push(Element::new("key").attr("id", "kind").attr("for", "node").attr("attr.name", "kind").attr("attr.type", "string"));
    root.push(Element::new("key").attr("id", "label").attr("for", "node").attr("attr.name", "label").attr("attr.type", "string"));
    root.push(Element::new("key").attr("id", "edgetype").attr("for", "edge").attr("attr.name", "type").attr("attr.type", "string"));

    let mut graph_el = Element::new("graph").attr("id", "G").attr("edgedefault", "directed");
    for node in &graph.nodes {
        graph_el.push(
            Element::new("node")
                .attr("id", node.id.to_string())
                .child(Element::new("data").attr("key", "kind").text(node.kind.as_str()))
                .child(Element::new("data").attr("key", "label").text(node.label.clone())),
        );
    }
    for (i, edge) in graph.edges.iter().enumerate() {
        graph_el.push(
            Element::new("edge")
                .attr("id", format!("e{i}"))
                .attr("source", edge.from.to_string())
                .attr("target", edge.to.to_string())
                .child(Element::new("data").attr("key", "edgetype").text(edge.kind.as_str())),
        );
    }
    root.push(graph_el);
    root.render()
}
