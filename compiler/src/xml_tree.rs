// xml_tree.rs — Minimal in-memory XML element tree, for the writer side of
// GUI XML / Complete XML / GraphML (spec §4.4, §4.5, §6.5).
//
// roxmltree (crate::gui_xml, crate::graph) handles reading; there is no
// equivalent write-side DOM in the corpus this crate depends on, so
// emission is hand-rolled the same way `dot.rs` hand-rolls DOT output:
// build a small tree, then walk it with `write!` into a deterministic
// string. Attribute and child order is exactly insertion order.
//
// Preconditions: none.
// Postconditions: `Element::render` always produces well-formed XML for
//   a tree built through the public constructors (text is escaped).
// Failure modes: none.
// Side effects: none.

use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children.into_iter().map(Node::Element));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Set an attribute in place, overwriting a prior value for `key` if
    /// one exists instead of appending a second copy.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(existing) = self.attrs.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            self.attrs.push((key, value));
        }
    }

    /// First direct child element with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find_map(|c| match c {
            Node::Element(e) if e.tag == tag => Some(e),
            _ => None,
        })
    }

    /// All direct child elements with the given tag, in document order.
    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter_map(move |c| match c {
            Node::Element(e) if e.tag == tag => Some(e),
            _ => None,
        })
    }

    /// All direct child elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Concatenated direct text-node content.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>").unwrap();
        self.write_indented(&mut out, 0);
        out
    }

    fn write_indented(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        write!(out, "{indent}<{}", self.tag).unwrap();
        for (k, v) in &self.attrs {
            write!(out, " {}=\"{}\"", k, escape_attr(v)).unwrap();
        }
        if self.children.is_empty() {
            writeln!(out, "/>").unwrap();
            return;
        }
        // Inline rendering when the only child is text, matching how a
        // terse authoring format expects `<Const>5</Const>` on one line.
        if self.children.len() == 1 {
            if let Node::Text(t) = &self.children[0] {
                writeln!(out, ">{}</{}>", escape_text(t), self.tag).unwrap();
                return;
            }
        }
        writeln!(out, ">").unwrap();
        for child in &self.children {
            match child {
                Node::Element(e) => e.write_indented(out, depth + 1),
                Node::Text(t) => {
                    writeln!(out, "{}{}", "  ".repeat(depth + 1), escape_text(t)).unwrap();
                }
            }
        }
        writeln!(out, "{indent}</{}>", self.tag).unwrap();
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_self_closing_element_without_children() {
        let e = Element::new("Tile").attr("name", "shim0");
        assert!(e.render().contains("<Tile name=\"shim0\"/>"));
    }

    #[test]
    fn renders_text_child_inline() {
        let e = Element::new("Const").attr("name", "N").text("128");
        assert!(e.render().contains("<Const name=\"N\">128</Const>"));
    }

    #[test]
    fn escapes_reserved_characters() {
        let e = Element::new("Const").text("a < b & c");
        assert!(e.render().contains("a &lt; b &amp; c"));
    }

    #[test]
    fn find_locates_first_matching_child() {
        let e = Element::new("Module")
            .child(Element::new("Symbols"))
            .child(Element::new("DataFlow"));
        assert!(e.find("DataFlow").is_some());
        assert!(e.find("Missing").is_none());
    }
}
