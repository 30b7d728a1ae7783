use ego_tree::NodeRef;
use scraper::{Html, Node};

use super::{Doctype, Document, Element, NodeData, NodeId};

impl Document {
    /// Parse `html` as a body fragment.
    ///
    /// The parser wraps fragment content in a synthetic `<html>` element;
    /// its children become the children of the fragment root.
    pub fn parse_fragment(html: &str) -> Self {
        let parsed = Html::parse_fragment(html);
        let mut doc = Document::new_fragment();
        let root = doc.root();
        for child in parsed.tree.root().children() {
            match child.value() {
                Node::Element(element) if element.name() == "html" => {
                    doc.copy_children(child, root)
                }
                _ => doc.copy_subtree(child, root),
            }
        }
        doc
    }

    /// Parse `html` as a complete document.
    pub fn parse_document(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Document::new_document();
        let root = doc.root();
        doc.copy_children(parsed.tree.root(), root);
        doc
    }

    fn copy_subtree(&mut self, source: NodeRef<'_, Node>, parent: NodeId) {
        self.copy_from(vec![(source, parent)]);
    }

    fn copy_children(&mut self, source: NodeRef<'_, Node>, parent: NodeId) {
        self.copy_from(source.children().rev().map(|c| (c, parent)).collect());
    }

    // Iterative so that deeply nested input cannot exhaust the stack.
    fn copy_from(&mut self, mut stack: Vec<(NodeRef<'_, Node>, NodeId)>) {
        while let Some((source, parent)) = stack.pop() {
            let Some(data) = convert(source.value()) else {
                continue;
            };
            let Some(id) = self.append(parent, data) else {
                continue;
            };
            stack.extend(source.children().rev().map(|c| (c, id)));
        }
    }
}

fn convert(node: &Node) -> Option<NodeData> {
    match node {
        Node::Element(element) => Some(NodeData::Element(Element::with_attrs(
            element.name(),
            element.attrs(),
        ))),
        Node::Text(text) => Some(NodeData::Text((**text).to_owned())),
        Node::Comment(comment) => Some(NodeData::Comment((**comment).to_owned())),
        Node::Doctype(doctype) => Some(NodeData::Doctype(Doctype {
            name: doctype.name().to_owned(),
            public_id: doctype.public_id().to_owned(),
            system_id: doctype.system_id().to_owned(),
        })),
        _ => None,
    }
}
