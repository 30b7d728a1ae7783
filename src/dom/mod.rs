//! Mutable markup tree the sanitizer operates on.
//!
//! Nodes live in an [`ego_tree::Tree`] arena and are addressed by
//! [`NodeId`]. Ids stay valid for the lifetime of the [`Document`] even after
//! a node is detached, so a detached node can be inspected but is no longer
//! reachable from the root.
//!
//! Parsing is delegated to `scraper` (see [`Document::parse_fragment`] and
//! [`Document::parse_document`]); the result is copied into this tree so the
//! sanitizer owns every structural operation it performs.

mod parse;
mod serialize;

pub use ego_tree::NodeId;
pub use serialize::{Encoding, SerializeOptions};

use ego_tree::Tree;

/// The kind of a node, without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Fragment,
    Doctype,
    Element,
    Text,
    Comment,
    CData,
}

/// A `<!DOCTYPE>` declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Doctype {
    pub name: String,
    pub public_id: String,
    pub system_id: String,
}

impl Doctype {
    /// The bare `<!DOCTYPE html>`.
    pub fn html5() -> Self {
        Self {
            name: "html".to_string(),
            ..Self::default()
        }
    }

    /// Whether this is exactly `<!DOCTYPE html>` with no identifiers.
    pub fn is_html5(&self) -> bool {
        self.name.eq_ignore_ascii_case("html")
            && self.public_id.is_empty()
            && self.system_id.is_empty()
    }
}

/// An element with its attributes in source order.
///
/// Element and attribute names are stored lower-cased.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
}

impl Element {
    /// An element with no attributes.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// An element with `attrs`, set in order.
    pub fn with_attrs<'a>(name: &str, attrs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut element = Self::new(name);
        for (key, value) in attrs {
            element.set_attr(key, value);
        }
        element
    }

    /// Lower-cased tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the element.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_ascii_lowercase();
    }

    /// Attributes in source order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Value of `name`, matched case-insensitively.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether `name` is present.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Set an attribute, overwriting an existing value in place or
    /// appending a new attribute at the end.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self
            .attrs
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => {
                existing.clear();
                existing.push_str(value);
            }
            None => self
                .attrs
                .push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    /// Remove `name`, returning its value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self
            .attrs
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(index).1)
    }

    /// Keep only the attributes for which `keep` returns `true`. The closure
    /// may rewrite the value it is handed.
    pub fn retain_attrs(&mut self, mut keep: impl FnMut(&str, &mut String) -> bool) {
        self.attrs.retain_mut(|(name, value)| keep(name, value));
    }

    /// Rewrite attribute values in place.
    pub fn update_attrs(&mut self, mut update: impl FnMut(&str, &mut String)) {
        for (name, value) in &mut self.attrs {
            update(name, value);
        }
    }
}

/// Payload of a tree node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Fragment,
    Doctype(Doctype),
    Element(Element),
    Text(String),
    Comment(String),
    CData(String),
}

impl NodeData {
    /// The kind of this payload.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Document => NodeKind::Document,
            NodeData::Fragment => NodeKind::Fragment,
            NodeData::Doctype(_) => NodeKind::Doctype,
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
            NodeData::CData(_) => NodeKind::CData,
        }
    }

    /// Lower-cased node name: the tag name for elements, a `#`-prefixed
    /// pseudo-name for everything else.
    pub fn name(&self) -> &str {
        match self {
            NodeData::Document => "#document",
            NodeData::Fragment => "#document-fragment",
            NodeData::Doctype(_) => "#doctype",
            NodeData::Element(element) => element.name(),
            NodeData::Text(_) => "#text",
            NodeData::Comment(_) => "#comment",
            NodeData::CData(_) => "#cdata-section",
        }
    }
}

/// A document or fragment tree.
#[derive(Clone, Debug)]
pub struct Document {
    tree: Tree<NodeData>,
}

impl Document {
    /// An empty tree rooted at a fragment node.
    pub fn new_fragment() -> Self {
        Self {
            tree: Tree::new(NodeData::Fragment),
        }
    }

    /// An empty tree rooted at a document node.
    pub fn new_document() -> Self {
        Self {
            tree: Tree::new(NodeData::Document),
        }
    }

    /// The document or fragment root.
    pub fn root(&self) -> NodeId {
        self.tree.root().id()
    }

    /// Whether `id` names a node of this tree (attached or not).
    pub fn contains(&self, id: NodeId) -> bool {
        self.tree.get(id).is_some()
    }

    /// Payload of `id`, or `None` if it is not part of this tree.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.tree.get(id).map(|node| node.value())
    }

    /// Run `f` against the payload of `id`.
    pub fn update<R>(&mut self, id: NodeId, f: impl FnOnce(&mut NodeData) -> R) -> Option<R> {
        let mut node = self.tree.get_mut(id)?;
        Some(f(node.value()))
    }

    /// Kind of `id`.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(NodeData::kind)
    }

    /// Node name of `id` (see [`NodeData::name`]).
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(NodeData::name)
    }

    /// `id` as an element, if it is one.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.get(id)? {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Run `f` against `id` if it is an element.
    pub fn update_element<R>(&mut self, id: NodeId, f: impl FnOnce(&mut Element) -> R) -> Option<R> {
        let mut node = self.tree.get_mut(id)?;
        match node.value() {
            NodeData::Element(element) => Some(f(element)),
            _ => None,
        }
    }

    /// Parent of `id`; `None` for the root and for detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.parent().map(|n| n.id())
    }

    /// First child of `id`.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.first_child().map(|n| n.id())
    }

    /// Sibling after `id`.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.next_sibling().map(|n| n.id())
    }

    /// Sibling before `id`.
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.prev_sibling().map(|n| n.id())
    }

    /// Children of `id`, collected so the tree can be mutated while iterating.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| node.children().map(|c| c.id()).collect())
            .unwrap_or_default()
    }

    /// Whether `id` has at least one child.
    pub fn has_children(&self, id: NodeId) -> bool {
        self.tree.get(id).is_some_and(|node| node.has_children())
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let root = self.root();
        let mut current = Some(id);
        while let Some(node) = current {
            if node == root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// `id` followed by all of its descendants in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| node.descendants().map(|n| n.id()).collect())
            .unwrap_or_default()
    }

    /// Concatenated text of all text and CDATA descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.tree.get(id) else {
            return String::new();
        };
        node.descendants()
            .filter_map(|n| match n.value() {
                NodeData::Text(text) | NodeData::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Add a new last child to `parent`.
    pub fn append(&mut self, parent: NodeId, data: NodeData) -> Option<NodeId> {
        Some(self.tree.get_mut(parent)?.append(data).id())
    }

    /// Insert a new sibling before `sibling`. Returns `None` if `sibling` has
    /// no parent.
    pub fn insert_before(&mut self, sibling: NodeId, data: NodeData) -> Option<NodeId> {
        self.parent(sibling)?;
        Some(self.tree.get_mut(sibling)?.insert_before(data).id())
    }

    /// Insert a new sibling after `sibling`. Returns `None` if `sibling` has
    /// no parent.
    pub fn insert_after(&mut self, sibling: NodeId, data: NodeData) -> Option<NodeId> {
        self.parent(sibling)?;
        Some(self.tree.get_mut(sibling)?.insert_after(data).id())
    }

    /// Move an existing node (and its subtree) to just before `sibling`.
    pub fn move_before(&mut self, sibling: NodeId, node: NodeId) -> bool {
        if sibling == node || self.parent(sibling).is_none() || !self.contains(node) {
            return false;
        }
        match self.tree.get_mut(sibling) {
            Some(mut target) => {
                target.insert_id_before(node);
                true
            }
            None => false,
        }
    }

    /// Unlink `id` and its subtree from the tree.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(mut node) = self.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Put a new node in `id`'s position and unlink `id`.
    pub fn replace(&mut self, id: NodeId, data: NodeData) -> Option<NodeId> {
        let new_id = self.insert_before(id, data)?;
        self.detach(id);
        Some(new_id)
    }

    /// Move `id`'s children into its position (keeping their order), then
    /// unlink the now-empty `id`.
    pub fn splice(&mut self, id: NodeId) -> bool {
        if self.parent(id).is_none() {
            return false;
        }
        for child in self.children(id) {
            self.move_before(id, child);
        }
        self.detach(id);
        true
    }

    /// Unlink every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.children(id) {
            self.detach(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new_fragment();
        let root = doc.root();
        let div = doc
            .append(root, NodeData::Element(Element::new("DIV")))
            .unwrap();
        let a = doc.append(div, NodeData::Text("a".into())).unwrap();
        let b = doc.append(div, NodeData::Text("b".into())).unwrap();
        (doc, div, a, b)
    }

    #[test]
    fn element_names_are_lowercased() {
        let (doc, div, ..) = sample();
        assert_eq!(doc.name(div), Some("div"));
        assert_eq!(doc.kind(div), Some(NodeKind::Element));
    }

    #[test]
    fn splice_moves_children_in_order() {
        let (mut doc, div, a, b) = sample();
        let root = doc.root();
        assert!(doc.splice(div));
        assert_eq!(doc.children(root), vec![a, b]);
        assert_eq!(doc.parent(div), None);
        assert!(!doc.is_attached(div));
    }

    #[test]
    fn replace_keeps_position() {
        let (mut doc, div, a, b) = sample();
        let c = doc.replace(a, NodeData::Text("c".into())).unwrap();
        assert_eq!(doc.children(div), vec![c, b]);
        assert_eq!(doc.parent(a), None);
    }

    #[test]
    fn root_has_no_siblings() {
        let mut doc = Document::new_fragment();
        let root = doc.root();
        assert!(doc.insert_before(root, NodeData::Text("x".into())).is_none());
        assert!(!doc.splice(root));
    }

    #[test]
    fn text_content_concatenates_descendants() {
        let (mut doc, div, ..) = sample();
        doc.append(div, NodeData::CData("c".into()));
        assert_eq!(doc.text_content(div), "abc");
    }

    #[test]
    fn attribute_names_are_case_insensitive() {
        let mut element = Element::with_attrs("a", [("HREF", "/x"), ("title", "t")]);
        assert_eq!(element.attr("href"), Some("/x"));
        element.set_attr("Href", "/y");
        assert_eq!(element.attrs().collect::<Vec<_>>(), vec![("href", "/y"), ("title", "t")]);
        assert_eq!(element.remove_attr("TITLE").as_deref(), Some("t"));
        assert!(!element.has_attr("title"));
    }

    #[test]
    fn doctype_html5_shape() {
        assert!(Doctype::html5().is_html5());
        let legacy = Doctype {
            name: "html".into(),
            public_id: "-//W3C//DTD HTML 4.01//EN".into(),
            system_id: String::new(),
        };
        assert!(!legacy.is_html5());
    }
}
