//! Mutation-tolerant tree walks.
//!
//! A visit may unlink, replace, splice or reparent the node it is handed (or
//! that node's siblings). After each child is processed the walk works out
//! where to continue from the child's position, falling back to the last
//! child that is still attached, and finally to the parent's first child.
//! Nodes that were already visited are skipped, so children hoisted by a
//! splice are not processed twice.

use std::collections::HashSet;

use crate::dom::{Document, NodeId};
use crate::error::Result;

/// Order in which [`walk`] visits nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TraversalMode {
    /// Children (with all their descendants) before the node itself.
    #[default]
    Depth,
    /// The node itself before its children.
    Breadth,
}

struct Frame {
    node: NodeId,
    cursor: Option<NodeId>,
    prev: Option<NodeId>,
}

impl Frame {
    fn enter(doc: &Document, node: NodeId) -> Self {
        Self {
            node,
            cursor: doc.first_child(node),
            prev: None,
        }
    }

    /// Move the cursor past `child`, which has just been processed.
    fn advance(&mut self, doc: &Document, child: NodeId) {
        if doc.parent(child) == Some(self.node) {
            self.prev = Some(child);
            self.cursor = doc.next_sibling(child);
            return;
        }
        self.prev = self.prev.filter(|&prev| doc.parent(prev) == Some(self.node));
        self.cursor = match self.prev {
            Some(prev) => doc.next_sibling(prev),
            None => doc.first_child(self.node),
        };
    }
}

/// Visit `root` and every node below it in the given order. The first error
/// returned by `visit` aborts the walk.
pub fn walk<F>(doc: &mut Document, root: NodeId, mode: TraversalMode, mut visit: F) -> Result<()>
where
    F: FnMut(&mut Document, NodeId) -> Result<()>,
{
    match mode {
        TraversalMode::Depth => post_order(doc, root, &mut visit),
        TraversalMode::Breadth => pre_order(doc, root, &mut visit),
    }
}

fn post_order<F>(doc: &mut Document, root: NodeId, visit: &mut F) -> Result<()>
where
    F: FnMut(&mut Document, NodeId) -> Result<()>,
{
    let mut visited = HashSet::new();
    let mut stack = vec![Frame::enter(doc, root)];

    while let Some(frame) = stack.last_mut() {
        if let Some(child) = frame.cursor {
            if visited.contains(&child) {
                frame.prev = Some(child);
                frame.cursor = doc.next_sibling(child);
            } else {
                stack.push(Frame::enter(doc, child));
            }
            continue;
        }

        let Some(done) = stack.pop() else { break };
        visit(doc, done.node)?;
        visited.insert(done.node);
        if let Some(parent) = stack.last_mut() {
            parent.advance(doc, done.node);
        }
    }

    Ok(())
}

fn pre_order<F>(doc: &mut Document, root: NodeId, visit: &mut F) -> Result<()>
where
    F: FnMut(&mut Document, NodeId) -> Result<()>,
{
    let mut visited = HashSet::new();
    visit(doc, root)?;
    visited.insert(root);
    let mut stack = vec![Frame::enter(doc, root)];

    while let Some(frame) = stack.last_mut() {
        let Some(child) = frame.cursor else {
            let Some(done) = stack.pop() else { break };
            if let Some(parent) = stack.last_mut() {
                parent.advance(doc, done.node);
            }
            continue;
        };

        if visited.contains(&child) {
            frame.prev = Some(child);
            frame.cursor = doc.next_sibling(child);
            continue;
        }

        let parent = frame.node;
        visit(doc, child)?;
        visited.insert(child);

        if doc.parent(child) == Some(parent) {
            stack.push(Frame::enter(doc, child));
        } else if let Some(frame) = stack.last_mut() {
            frame.advance(doc, child);
        }
    }

    Ok(())
}
