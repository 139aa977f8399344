//! Subtree iteration.

use super::id::NodeId;
use super::store::NodeTree;

/// Depth-first, pre-order iterator over the descendants of a node.
///
/// The root itself is not yielded. The iterator borrows the tree, so it always reflects the
/// tree as it was when the iterator was created.
#[derive(Debug)]
pub struct Descendants<'a> {
    tree: &'a NodeTree,
    stack: Vec<NodeId>,
}

impl<'a> Descendants<'a> {
    pub(crate) fn new(tree: &'a NodeTree, root: NodeId) -> Self {
        let mut stack = Vec::new();
        if let Ok(node) = tree.node(root) {
            stack.extend(node.children().iter().rev().copied());
        }
        Self { tree, stack }
    }
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        if let Ok(node) = self.tree.node(id) {
            self.stack.extend(node.children().iter().rev().copied());
        }
        Some(id)
    }
}

/// Children of `parent` in paint order: ascending z, then attach order.
pub(crate) fn paint_order(tree: &NodeTree, parent: NodeId) -> Vec<NodeId> {
    let Ok(node) = tree.node(parent) else {
        return Vec::new();
    };
    let mut keyed: Vec<(f64, u64, NodeId)> = node
        .children()
        .iter()
        .filter_map(|&c| {
            let n = tree.node(c).ok()?;
            Some((n.z_position(), n.attach_seq, c))
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    keyed.into_iter().map(|(_, _, id)| id).collect()
}
