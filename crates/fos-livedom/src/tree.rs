//! Child list link surgery
//!
//! These primitives only rewire links. Callers in `mutation` are responsible
//! for id/name bookkeeping and invalidation.

use std::rc::Weak;

use crate::Node;

/// Iterator over the children of a node
pub struct Children {
    next: Option<Node>,
}

impl Iterator for Children {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let current = self.next.take()?;
        self.next = current.next_sibling();
        Some(current)
    }
}

impl Node {
    /// Iterate over child nodes in order
    pub fn child_iter(&self) -> Children {
        Children {
            next: self.first_child(),
        }
    }

    /// Iterate over inclusive ancestors, starting at `self`
    pub fn inclusive_ancestors(&self) -> impl Iterator<Item = Node> {
        std::iter::successors(Some(self.clone()), Node::parent_node)
    }

    pub fn child_count(&self) -> usize {
        self.child_iter().count()
    }
}

/// Append `child` as the last child of `parent`. `child` must be detached.
pub(crate) fn append(parent: &Node, child: &Node) {
    debug_assert!(child.parent_node().is_none());
    let old_last = parent.last_child();
    {
        let mut links = child.links_mut();
        links.parent = parent.downgrade();
        links.prev_sibling = old_last.as_ref().map(Node::downgrade).unwrap_or_default();
        links.next_sibling = None;
    }
    match old_last {
        Some(last) => last.links_mut().next_sibling = Some(child.clone()),
        None => parent.links_mut().first_child = Some(child.clone()),
    }
    parent.links_mut().last_child = child.downgrade();
}

/// Insert `child` before `reference`, which must be a child of `parent`.
pub(crate) fn insert_before(parent: &Node, child: &Node, reference: &Node) {
    debug_assert!(child.parent_node().is_none());
    debug_assert!(reference.parent_node().as_ref() == Some(parent));
    let prev = reference.previous_sibling();
    {
        let mut links = child.links_mut();
        links.parent = parent.downgrade();
        links.prev_sibling = prev.as_ref().map(Node::downgrade).unwrap_or_default();
        links.next_sibling = Some(reference.clone());
    }
    reference.links_mut().prev_sibling = child.downgrade();
    match prev {
        Some(prev) => prev.links_mut().next_sibling = Some(child.clone()),
        None => parent.links_mut().first_child = Some(child.clone()),
    }
}

/// Unlink `child` from its parent. No-op for a detached node.
pub(crate) fn detach(child: &Node) {
    let Some(parent) = child.parent_node() else {
        return;
    };
    let (prev, next) = {
        let mut links = child.links_mut();
        let prev = Node::from_weak(&links.prev_sibling);
        let next = links.next_sibling.take();
        links.parent = Weak::new();
        links.prev_sibling = Weak::new();
        (prev, next)
    };
    match &next {
        Some(next) => {
            next.links_mut().prev_sibling = prev.as_ref().map(Node::downgrade).unwrap_or_default()
        }
        None => {
            parent.links_mut().last_child = prev.as_ref().map(Node::downgrade).unwrap_or_default()
        }
    }
    match prev {
        Some(prev) => prev.links_mut().next_sibling = next,
        None => parent.links_mut().first_child = next,
    }
}
