//! Document-order traversal
//!
//! Stateless walks over the tree. Every function takes an optional
//! `stay_within` bound. Callers guarantee that the bound is an inclusive
//! ancestor of the start node; the walks never ascend past it, so they
//! terminate even if that precondition is broken (they then simply run to
//! the end of the tree).
//!
//! The generic walks visit every node. `next_element` and friends filter to
//! elements. The `*_including_pseudo` walks additionally visit the
//! `::before`/`::after` pseudo-elements hanging off an element.

use crate::{Node, PseudoId};

#[inline]
fn is_bound(node: &Node, stay_within: Option<&Node>) -> bool {
    stay_within.is_some_and(|bound| bound.ptr_eq(node))
}

fn next_ancestor_sibling(current: &Node, stay_within: Option<&Node>) -> Option<Node> {
    let mut parent = current.parent_node();
    while let Some(node) = parent {
        if is_bound(&node, stay_within) {
            return None;
        }
        if let Some(sibling) = node.next_sibling() {
            return Some(sibling);
        }
        parent = node.parent_node();
    }
    None
}

/// Next node in pre-order
pub fn next(current: &Node, stay_within: Option<&Node>) -> Option<Node> {
    if let Some(child) = current.first_child() {
        return Some(child);
    }
    next_skipping_children(current, stay_within)
}

/// Next node in pre-order, without descending into `current`
pub fn next_skipping_children(current: &Node, stay_within: Option<&Node>) -> Option<Node> {
    if is_bound(current, stay_within) {
        return None;
    }
    if let Some(sibling) = current.next_sibling() {
        return Some(sibling);
    }
    next_ancestor_sibling(current, stay_within)
}

/// Previous node in pre-order. May return `stay_within` itself.
pub fn previous(current: &Node, stay_within: Option<&Node>) -> Option<Node> {
    if is_bound(current, stay_within) {
        return None;
    }
    if let Some(sibling) = current.previous_sibling() {
        return Some(deepest_last_child(&sibling));
    }
    current.parent_node()
}

/// Previous sibling, or the previous sibling of the nearest ancestor that has one
pub fn previous_skipping_children(current: &Node, stay_within: Option<&Node>) -> Option<Node> {
    if is_bound(current, stay_within) {
        return None;
    }
    if let Some(sibling) = current.previous_sibling() {
        return Some(sibling);
    }
    let mut parent = current.parent_node();
    while let Some(node) = parent {
        if is_bound(&node, stay_within) {
            return None;
        }
        if let Some(sibling) = node.previous_sibling() {
            return Some(sibling);
        }
        parent = node.parent_node();
    }
    None
}

/// Next node in post-order
pub fn next_post_order(current: &Node, stay_within: Option<&Node>) -> Option<Node> {
    if is_bound(current, stay_within) {
        return None;
    }
    match current.next_sibling() {
        Some(sibling) => Some(deepest_first_child(&sibling)),
        None => current.parent_node(),
    }
}

/// Previous node in post-order
pub fn previous_post_order(current: &Node, stay_within: Option<&Node>) -> Option<Node> {
    if let Some(child) = current.last_child() {
        return Some(child);
    }
    if is_bound(current, stay_within) {
        return None;
    }
    if let Some(sibling) = current.previous_sibling() {
        return Some(sibling);
    }
    let mut parent = current.parent_node();
    while let Some(node) = parent {
        if is_bound(&node, stay_within) {
            return None;
        }
        if let Some(sibling) = node.previous_sibling() {
            return Some(sibling);
        }
        parent = node.parent_node();
    }
    None
}

/// First node visited by a post-order walk of `node`'s subtree
pub fn deepest_first_child(node: &Node) -> Node {
    let mut current = node.clone();
    while let Some(child) = current.first_child() {
        current = child;
    }
    current
}

/// Last node in pre-order within `node`'s subtree (`node` itself if childless)
pub fn deepest_last_child(node: &Node) -> Node {
    let mut current = node.clone();
    while let Some(child) = current.last_child() {
        current = child;
    }
    current
}

/// Last strict descendant in pre-order
pub fn last_within(node: &Node) -> Option<Node> {
    node.last_child().map(|child| deepest_last_child(&child))
}

// --- element-only walks ----------------------------------------------------

/// First element child
pub fn first_element_child(node: &Node) -> Option<Node> {
    let mut current = node.first_child();
    while let Some(child) = current {
        if child.is_element() {
            return Some(child);
        }
        current = child.next_sibling();
    }
    None
}

/// Last element child
pub fn last_element_child(node: &Node) -> Option<Node> {
    let mut current = node.last_child();
    while let Some(child) = current {
        if child.is_element() {
            return Some(child);
        }
        current = child.previous_sibling();
    }
    None
}

pub fn next_element_sibling(node: &Node) -> Option<Node> {
    let mut current = node.next_sibling();
    while let Some(sibling) = current {
        if sibling.is_element() {
            return Some(sibling);
        }
        current = sibling.next_sibling();
    }
    None
}

pub fn previous_element_sibling(node: &Node) -> Option<Node> {
    let mut current = node.previous_sibling();
    while let Some(sibling) = current {
        if sibling.is_element() {
            return Some(sibling);
        }
        current = sibling.previous_sibling();
    }
    None
}

/// First element descendant in pre-order
pub fn first_element_within(root: &Node) -> Option<Node> {
    let mut current = root.first_child();
    while let Some(node) = current {
        if node.is_element() {
            return Some(node);
        }
        current = next(&node, Some(root));
    }
    None
}

/// Next element in pre-order
pub fn next_element(current: &Node, stay_within: Option<&Node>) -> Option<Node> {
    let mut node = next(current, stay_within);
    while let Some(candidate) = node {
        if candidate.is_element() {
            return Some(candidate);
        }
        node = next(&candidate, stay_within);
    }
    None
}

/// Next element in pre-order, without descending into `current`
pub fn next_element_skipping_children(current: &Node, stay_within: Option<&Node>) -> Option<Node> {
    let mut node = next_skipping_children(current, stay_within);
    while let Some(candidate) = node {
        if candidate.is_element() {
            return Some(candidate);
        }
        node = next(&candidate, stay_within);
    }
    None
}

/// Previous element in pre-order, never returning `stay_within` itself
pub fn previous_element(current: &Node, stay_within: Option<&Node>) -> Option<Node> {
    let mut node = previous(current, stay_within);
    while let Some(candidate) = node {
        if is_bound(&candidate, stay_within) {
            return None;
        }
        if candidate.is_element() {
            return Some(candidate);
        }
        node = previous(&candidate, stay_within);
    }
    None
}

/// Last element descendant in pre-order
pub fn last_element_within(root: &Node) -> Option<Node> {
    let last = last_within(root)?;
    if last.is_element() {
        return Some(last);
    }
    previous_element(&last, Some(root))
}

// --- pseudo-element aware walks --------------------------------------------

fn pseudo_aware_first_child(node: &Node) -> Option<Node> {
    node.pseudo_element(PseudoId::Before)
        .or_else(|| node.first_child())
        .or_else(|| node.pseudo_element(PseudoId::After))
}

fn pseudo_aware_last_child(node: &Node) -> Option<Node> {
    node.pseudo_element(PseudoId::After)
        .or_else(|| node.last_child())
        .or_else(|| node.pseudo_element(PseudoId::Before))
}

fn pseudo_aware_next_sibling(node: &Node) -> Option<Node> {
    let parent = node.parent_node()?;
    match node.pseudo_id() {
        Some(PseudoId::Before) => parent
            .first_child()
            .or_else(|| parent.pseudo_element(PseudoId::After)),
        Some(PseudoId::After) => None,
        None => node
            .next_sibling()
            .or_else(|| parent.pseudo_element(PseudoId::After)),
    }
}

fn pseudo_aware_previous_sibling(node: &Node) -> Option<Node> {
    let parent = node.parent_node()?;
    match node.pseudo_id() {
        Some(PseudoId::After) => parent
            .last_child()
            .or_else(|| parent.pseudo_element(PseudoId::Before)),
        Some(PseudoId::Before) => None,
        None => node
            .previous_sibling()
            .or_else(|| parent.pseudo_element(PseudoId::Before)),
    }
}

/// Next node in pre-order, visiting `::before` ahead of an element's
/// children and `::after` behind them
pub fn next_including_pseudo(current: &Node, stay_within: Option<&Node>) -> Option<Node> {
    if let Some(child) = pseudo_aware_first_child(current) {
        return Some(child);
    }
    next_including_pseudo_skipping_children(current, stay_within)
}

pub fn next_including_pseudo_skipping_children(
    current: &Node,
    stay_within: Option<&Node>,
) -> Option<Node> {
    if is_bound(current, stay_within) {
        return None;
    }
    if let Some(sibling) = pseudo_aware_next_sibling(current) {
        return Some(sibling);
    }
    let mut parent = current.parent_node();
    while let Some(node) = parent {
        if is_bound(&node, stay_within) {
            return None;
        }
        if let Some(sibling) = pseudo_aware_next_sibling(&node) {
            return Some(sibling);
        }
        parent = node.parent_node();
    }
    None
}

pub fn previous_including_pseudo(current: &Node, stay_within: Option<&Node>) -> Option<Node> {
    if is_bound(current, stay_within) {
        return None;
    }
    if let Some(mut previous) = pseudo_aware_previous_sibling(current) {
        while let Some(child) = pseudo_aware_last_child(&previous) {
            previous = child;
        }
        return Some(previous);
    }
    current.parent_node()
}
