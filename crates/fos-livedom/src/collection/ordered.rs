//! Collections with their own order
//!
//! `table.rows` lists head rows, then body rows, then foot rows regardless
//! of where the sections sit in the table. Microdata properties come from
//! the item plus every element it references through `itemref`, without
//! descending into nested items. Both are walked forward only.

use std::cmp::Ordering;

use super::{CollectionCache, CollectionInner, CollectionType};
use crate::{traversal, Node};

pub(super) fn first_item(inner: &CollectionInner, cache: &mut CollectionCache) -> Option<Node> {
    match inner.collection_type() {
        CollectionType::TableRows => row_after(&inner.root, None),
        _ => {
            let roots = property_roots(&inner.root);
            let first = property_after(inner, &roots, None);
            cache.property_roots = Some(roots);
            first
        }
    }
}

pub(super) fn item_after(
    inner: &CollectionInner,
    previous: &Node,
    cache: &CollectionCache,
) -> Option<Node> {
    match inner.collection_type() {
        CollectionType::TableRows => row_after(&inner.root, Some(previous)),
        _ => match &cache.property_roots {
            Some(roots) => property_after(inner, roots, Some(previous)),
            None => property_after(inner, &property_roots(&inner.root), Some(previous)),
        },
    }
}

// --- table rows --------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Head,
    Body,
    Foot,
}

fn children_after(table: &Node, after: Option<&Node>) -> impl Iterator<Item = Node> {
    let start = match after {
        Some(node) => node.next_sibling(),
        None => table.first_child(),
    };
    std::iter::successors(start, Node::next_sibling)
}

fn first_row_in(section: &Node) -> Option<Node> {
    section.child_iter().find(|child| child.has_tag_name("tr"))
}

fn next_row_sibling(row: &Node) -> Option<Node> {
    std::iter::successors(row.next_sibling(), Node::next_sibling).find(|n| n.has_tag_name("tr"))
}

fn row_after(table: &Node, previous: Option<&Node>) -> Option<Node> {
    // Where to resume: the section phase and the table child we were in
    let (mut phase, mut resume_after) = match previous {
        None => (Section::Head, None),
        Some(row) => {
            let parent = row.parent_node()?;
            if parent.ptr_eq(table) {
                (Section::Body, Some(row.clone()))
            } else {
                if let Some(next) = next_row_sibling(row) {
                    return Some(next);
                }
                let phase = if parent.has_tag_name("thead") {
                    Section::Head
                } else if parent.has_tag_name("tfoot") {
                    Section::Foot
                } else {
                    Section::Body
                };
                (phase, Some(parent))
            }
        }
    };

    loop {
        for child in children_after(table, resume_after.as_ref()) {
            let row = match phase {
                Section::Head if child.has_tag_name("thead") => first_row_in(&child),
                Section::Body if child.has_tag_name("tr") => Some(child.clone()),
                Section::Body if child.has_tag_name("tbody") => first_row_in(&child),
                Section::Foot if child.has_tag_name("tfoot") => first_row_in(&child),
                _ => None,
            };
            if row.is_some() {
                return row;
            }
        }
        phase = match phase {
            Section::Head => Section::Body,
            Section::Body => Section::Foot,
            Section::Foot => return None,
        };
        resume_after = None;
    }
}

// --- microdata properties ----------------------------------------------------

/// The item itself followed by its `itemref` targets, in document order.
/// Targets nested inside another walk root are dropped.
fn property_roots(item: &Node) -> Vec<Node> {
    let mut roots = vec![item.clone()];
    let refs = item.get_attribute("itemref").unwrap_or_default();
    if refs.is_empty() || !item.is_connected() {
        return roots;
    }
    let Some(document) = item.owner_document() else {
        return roots;
    };
    for token in refs.split_ascii_whitespace() {
        let Some(target) = document.get_element_by_id(token) else {
            continue;
        };
        if target.contains(item) || roots.iter().any(|root| root.contains(&target)) {
            continue;
        }
        roots.retain(|root| root.ptr_eq(item) || !target.contains(root));
        roots.push(target);
    }
    roots[1..].sort_by(document_order);
    roots
}

fn property_after(inner: &CollectionInner, roots: &[Node], previous: Option<&Node>) -> Option<Node> {
    let item = &inner.root;
    let (mut root_index, mut candidate) = match previous {
        None => (0, first_candidate(item, &roots[0])),
        Some(previous) => {
            let index = roots.iter().position(|root| root.contains(previous))?;
            let next = if !previous.ptr_eq(item) && previous.has_attribute("itemscope") {
                traversal::next_element_skipping_children(previous, Some(&roots[index]))
            } else {
                traversal::next_element(previous, Some(&roots[index]))
            };
            (index, next)
        }
    };

    loop {
        while let Some(element) = candidate {
            if inner.is_matching_element(&element) {
                return Some(element);
            }
            candidate = if element.has_attribute("itemscope") {
                traversal::next_element_skipping_children(&element, Some(&roots[root_index]))
            } else {
                traversal::next_element(&element, Some(&roots[root_index]))
            };
        }
        root_index += 1;
        let root = roots.get(root_index)?;
        candidate = first_candidate(item, root);
    }
}

/// The item's own subtree starts below it; a referenced root is itself a
/// candidate
fn first_candidate(item: &Node, root: &Node) -> Option<Node> {
    if root.ptr_eq(item) {
        traversal::first_element_within(root)
    } else {
        Some(root.clone())
    }
}

/// Tree order of two nodes in the same tree
fn document_order(a: &Node, b: &Node) -> Ordering {
    if a.ptr_eq(b) {
        return Ordering::Equal;
    }
    let mut a_path: Vec<Node> = a.inclusive_ancestors().collect();
    let mut b_path: Vec<Node> = b.inclusive_ancestors().collect();
    a_path.reverse();
    b_path.reverse();
    let shared = a_path
        .iter()
        .zip(&b_path)
        .take_while(|(x, y)| x.ptr_eq(y))
        .count();
    match (a_path.get(shared), b_path.get(shared)) {
        // One contains the other; the ancestor comes first
        (None, _) => Ordering::Less,
        (_, None) => Ordering::Greater,
        (Some(x), Some(y)) => {
            let x_first = std::iter::successors(x.next_sibling(), Node::next_sibling)
                .any(|sibling| sibling.ptr_eq(y));
            if x_first {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
    }
}
