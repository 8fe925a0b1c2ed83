//! Cache invalidation hooks
//!
//! The mutation layer reports every change here. Each hook first asks the
//! owner document whether any registered collection could care (one counter
//! per invalidation category), then resets the collections rooted at
//! document scope and those registered on the inclusive ancestors of the
//! change.
//!
//! The hooks only touch collection caches. They are safe to call more than
//! once for the same change.

use crate::collection::CollectionInner;
use crate::{traversal, Document, Node};

/// What happened to a container's child list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildrenChangeKind {
    ElementInserted,
    ElementRemoved,
    NonElementInserted,
    NonElementRemoved,
    AllChildrenRemoved,
    /// Character data of a child changed
    TextChanged,
}

impl ChildrenChangeKind {
    /// No element entered or left the child list
    pub fn affects_only_non_elements(self) -> bool {
        matches!(
            self,
            ChildrenChangeKind::NonElementInserted
                | ChildrenChangeKind::NonElementRemoved
                | ChildrenChangeKind::TextChanged
        )
    }
}

#[derive(Clone, Copy)]
enum Change<'a> {
    Children(ChildrenChangeKind),
    Attribute(&'a str),
}

impl<'a> Change<'a> {
    fn attr(self) -> Option<&'a str> {
        match self {
            Change::Children(_) => None,
            Change::Attribute(name) => Some(name),
        }
    }
}

/// Children of `container` were inserted, removed or edited
pub fn notify_children_changed(container: &Node, kind: ChildrenChangeKind) {
    tracing::trace!(?container, ?kind, "Children changed");
    invalidate_node_list_caches_in_ancestors(container, Change::Children(kind));
}

/// Attribute `name` of `element` went from `old_value` to `new_value`.
/// `None` means absent.
pub fn notify_attribute_changed(
    element: &Node,
    name: &str,
    old_value: Option<&str>,
    new_value: Option<&str>,
) {
    if !element.is_element() || old_value == new_value {
        return;
    }
    tracing::trace!(?element, name, ?old_value, ?new_value, "Attribute changed");
    invalidate_node_list_caches_in_ancestors(element, Change::Attribute(name));
}

/// `subtree_root` moved from `old_document` to `new_document`. Collections
/// rooted anywhere in the subtree move their counters across and reset.
pub fn notify_subtree_adopted(subtree_root: &Node, old_document: &Document, new_document: &Document) {
    if old_document == new_document {
        return;
    }
    move_subtree_collections(subtree_root, new_document);
}

/// Re-register every collection rooted in the subtree with `new_document`
pub(crate) fn move_subtree_collections(subtree_root: &Node, new_document: &Document) {
    let mut moved = 0usize;
    let mut current = Some(subtree_root.clone());
    while let Some(node) = current {
        if node.has_registered_collections() {
            for list in node.registered_collections() {
                list.did_move_to_document(new_document.as_node());
                moved += 1;
            }
        }
        current = traversal::next(&node, Some(subtree_root));
    }
    tracing::debug!(?subtree_root, moved, "Adopted subtree into new document");
}

fn invalidate_node_list_caches_in_ancestors(start: &Node, change: Change<'_>) {
    let attr = change.attr();
    let document = start.owner_document();
    let fine_grained = document
        .as_ref()
        .is_some_and(|document| document.data().with_config(|c| c.fine_grained_child_invalidation));

    if let Some(document) = &document {
        let data = document.data();
        if !data.should_invalidate_node_list_caches(attr) {
            return;
        }
        for list in data.lists_invalidated_at_document() {
            if !skipped_for(&list, change, fine_grained) {
                list.invalidate_cache(attr);
            }
        }
    }

    // Direct-children collections only see the node whose child list
    // changed: the container itself, or the parent of an attribute's element
    let local_depth = match change {
        Change::Children(_) => 0,
        Change::Attribute(_) => 1,
    };
    for (depth, node) in start.inclusive_ancestors().enumerate() {
        if !node.has_registered_collections() {
            continue;
        }
        for list in node.registered_collections() {
            if list.only_direct_children() && depth != local_depth {
                continue;
            }
            if skipped_for(&list, change, fine_grained) {
                continue;
            }
            list.invalidate_cache(attr);
        }
    }
}

/// Element-only collections ignore child-list changes that moved no element
fn skipped_for(list: &CollectionInner, change: Change<'_>, fine_grained: bool) -> bool {
    let Change::Children(kind) = change else {
        return false;
    };
    let collection_type = list.collection_type();
    fine_grained
        && kind.affects_only_non_elements()
        && collection_type.is_element_only()
        && !collection_type.depends_on_text()
}
