//! DOM Node Operations
//!
//! Core node manipulation: appendChild, insertBefore, removeChild,
//! replaceChild, attribute and character data updates, adoption. Every
//! operation links the tree first, then keeps the document id/name hash in
//! step, then reports to the invalidation hooks and mutation observers.

use crate::error::DomResult;
use crate::invalidation::{self, ChildrenChangeKind};
use crate::observer::{queue_mutation_record, MutationRecord};
use crate::{traversal, tree, Document, DomError, Node, PseudoId};

fn ensure_pre_insertion_validity(parent: &Node, child: &Node, reference: Option<&Node>) -> DomResult<()> {
    if !parent.is_container() {
        return Err(DomError::HierarchyRequest("parent cannot have children"));
    }
    if child.is_document() {
        return Err(DomError::HierarchyRequest("a document cannot be inserted"));
    }
    if child.is_pseudo_element() {
        return Err(DomError::InvalidNodeType("pseudo-elements are not part of a child list"));
    }
    if child.contains(parent) {
        return Err(DomError::HierarchyRequest("node is an inclusive ancestor of the parent"));
    }
    if let Some(reference) = reference {
        if reference.parent_node().as_ref() != Some(parent) {
            return Err(DomError::NotFound("reference node is not a child of this node"));
        }
    }
    if parent.is_document() {
        if child.is_text() {
            return Err(DomError::HierarchyRequest("a document cannot hold text"));
        }
        let has_other_root = traversal::first_element_child(parent).is_some_and(|root| !root.ptr_eq(child));
        if child.is_element() && has_other_root {
            return Err(DomError::HierarchyRequest("document already has a root element"));
        }
    }
    Ok(())
}

fn children_change_kind(child: &Node, inserted: bool) -> ChildrenChangeKind {
    match (child.is_element(), inserted) {
        (true, true) => ChildrenChangeKind::ElementInserted,
        (true, false) => ChildrenChangeKind::ElementRemoved,
        (false, true) => ChildrenChangeKind::NonElementInserted,
        (false, false) => ChildrenChangeKind::NonElementRemoved,
    }
}

fn validate_attribute_name(name: &str) -> DomResult<()> {
    let invalid = name.is_empty()
        || name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '/' | '=' | '\0'));
    if invalid {
        return Err(DomError::InvalidCharacter(name.to_owned()));
    }
    Ok(())
}

// --- id/name bookkeeping ------------------------------------------------------

fn for_each_element_in(root: &Node, mut f: impl FnMut(&Node)) {
    if root.is_element() {
        f(root);
    }
    let mut current = traversal::first_element_within(root);
    while let Some(element) = current {
        f(&element);
        current = traversal::next_element(&element, Some(root));
    }
}

/// A subtree became connected
fn add_named_elements(document: &Document, subtree: &Node) {
    let data = document.data();
    for_each_element_in(subtree, |element| {
        if let Some(id) = element.id() {
            data.ids.add(&id, element);
        }
        if let Some(name) = element.name_attribute() {
            data.names.add(&name, element);
        }
    });
}

/// A subtree is about to be disconnected
fn remove_named_elements(document: &Document, subtree: &Node) {
    let data = document.data();
    for_each_element_in(subtree, |element| {
        if let Some(id) = element.id() {
            data.ids.remove(&id, element);
        }
        if let Some(name) = element.name_attribute() {
            data.names.remove(&name, element);
        }
    });
}

impl Node {
    fn update_named_maps(&self, name: &str, old_value: Option<&str>, new_value: Option<&str>) {
        if old_value == new_value || !matches!(name, "id" | "name") || !self.is_connected() {
            return;
        }
        let Some(document) = self.owner_document() else {
            return;
        };
        let data = document.data();
        let map = if name == "id" { &data.ids } else { &data.names };
        if let Some(old) = old_value.filter(|v| !v.is_empty()) {
            map.remove(old, self);
        }
        if let Some(new) = new_value.filter(|v| !v.is_empty()) {
            map.add(new, self);
        }
    }

    // --- child list ---------------------------------------------------------

    /// Append `child`, moving it from its current parent or document
    pub fn append_child(&self, child: &Node) -> DomResult<Node> {
        self.insert_before(child, None)
    }

    /// Insert `child` before `reference`, or at the end for `None`. A
    /// fragment inserts its children instead.
    pub fn insert_before(&self, child: &Node, reference: Option<&Node>) -> DomResult<Node> {
        ensure_pre_insertion_validity(self, child, reference)?;
        let reference = match reference {
            Some(reference) if reference.ptr_eq(child) => child.next_sibling(),
            other => other.cloned(),
        };

        let nodes = if child.node_type() == crate::NodeType::DocumentFragment {
            let nodes: Vec<Node> = child.child_iter().collect();
            for node in &nodes {
                remove_child_unchecked(child, node);
            }
            nodes
        } else {
            if let Some(old_parent) = child.parent_node() {
                remove_child_unchecked(&old_parent, child);
            }
            vec![child.clone()]
        };
        if nodes.is_empty() {
            return Ok(child.clone());
        }

        let document = self.owner_document();
        if let Some(document) = &document {
            for node in &nodes {
                adopt_detached(document, node);
            }
        }
        let connected = self.is_connected();
        let previous_sibling = match &reference {
            Some(reference) => reference.previous_sibling(),
            None => self.last_child(),
        };

        for node in &nodes {
            match &reference {
                Some(reference) => tree::insert_before(self, node, reference),
                None => tree::append(self, node),
            }
            if connected {
                if let Some(document) = &document {
                    add_named_elements(document, node);
                }
            }
            invalidation::notify_children_changed(self, children_change_kind(node, true));
        }
        tracing::trace!(parent = ?self, count = nodes.len(), "Inserted children");

        queue_mutation_record(MutationRecord::child_list(self, nodes, Vec::new(), previous_sibling, reference));
        Ok(child.clone())
    }

    pub fn remove_child(&self, child: &Node) -> DomResult<Node> {
        if child.parent_node().as_ref() != Some(self) {
            return Err(DomError::NotFound("node is not a child of this node"));
        }
        remove_child_unchecked(self, child);
        Ok(child.clone())
    }

    /// Detach from the parent, if any
    pub fn remove(&self) {
        if let Some(parent) = self.parent_node() {
            remove_child_unchecked(&parent, self);
        }
    }

    /// Put `new_child` where `old_child` is
    pub fn replace_child(&self, new_child: &Node, old_child: &Node) -> DomResult<Node> {
        if old_child.parent_node().as_ref() != Some(self) {
            return Err(DomError::NotFound("node is not a child of this node"));
        }
        if new_child.ptr_eq(old_child) {
            return Ok(old_child.clone());
        }
        self.insert_before(new_child, Some(old_child))?;
        remove_child_unchecked(self, old_child);
        Ok(old_child.clone())
    }

    /// Remove every child, reported as a single change
    pub fn remove_all_children(&self) {
        let removed: Vec<Node> = self.child_iter().collect();
        if removed.is_empty() {
            return;
        }
        if self.is_connected() {
            if let Some(document) = self.owner_document() {
                for child in &removed {
                    remove_named_elements(&document, child);
                }
            }
        }
        for child in &removed {
            tree::detach(child);
        }
        invalidation::notify_children_changed(self, ChildrenChangeKind::AllChildrenRemoved);
        tracing::trace!(parent = ?self, count = removed.len(), "Removed all children");
        queue_mutation_record(MutationRecord::child_list(self, Vec::new(), removed, None, None));
    }

    // --- attributes ---------------------------------------------------------

    pub fn set_attribute(&self, name: &str, value: &str) -> DomResult<()> {
        validate_attribute_name(name)?;
        let (name, old_value) = self
            .set_attribute_raw(name, value)
            .ok_or(DomError::InvalidNodeType("attributes live on elements"))?;
        self.update_named_maps(&name, old_value.as_deref(), Some(value));
        invalidation::notify_attribute_changed(self, &name, old_value.as_deref(), Some(value));
        queue_mutation_record(MutationRecord::attributes(self, &name, old_value));
        Ok(())
    }

    /// Remove an attribute, returning its old value
    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        let (name, old_value) = self.remove_attribute_raw(name)?;
        self.update_named_maps(&name, Some(&old_value), None);
        invalidation::notify_attribute_changed(self, &name, Some(&old_value), None);
        queue_mutation_record(MutationRecord::attributes(self, &name, Some(old_value.clone())));
        Some(old_value)
    }

    // --- character data -----------------------------------------------------

    pub fn set_character_data(&self, data: &str) -> DomResult<()> {
        let cell = self
            .character_data_cell()
            .ok_or(DomError::InvalidNodeType("not a text or comment node"))?;
        let old_value = std::mem::replace(&mut *cell.borrow_mut(), data.to_owned());
        if let Some(parent) = self.parent_node() {
            invalidation::notify_children_changed(&parent, ChildrenChangeKind::TextChanged);
        }
        queue_mutation_record(MutationRecord::character_data(self, old_value));
        Ok(())
    }
}

fn remove_child_unchecked(parent: &Node, child: &Node) {
    if parent.is_connected() {
        if let Some(document) = parent.owner_document() {
            remove_named_elements(&document, child);
        }
    }
    let previous_sibling = child.previous_sibling();
    let next_sibling = child.next_sibling();
    tree::detach(child);
    invalidation::notify_children_changed(parent, children_change_kind(child, false));
    tracing::trace!(?parent, ?child, "Removed child");
    queue_mutation_record(MutationRecord::child_list(
        parent,
        Vec::new(),
        vec![child.clone()],
        previous_sibling,
        next_sibling,
    ));
}

/// Move a detached subtree into `document`
fn adopt_detached(document: &Document, node: &Node) {
    debug_assert!(node.parent_node().is_none());
    let old_document = node.owner_document();
    if old_document.as_ref() == Some(document) {
        return;
    }
    let new_owner = document.as_node().downgrade();
    let mut current = Some(node.clone());
    while let Some(descendant) = current {
        *descendant.0.document.borrow_mut() = new_owner.clone();
        for id in [PseudoId::Before, PseudoId::After] {
            if let Some(pseudo) = descendant.pseudo_element(id) {
                *pseudo.0.document.borrow_mut() = new_owner.clone();
            }
        }
        current = traversal::next(&descendant, Some(node));
    }
    match &old_document {
        Some(old_document) => invalidation::notify_subtree_adopted(node, old_document, document),
        None => invalidation::move_subtree_collections(node, document),
    }
}

impl Document {
    /// Take `node` (and its subtree) out of its tree and into this document
    pub fn adopt_node(&self, node: &Node) -> DomResult<Node> {
        if node.is_document() {
            return Err(DomError::WrongDocument("a document cannot be adopted"));
        }
        if node.is_pseudo_element() {
            return Err(DomError::InvalidNodeType("pseudo-elements follow their host"));
        }
        node.remove();
        adopt_detached(self, node);
        tracing::debug!(?node, "Adopted node");
        Ok(node.clone())
    }
}
