//! Mutation observers
//!
//! Registrations live in the observed node's rare data. The mutation layer
//! walks the inclusive ancestors of a mutated node and queues one record per
//! interested observer.

use std::cell::RefCell;
use std::rc::Rc;

use crate::node::WeakNode;
use crate::Node;

/// Mutation observer options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub character_data: bool,
    pub subtree: bool,
    pub attribute_old_value: bool,
    pub character_data_old_value: bool,
    pub attribute_filter: Option<Vec<String>>,
}

/// Mutation record
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: Node,
    pub added_nodes: Vec<Node>,
    pub removed_nodes: Vec<Node>,
    pub previous_sibling: Option<Node>,
    pub next_sibling: Option<Node>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    CharacterData,
    ChildList,
}

impl MutationRecord {
    pub(crate) fn child_list(
        target: &Node,
        added_nodes: Vec<Node>,
        removed_nodes: Vec<Node>,
        previous_sibling: Option<Node>,
        next_sibling: Option<Node>,
    ) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target: target.clone(),
            added_nodes,
            removed_nodes,
            previous_sibling,
            next_sibling,
            attribute_name: None,
            old_value: None,
        }
    }

    pub(crate) fn attributes(target: &Node, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target: target.clone(),
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: Some(name.to_owned()),
            old_value,
        }
    }

    pub(crate) fn character_data(target: &Node, old_value: String) -> Self {
        Self {
            mutation_type: MutationType::CharacterData,
            target: target.clone(),
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: None,
            old_value: Some(old_value),
        }
    }
}

#[derive(Debug)]
struct ObserverState {
    callback_id: u32,
    observed: Vec<WeakNode>,
    records: Vec<MutationRecord>,
}

/// Mutation observer handle
#[derive(Debug, Clone)]
pub struct MutationObserver(Rc<RefCell<ObserverState>>);

/// One observer registered on one node
#[derive(Debug, Clone)]
pub(crate) struct Registration {
    pub(crate) observer: MutationObserver,
    pub(crate) options: MutationObserverInit,
}

impl Registration {
    /// Whether this registration wants `record`, observed from `node`
    fn interested(&self, node: &Node, record: &MutationRecord) -> bool {
        if !node.ptr_eq(&record.target) && !self.options.subtree {
            return false;
        }
        match record.mutation_type {
            MutationType::ChildList => self.options.child_list,
            MutationType::CharacterData => self.options.character_data,
            MutationType::Attributes => {
                if !self.options.attributes {
                    return false;
                }
                match (&self.options.attribute_filter, &record.attribute_name) {
                    (Some(filter), Some(name)) => filter.iter().any(|f| f == name),
                    _ => true,
                }
            }
        }
    }

    fn wants_old_value(&self, mutation_type: MutationType) -> bool {
        match mutation_type {
            MutationType::Attributes => self.options.attribute_old_value,
            MutationType::CharacterData => self.options.character_data_old_value,
            MutationType::ChildList => false,
        }
    }
}

impl MutationObserver {
    pub fn new(callback_id: u32) -> Self {
        Self(Rc::new(RefCell::new(ObserverState {
            callback_id,
            observed: Vec::new(),
            records: Vec::new(),
        })))
    }

    pub fn callback_id(&self) -> u32 {
        self.0.borrow().callback_id
    }

    pub(crate) fn ptr_eq(&self, other: &MutationObserver) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Observe `target`; observing the same node again replaces the options
    pub fn observe(&self, target: &Node, options: MutationObserverInit) {
        target.add_observer_registration(Registration {
            observer: self.clone(),
            options,
        });
        let mut state = self.0.borrow_mut();
        state.observed.retain(|weak| weak.strong_count() > 0);
        if !state.observed.iter().any(|weak| std::ptr::eq(weak.as_ptr(), Rc::as_ptr(&target.0))) {
            state.observed.push(target.downgrade());
        }
    }

    /// Stop observing every node and drop pending records
    pub fn disconnect(&self) {
        let observed = {
            let mut state = self.0.borrow_mut();
            state.records.clear();
            std::mem::take(&mut state.observed)
        };
        for node in observed.iter().filter_map(Node::from_weak) {
            node.remove_observer_registration(self);
        }
    }

    pub fn take_records(&self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.0.borrow_mut().records)
    }

    pub fn pending_records(&self) -> usize {
        self.0.borrow().records.len()
    }

    fn enqueue(&self, record: MutationRecord) {
        self.0.borrow_mut().records.push(record);
    }
}

/// Deliver `record` to every observer registered on an inclusive ancestor
/// of its target. Each observer receives the record at most once.
pub(crate) fn queue_mutation_record(record: MutationRecord) {
    let mut recipients: Vec<(MutationObserver, bool)> = Vec::new();
    for node in record.target.inclusive_ancestors() {
        if !node.has_rare_data() {
            continue;
        }
        for registration in node.observer_registrations() {
            if !registration.interested(&node, &record) {
                continue;
            }
            let old_value = registration.wants_old_value(record.mutation_type);
            match recipients.iter_mut().find(|(o, _)| o.ptr_eq(&registration.observer)) {
                Some((_, wants)) => *wants |= old_value,
                None => recipients.push((registration.observer, old_value)),
            }
        }
    }
    for (observer, wants_old_value) in recipients {
        let mut delivered = record.clone();
        if !wants_old_value && delivered.mutation_type != MutationType::ChildList {
            delivered.old_value = None;
        }
        observer.enqueue(delivered);
    }
}
