//! Node rare data
//!
//! Lazily allocated side record for state few nodes need: live collections
//! registered against the node, mutation observer registrations, the
//! connected subframe counter and generated pseudo-elements.
//!
//! Rare data exists only while at least one of those is non-trivial. Every
//! removal path calls `clear_rare_data_if_empty` so the record is dropped as
//! soon as the last piece of state goes away.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::collection::{CollectionInner, CollectionType};
use crate::node::{NodeData, TreeLinks};
use crate::observer::Registration;
use crate::{Node, PseudoId};

#[derive(Default)]
pub(crate) struct RareData {
    pub(crate) node_lists: Option<Box<NodeListsNodeData>>,
    pub(crate) mutation_observers: Vec<Registration>,
    pub(crate) connected_subframe_count: u32,
    pub(crate) before: Option<Node>,
    pub(crate) after: Option<Node>,
}

impl RareData {
    fn is_empty(&self) -> bool {
        self.node_lists.is_none()
            && self.mutation_observers.is_empty()
            && self.connected_subframe_count == 0
            && self.before.is_none()
            && self.after.is_none()
    }
}

/// Registration key: a root holds at most one collection per key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CollectionKey {
    pub(crate) collection_type: CollectionType,
    pub(crate) name: Option<Box<str>>,
}

/// Non-owning registry of the live collections rooted at a node
#[derive(Default)]
pub(crate) struct NodeListsNodeData {
    caches: HashMap<CollectionKey, Weak<CollectionInner>>,
}

impl NodeListsNodeData {
    fn lookup(&self, key: &CollectionKey) -> Option<Rc<CollectionInner>> {
        self.caches.get(key).and_then(Weak::upgrade)
    }

    /// True if removing `key` leaves the registry empty
    fn is_last_list(&self, key: &CollectionKey) -> bool {
        self.caches.len() == 1 && self.caches.contains_key(key)
    }

    fn live(&self) -> Vec<Rc<CollectionInner>> {
        self.caches.values().filter_map(Weak::upgrade).collect()
    }
}

impl Node {
    /// Whether collections or observers are attached to this node
    pub fn has_rare_data(&self) -> bool {
        self.0.rare_data.borrow().is_some()
    }

    fn with_rare_data_mut<R>(&self, f: impl FnOnce(&mut RareData) -> R) -> R {
        let mut slot = self.0.rare_data.borrow_mut();
        f(slot.get_or_insert_with(Box::default))
    }

    pub(crate) fn clear_rare_data_if_empty(&self) {
        let dropped = {
            let mut slot = self.0.rare_data.borrow_mut();
            if slot.as_ref().is_some_and(|data| data.is_empty()) {
                slot.take()
            } else {
                None
            }
        };
        if dropped.is_some() {
            tracing::trace!("Dropped rare data of {:?}", self);
        }
    }

    // --- collection registrations ------------------------------------------

    /// Live collection already registered under `key`
    pub(crate) fn cached_collection(&self, key: &CollectionKey) -> Option<Rc<CollectionInner>> {
        let rare = self.0.rare_data.borrow();
        rare.as_ref()?.node_lists.as_ref()?.lookup(key)
    }

    pub(crate) fn register_collection(&self, key: CollectionKey, list: &Rc<CollectionInner>) {
        self.with_rare_data_mut(|rare| {
            let lists = rare.node_lists.get_or_insert_with(Box::default);
            let previous = lists.caches.insert(key, Rc::downgrade(list));
            debug_assert!(
                previous.is_none_or(|weak| weak.upgrade().is_none()),
                "two live collections registered under one key"
            );
        });
    }

    /// Called from the collection destructor
    pub(crate) fn unregister_collection(&self, key: &CollectionKey, list: *const CollectionInner) {
        {
            let mut slot = self.0.rare_data.borrow_mut();
            let Some(rare) = slot.as_mut() else {
                debug_assert!(false, "unregistering a collection from a node without rare data");
                return;
            };
            let Some(lists) = rare.node_lists.as_mut() else {
                debug_assert!(false, "unregistering a collection from a node without node lists");
                return;
            };
            // Only remove our own entry
            let ours = lists
                .caches
                .get(key)
                .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), list));
            if !ours {
                return;
            }
            if lists.is_last_list(key) {
                rare.node_lists = None;
            } else {
                lists.caches.remove(key);
            }
        }
        self.clear_rare_data_if_empty();
    }

    /// Strong references to every live collection registered on this node
    pub(crate) fn registered_collections(&self) -> Vec<Rc<CollectionInner>> {
        let rare = self.0.rare_data.borrow();
        rare.as_ref()
            .and_then(|rare| rare.node_lists.as_ref())
            .map(|lists| lists.live())
            .unwrap_or_default()
    }

    pub(crate) fn has_registered_collections(&self) -> bool {
        let rare = self.0.rare_data.borrow();
        rare.as_ref().is_some_and(|rare| rare.node_lists.is_some())
    }

    // --- mutation observers -------------------------------------------------

    pub(crate) fn add_observer_registration(&self, registration: Registration) {
        self.with_rare_data_mut(|rare| {
            let existing = rare
                .mutation_observers
                .iter_mut()
                .find(|r| r.observer.ptr_eq(&registration.observer));
            match existing {
                Some(existing) => existing.options = registration.options,
                None => rare.mutation_observers.push(registration),
            }
        });
    }

    pub(crate) fn remove_observer_registration(&self, observer: &crate::MutationObserver) {
        if let Some(rare) = self.0.rare_data.borrow_mut().as_mut() {
            rare.mutation_observers.retain(|r| !r.observer.ptr_eq(observer));
        }
        self.clear_rare_data_if_empty();
    }

    pub(crate) fn observer_registrations(&self) -> Vec<Registration> {
        let rare = self.0.rare_data.borrow();
        rare.as_ref()
            .map(|rare| rare.mutation_observers.clone())
            .unwrap_or_default()
    }

    // --- subframes ----------------------------------------------------------

    pub fn connected_subframe_count(&self) -> u32 {
        let rare = self.0.rare_data.borrow();
        rare.as_ref().map_or(0, |rare| rare.connected_subframe_count)
    }

    pub fn increment_connected_subframe_count(&self, amount: u32) {
        self.with_rare_data_mut(|rare| rare.connected_subframe_count += amount);
    }

    pub fn decrement_connected_subframe_count(&self, amount: u32) {
        {
            let mut slot = self.0.rare_data.borrow_mut();
            let Some(rare) = slot.as_mut() else {
                debug_assert!(amount == 0, "subframe count underflow");
                return;
            };
            debug_assert!(rare.connected_subframe_count >= amount, "subframe count underflow");
            rare.connected_subframe_count = rare.connected_subframe_count.saturating_sub(amount);
        }
        self.clear_rare_data_if_empty();
    }

    // --- pseudo-elements ----------------------------------------------------

    pub fn pseudo_element(&self, id: PseudoId) -> Option<Node> {
        let rare = self.0.rare_data.borrow();
        let rare = rare.as_ref()?;
        match id {
            PseudoId::Before => rare.before.clone(),
            PseudoId::After => rare.after.clone(),
        }
    }

    /// Create the pseudo-element on first use. Its parent link points at
    /// the host but it is never part of the host's child list.
    pub fn ensure_pseudo_element(&self, id: PseudoId) -> Node {
        debug_assert!(self.is_element(), "pseudo-elements hang off elements");
        if let Some(existing) = self.pseudo_element(id) {
            return existing;
        }
        let pseudo = Node(Rc::new(crate::node::NodeInner {
            data: NodeData::PseudoElement(id),
            links: std::cell::RefCell::new(TreeLinks {
                parent: self.downgrade(),
                ..TreeLinks::default()
            }),
            document: std::cell::RefCell::new(self.0.document.borrow().clone()),
            rare_data: std::cell::RefCell::new(None),
        }));
        self.with_rare_data_mut(|rare| match id {
            PseudoId::Before => rare.before = Some(pseudo.clone()),
            PseudoId::After => rare.after = Some(pseudo.clone()),
        });
        pseudo
    }

    pub fn clear_pseudo_element(&self, id: PseudoId) {
        let removed = self.0.rare_data.borrow_mut().as_mut().and_then(|rare| match id {
            PseudoId::Before => rare.before.take(),
            PseudoId::After => rare.after.take(),
        });
        if let Some(pseudo) = removed {
            pseudo.links_mut().parent = Weak::new();
        }
        self.clear_rare_data_if_empty();
    }
}
