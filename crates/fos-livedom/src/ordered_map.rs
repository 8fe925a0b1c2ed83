//! Document id/name hash
//!
//! Counts how many connected elements carry a given id (or name) and
//! lazily caches the first one in document order. A count above one tells
//! callers that a direct lookup is ambiguous and they must scan instead.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::node::WeakNode;
use crate::{traversal, Node};

#[derive(Debug)]
struct MapEntry {
    /// First element in document order, when known
    element: Option<WeakNode>,
    count: usize,
}

/// Key -> element(s) map maintained by the mutation layer
#[derive(Debug, Default)]
pub(crate) struct DocumentOrderedMap {
    map: RefCell<HashMap<Box<str>, MapEntry>>,
}

impl DocumentOrderedMap {
    pub(crate) fn add(&self, key: &str, element: &Node) {
        debug_assert!(!key.is_empty());
        let mut map = self.map.borrow_mut();
        match map.get_mut(key) {
            Some(entry) => {
                // Can't tell which one comes first without a walk
                entry.element = None;
                entry.count += 1;
            }
            None => {
                map.insert(
                    key.into(),
                    MapEntry {
                        element: Some(element.downgrade()),
                        count: 1,
                    },
                );
            }
        }
    }

    pub(crate) fn remove(&self, key: &str, element: &Node) {
        let mut map = self.map.borrow_mut();
        let Some(entry) = map.get_mut(key) else {
            debug_assert!(false, "removing unknown key {key:?}");
            return;
        };
        if entry.count <= 1 {
            map.remove(key);
            return;
        }
        let cached_is_element = entry
            .element
            .as_ref()
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), std::rc::Rc::as_ptr(&element.0)));
        if cached_is_element {
            entry.element = None;
        }
        entry.count -= 1;
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.map.borrow().contains_key(key)
    }

    pub(crate) fn contains_multiple(&self, key: &str) -> bool {
        self.count(key) > 1
    }

    pub(crate) fn count(&self, key: &str) -> usize {
        self.map.borrow().get(key).map_or(0, |entry| entry.count)
    }

    /// First element under `scope` for which `has_key` holds
    pub(crate) fn get(
        &self,
        key: &str,
        scope: &Node,
        has_key: impl Fn(&Node, &str) -> bool,
    ) -> Option<Node> {
        {
            let map = self.map.borrow();
            let entry = map.get(key)?;
            if let Some(element) = entry.element.as_ref().and_then(Node::from_weak) {
                return Some(element);
            }
        }
        let mut current = traversal::first_element_within(scope);
        while let Some(element) = current {
            if has_key(&element, key) {
                if let Some(entry) = self.map.borrow_mut().get_mut(key) {
                    entry.element = Some(element.downgrade());
                }
                return Some(element);
            }
            current = traversal::next_element(&element, Some(scope));
        }
        debug_assert!(false, "id/name map out of sync for {key:?}");
        None
    }
}
