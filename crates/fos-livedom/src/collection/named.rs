//! Named-item lookup
//!
//! HTML collections answer `namedItem(name)` from a lazily built index of
//! their members' ids and names. When the document's id/name hash says a
//! key is unambiguous, the single candidate is checked directly instead.
//! Node lists keep no index and match by id only.

use std::collections::HashMap;

use super::{form, CollectionInner, CollectionType};
use crate::Node;

/// Member positions by id and by name
#[derive(Default)]
pub(crate) struct NamedItemIndex {
    ids: HashMap<Box<str>, Vec<(usize, Node)>>,
    names: HashMap<Box<str>, Vec<(usize, Node)>>,
    /// Keys in first-seen order
    id_order: Vec<Box<str>>,
    name_order: Vec<Box<str>>,
}

impl NamedItemIndex {
    fn add_id(&mut self, id: &str, position: usize, element: &Node) {
        Self::add(&mut self.ids, &mut self.id_order, id, position, element);
    }

    fn add_name(&mut self, name: &str, position: usize, element: &Node) {
        Self::add(&mut self.names, &mut self.name_order, name, position, element);
    }

    fn add(
        map: &mut HashMap<Box<str>, Vec<(usize, Node)>>,
        order: &mut Vec<Box<str>>,
        key: &str,
        position: usize,
        element: &Node,
    ) {
        match map.get_mut(key) {
            Some(entries) => entries.push((position, element.clone())),
            None => {
                map.insert(key.into(), vec![(position, element.clone())]);
                order.push(key.into());
            }
        }
    }

    /// First id match, else first name match
    fn first(&self, key: &str) -> Option<Node> {
        self.ids
            .get(key)
            .or_else(|| self.names.get(key))
            .and_then(|entries| entries.first())
            .map(|(_, element)| element.clone())
    }

    /// Id and name matches merged back into collection order
    fn all(&self, key: &str) -> Vec<Node> {
        let by_id = self.ids.get(key).map(Vec::as_slice).unwrap_or_default();
        let by_name = self.names.get(key).map(Vec::as_slice).unwrap_or_default();
        let mut merged: Vec<&(usize, Node)> = by_id.iter().chain(by_name).collect();
        merged.sort_by_key(|(position, _)| *position);
        // An element can be listed under both only if its id equals its
        // name, which the builder never records twice
        merged.into_iter().map(|(_, element)| element.clone()).collect()
    }

    fn names(&self) -> Vec<String> {
        let mut out: Vec<String> = self.id_order.iter().map(|k| k.to_string()).collect();
        for name in &self.name_order {
            if !self.ids.contains_key(name) {
                out.push(name.to_string());
            }
        }
        out
    }

    fn len(&self) -> usize {
        self.ids.len() + self.names.len()
    }
}

enum FastPath {
    Found(Node),
    Absent,
    Unknown,
}

impl CollectionInner {
    pub(crate) fn named_item(&self, name: &str) -> Option<Node> {
        if name.is_empty() {
            return None;
        }
        match self.named_item_fast_path(name) {
            FastPath::Found(element) => return Some(element),
            FastPath::Absent => return None,
            FastPath::Unknown => {}
        }
        if !self.has_named_item_index() {
            return self.members_with_id(name).into_iter().next();
        }
        self.with_named_index(|index| index.first(name))
    }

    pub(crate) fn named_items(&self, name: &str) -> Vec<Node> {
        if name.is_empty() {
            return Vec::new();
        }
        if !self.has_named_item_index() {
            return self.members_with_id(name);
        }
        self.with_named_index(|index| index.all(name))
    }

    pub(crate) fn supported_names(&self) -> Vec<String> {
        if self.has_named_item_index() {
            return self.with_named_index(NamedItemIndex::names);
        }
        let mut names: Vec<String> = Vec::new();
        for element in self.members() {
            if let Some(id) = element.id() {
                if !names.contains(&id) {
                    names.push(id);
                }
            }
        }
        names
    }

    /// Members read through the item cache
    fn members(&self) -> impl Iterator<Item = Node> + '_ {
        (0..).map_while(move |offset| self.item(offset))
    }

    fn members_with_id(&self, id: &str) -> Vec<Node> {
        self.members()
            .filter(|element| element.attribute_equals("id", id))
            .collect()
    }

    fn named_item_fast_path(&self, name: &str) -> FastPath {
        if self.overrides_item_after() || !self.config_flag(|config| config.named_item_fast_path) {
            return FastPath::Unknown;
        }
        let Some(root) = self.root_container() else {
            return FastPath::Absent;
        };
        if !root.is_connected() {
            return FastPath::Unknown;
        }
        let Some(document) = root.owner_document() else {
            return FastPath::Unknown;
        };
        let data = document.data();

        let candidate = if data.ids.contains(name) {
            if data.ids.contains_multiple(name) {
                None
            } else {
                document.get_element_by_id(name)
            }
        } else if self.has_named_item_index() && data.names.contains(name) {
            if data.names.contains_multiple(name) {
                None
            } else {
                // Only HTML elements are indexed by name
                document.first_element_by_name(name).filter(|candidate| {
                    candidate.is_html_element()
                        && (self.collection_type() != CollectionType::DocAll
                            || form::name_visible_in_document_all(candidate))
                })
            }
        } else {
            return FastPath::Absent;
        };

        let Some(candidate) = candidate else {
            return FastPath::Unknown;
        };
        let in_scope = if self.only_direct_children() {
            candidate.parent_node().is_some_and(|parent| parent.ptr_eq(&root))
        } else {
            candidate.is_descendant_of(&root)
        };
        if in_scope && self.is_matching_element(&candidate) {
            FastPath::Found(candidate)
        } else {
            FastPath::Unknown
        }
    }

    fn with_named_index<R>(&self, f: impl FnOnce(&NamedItemIndex) -> R) -> R {
        {
            let cache = self.cache.borrow();
            if let Some(index) = &cache.named {
                return f(index);
            }
        }
        let index = self.build_named_index();
        let result = f(&index);
        self.cache.borrow_mut().named = Some(index);
        result
    }

    fn build_named_index(&self) -> NamedItemIndex {
        let mut index = NamedItemIndex::default();
        let collection_type = self.collection_type();
        for (position, element) in self.collect_uncached().into_iter().enumerate() {
            if collection_type == CollectionType::ItemProperties {
                let tokens = element.get_attribute("itemprop").unwrap_or_default();
                for token in tokens.split_ascii_whitespace() {
                    index.add_name(token, position, &element);
                }
                continue;
            }

            let id = element.id();
            if let Some(id) = &id {
                index.add_id(id, position, &element);
            }
            if !element.is_html_element() {
                continue;
            }
            if let Some(name) = element.name_attribute() {
                if id.as_deref() != Some(name.as_str())
                    && (collection_type != CollectionType::DocAll
                        || form::name_visible_in_document_all(&element))
                {
                    index.add_name(&name, position, &element);
                }
            }
        }
        tracing::trace!(
            collection = ?collection_type,
            keys = index.len(),
            "Built named item index"
        );
        index
    }
}
