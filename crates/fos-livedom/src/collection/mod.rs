//! Live collections
//!
//! A `LiveCollection` is a view over the elements (or, for `childNodes`, the
//! nodes) below a root that satisfy a predicate, in document order. Nothing
//! is materialised: the collection remembers one (item, offset) pair and its
//! length, and answers `item(n)` by walking from whichever known position is
//! nearest. The mutation layer resets those caches through
//! `invalidate_cache`.
//!
//! Collections are interned per (root, type, qualifying name) in the root's
//! rare data, so asking twice yields the same object for as long as a handle
//! is alive.

mod form;
mod kind;
mod named;
mod ordered;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub use kind::{CollectionType, InvalidationCategory, RootType};

use crate::node::WeakNode;
use crate::rare_data::CollectionKey;
use crate::{traversal, DomError, DomResult, LiveDomConfig, Node};

/// Snapshot of a collection's cache, for inspection and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheState {
    /// Offset of the cached item, when the item cache is valid
    pub cached_offset: Option<usize>,
    /// Cached length, when known
    pub cached_length: Option<usize>,
    pub named_index_valid: bool,
}

#[derive(Default)]
struct CollectionCache {
    current_item: Option<Node>,
    cached_offset: usize,
    cached_length: usize,
    length_valid: bool,
    named: Option<named::NamedItemIndex>,
    /// Microdata walk roots, refreshed with the first item
    property_roots: Option<Vec<Node>>,
}

impl CollectionCache {
    #[inline]
    fn item_valid(&self) -> bool {
        self.current_item.is_some()
    }

    fn set_item(&mut self, item: Node, offset: usize) {
        self.current_item = Some(item);
        self.cached_offset = offset;
    }

    fn set_length(&mut self, length: usize) {
        self.cached_length = length;
        self.length_valid = true;
    }

    fn is_first_item_closer(&self, offset: usize) -> bool {
        if offset > self.cached_offset {
            return false;
        }
        offset < self.cached_offset - offset
    }

    /// Only meaningful while the length is known and `offset` is in range
    fn is_last_item_closer(&self, offset: usize) -> bool {
        let distance_from_last = self.cached_length - offset;
        if !self.item_valid() {
            return distance_from_last < offset;
        }
        self.cached_offset < offset && distance_from_last < offset - self.cached_offset
    }
}

pub(crate) struct CollectionInner {
    root: Node,
    key: CollectionKey,
    /// Lowercased tag name for HTML elements
    lowered_name: Option<Box<str>>,
    class_names: Vec<Box<str>>,
    root_type: RootType,
    /// Document whose counters include this collection
    registered_document: RefCell<WeakNode>,
    cache: RefCell<CollectionCache>,
}

impl CollectionInner {
    fn new(root: &Node, collection_type: CollectionType, name: Option<&str>) -> Self {
        let lowered_name = match (collection_type, name) {
            (CollectionType::TagNodeList, Some(name)) => Some(name.to_ascii_lowercase().into()),
            _ => None,
        };
        let class_names = match (collection_type, name) {
            (CollectionType::ClassNodeList, Some(names)) => {
                names.split_ascii_whitespace().map(Into::into).collect()
            }
            _ => Vec::new(),
        };
        Self {
            root: root.clone(),
            key: CollectionKey {
                collection_type,
                name: name.map(Into::into),
            },
            lowered_name,
            class_names,
            root_type: collection_type.root_type(root),
            registered_document: RefCell::new(WeakNode::new()),
            cache: RefCell::new(CollectionCache::default()),
        }
    }

    #[inline]
    pub(crate) fn collection_type(&self) -> CollectionType {
        self.key.collection_type
    }

    #[inline]
    pub(crate) fn qualifying_name(&self) -> Option<&str> {
        self.key.name.as_deref()
    }

    #[inline]
    pub(crate) fn root_type(&self) -> RootType {
        self.root_type
    }

    #[inline]
    pub(crate) fn invalidation_category(&self) -> InvalidationCategory {
        self.collection_type().invalidation_category()
    }

    #[inline]
    pub(crate) fn has_named_item_index(&self) -> bool {
        self.collection_type().has_named_item_index()
    }

    #[inline]
    pub(crate) fn only_direct_children(&self) -> bool {
        self.collection_type().only_direct_children()
    }

    #[inline]
    fn overrides_item_after(&self) -> bool {
        self.collection_type().overrides_item_after()
    }

    fn config_flag(&self, flag: impl FnOnce(&LiveDomConfig) -> bool) -> bool {
        let document = Node::from_weak(&self.registered_document.borrow());
        match document.as_ref().and_then(Node::document_data) {
            Some(data) => data.with_config(flag),
            None => flag(&LiveDomConfig::default()),
        }
    }

    /// Node bounding the walk, or `None` for a rootless collection
    fn root_container(&self) -> Option<Node> {
        if !self.root.is_container() {
            return None;
        }
        if self.root_type == RootType::RootedAtDocument && self.root.is_connected() {
            return Some(self.root.tree_root());
        }
        Some(self.root.clone())
    }

    // --- candidate walks -----------------------------------------------------

    fn first_candidate(&self, root: &Node) -> Option<Node> {
        match self.collection_type() {
            CollectionType::ChildNodes => root.first_child(),
            _ if self.only_direct_children() => traversal::first_element_child(root),
            _ => traversal::first_element_within(root),
        }
    }

    fn next_candidate(&self, root: &Node, current: &Node) -> Option<Node> {
        match self.collection_type() {
            CollectionType::ChildNodes => current.next_sibling(),
            _ if self.only_direct_children() => traversal::next_element_sibling(current),
            _ => traversal::next_element(current, Some(root)),
        }
    }

    fn last_candidate(&self, root: &Node) -> Option<Node> {
        match self.collection_type() {
            CollectionType::ChildNodes => root.last_child(),
            _ if self.only_direct_children() => traversal::last_element_child(root),
            _ => traversal::last_element_within(root),
        }
    }

    fn previous_candidate(&self, root: &Node, current: &Node) -> Option<Node> {
        match self.collection_type() {
            CollectionType::ChildNodes => current.previous_sibling(),
            _ if self.only_direct_children() => traversal::previous_element_sibling(current),
            _ => traversal::previous_element(current, Some(root)),
        }
    }

    fn forward_from(&self, root: &Node, mut candidate: Node) -> Option<Node> {
        loop {
            if self.is_matching_element(&candidate) {
                return Some(candidate);
            }
            candidate = self.next_candidate(root, &candidate)?;
        }
    }

    fn backward_from(&self, root: &Node, mut candidate: Node) -> Option<Node> {
        loop {
            if self.is_matching_element(&candidate) {
                return Some(candidate);
            }
            candidate = self.previous_candidate(root, &candidate)?;
        }
    }

    fn first_item(&self, root: &Node, cache: &mut CollectionCache) -> Option<Node> {
        if self.overrides_item_after() {
            return ordered::first_item(self, cache);
        }
        let first = self.first_candidate(root)?;
        self.forward_from(root, first)
    }

    fn item_after(&self, root: &Node, previous: &Node, cache: &CollectionCache) -> Option<Node> {
        if self.overrides_item_after() {
            return ordered::item_after(self, previous, cache);
        }
        let next = self.next_candidate(root, previous)?;
        self.forward_from(root, next)
    }

    fn last_item(&self, root: &Node) -> Option<Node> {
        debug_assert!(!self.overrides_item_after());
        let last = self.last_candidate(root)?;
        self.backward_from(root, last)
    }

    fn item_before(&self, root: &Node, current: &Node) -> Option<Node> {
        debug_assert!(!self.overrides_item_after());
        let previous = self.previous_candidate(root, current)?;
        self.backward_from(root, previous)
    }

    /// Every member in order, ignoring the caches
    fn collect_uncached(&self) -> Vec<Node> {
        let Some(root) = self.root_container() else {
            return Vec::new();
        };
        let mut scratch = CollectionCache::default();
        let mut items = Vec::new();
        let mut current = self.first_item(&root, &mut scratch);
        while let Some(item) = current {
            current = self.item_after(&root, &item, &scratch);
            items.push(item);
        }
        items
    }

    // --- cached access -------------------------------------------------------

    pub(crate) fn item(&self, offset: usize) -> Option<Node> {
        let result = self.cached_item(offset);
        if self.config_flag(|config| config.verify_caches) {
            self.verify_item(offset, &result);
        }
        result
    }

    fn cached_item(&self, offset: usize) -> Option<Node> {
        let mut guard = self.cache.borrow_mut();
        let cache = &mut *guard;

        if cache.item_valid() && cache.cached_offset == offset {
            return cache.current_item.clone();
        }
        if cache.length_valid && cache.cached_length <= offset {
            return None;
        }
        let Some(root) = self.root_container() else {
            cache.set_length(0);
            return None;
        };

        let overrides = self.overrides_item_after();
        if cache.length_valid && !overrides && cache.is_last_item_closer(offset) {
            let last_offset = cache.cached_length - 1;
            match self.last_item(&root) {
                Some(last) => cache.set_item(last, last_offset),
                None => {
                    debug_assert!(false, "cached length out of sync with the tree");
                    cache.set_length(0);
                    return None;
                }
            }
        } else if !cache.item_valid()
            || cache.is_first_item_closer(offset)
            || (overrides && offset < cache.cached_offset)
        {
            match self.first_item(&root, cache) {
                Some(first) => cache.set_item(first, 0),
                None => {
                    cache.set_length(0);
                    return None;
                }
            }
        }

        if cache.cached_offset == offset {
            return cache.current_item.clone();
        }
        self.item_before_or_after_cached_item(&root, offset, cache)
    }

    fn item_before_or_after_cached_item(
        &self,
        root: &Node,
        offset: usize,
        cache: &mut CollectionCache,
    ) -> Option<Node> {
        let mut current = cache.current_item.clone()?;
        let mut current_offset = cache.cached_offset;

        if offset < current_offset {
            debug_assert!(!self.overrides_item_after());
            while let Some(previous) = self.item_before(root, &current) {
                current = previous;
                current_offset -= 1;
                if current_offset == offset {
                    cache.set_item(current.clone(), current_offset);
                    return Some(current);
                }
            }
            debug_assert!(false, "cached offset out of sync with the tree");
            return None;
        }

        while let Some(next) = self.item_after(root, &current, cache) {
            current = next;
            current_offset += 1;
            if current_offset == offset {
                cache.set_item(current.clone(), current_offset);
                return Some(current);
            }
        }
        // Ran off the end: `current` is the last item
        tracing::trace!(
            collection = ?self.collection_type(),
            length = current_offset + 1,
            "Walked to the end of the collection"
        );
        cache.set_item(current, current_offset);
        cache.set_length(current_offset + 1);
        None
    }

    pub(crate) fn length(&self) -> usize {
        {
            let cache = self.cache.borrow();
            if cache.length_valid {
                return cache.cached_length;
            }
        }
        self.cached_item(usize::MAX);
        let length = {
            let cache = self.cache.borrow();
            debug_assert!(cache.length_valid);
            cache.cached_length
        };
        if self.config_flag(|config| config.verify_caches) {
            let expected = self.collect_uncached().len();
            if expected != length {
                tracing::error!(
                    collection = ?self.collection_type(),
                    cached = length,
                    expected,
                    "Stale collection length"
                );
                debug_assert_eq!(length, expected, "stale collection length");
            }
        }
        length
    }

    fn verify_item(&self, offset: usize, result: &Option<Node>) {
        let expected = self.collect_uncached().into_iter().nth(offset);
        if expected != *result {
            tracing::error!(
                collection = ?self.collection_type(),
                offset,
                ?result,
                ?expected,
                "Stale collection item"
            );
            debug_assert!(false, "stale collection item at offset {offset}");
        }
    }

    // --- invalidation --------------------------------------------------------

    /// Reset caches after a mutation. `attr` is the changed attribute, or
    /// `None` for a structural change.
    pub(crate) fn invalidate_cache(&self, attr: Option<&str>) {
        let stale = {
            let mut cache = self.cache.borrow_mut();
            match attr {
                Some(name) if !self.invalidation_category().should_invalidate_on(name) => {
                    if self.has_named_item_index() && (name == "id" || name == "name") {
                        cache.named.take();
                    }
                    return;
                }
                _ => std::mem::take(&mut *cache),
            }
        };
        tracing::trace!(collection = ?self.collection_type(), ?attr, "Invalidated collection cache");
        // Cached nodes are released outside the borrow
        drop(stale);
    }

    /// Move this collection's counters to `new_document` and reset it
    pub(crate) fn did_move_to_document(self: &Rc<Self>, new_document: &Node) {
        let old = self.registered_document.replace(new_document.downgrade());
        if let Some(old_document) = Node::from_weak(&old) {
            if let Some(data) = old_document.document_data() {
                data.unregister_node_list(self);
            }
        }
        if let Some(data) = new_document.document_data() {
            data.register_node_list(self);
        }
        self.invalidate_cache(None);
    }

    fn cache_state(&self) -> CacheState {
        let cache = self.cache.borrow();
        CacheState {
            cached_offset: cache.item_valid().then_some(cache.cached_offset),
            cached_length: cache.length_valid.then_some(cache.cached_length),
            named_index_valid: cache.named.is_some(),
        }
    }
}

impl Drop for CollectionInner {
    fn drop(&mut self) {
        let document = Node::from_weak(self.registered_document.get_mut());
        if let Some(data) = document.as_ref().and_then(Node::document_data) {
            data.unregister_node_list(self);
        }
        let this: *const CollectionInner = self;
        self.root.unregister_collection(&self.key, this);
        tracing::debug!(collection = ?self.key.collection_type, root = ?self.root, "Dropped live collection");
    }
}

/// Get or create the collection for (root, type, name). The caller
/// guarantees `name` matches `collection_type.requires_name()`.
pub(crate) fn ensure_collection(
    root: &Node,
    collection_type: CollectionType,
    name: Option<&str>,
) -> LiveCollection {
    let key = CollectionKey {
        collection_type,
        name: name.map(Into::into),
    };
    if let Some(existing) = root.cached_collection(&key) {
        return LiveCollection(existing);
    }
    let inner = Rc::new(CollectionInner::new(root, collection_type, name));
    root.register_collection(key, &inner);
    if let Some(document) = root.owner_document_node() {
        if let Some(data) = document.document_data() {
            data.register_node_list(&inner);
        }
        *inner.registered_document.borrow_mut() = document.downgrade();
    }
    tracing::debug!(?collection_type, ?name, ?root, "Created live collection");
    LiveCollection(inner)
}

/// Handle to a live collection
///
/// Handles are cheap to clone and all clones share one cache.
#[derive(Clone)]
pub struct LiveCollection(Rc<CollectionInner>);

impl LiveCollection {
    /// Number of members
    pub fn length(&self) -> usize {
        self.0.length()
    }

    pub fn is_empty(&self) -> bool {
        self.item(0).is_none()
    }

    /// Member at `offset`, or `None` when out of range
    pub fn item(&self, offset: usize) -> Option<Node> {
        self.0.item(offset)
    }

    /// First member whose id, or (for HTML collections) name, is `name`
    pub fn named_item(&self, name: &str) -> Option<Node> {
        self.0.named_item(name)
    }

    /// All members matching `name` by id or name, in document order
    pub fn named_items(&self, name: &str) -> Vec<Node> {
        self.0.named_items(name)
    }

    /// Distinct ids, then names, of the members
    pub fn supported_names(&self) -> Vec<String> {
        self.0.supported_names()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            collection: self,
            index: 0,
        }
    }

    /// Snapshot of the current members
    pub fn to_vec(&self) -> Vec<Node> {
        self.iter().collect()
    }

    pub fn root(&self) -> &Node {
        &self.0.root
    }

    pub fn collection_type(&self) -> CollectionType {
        self.0.collection_type()
    }

    pub fn qualifying_name(&self) -> Option<&str> {
        self.0.qualifying_name()
    }

    pub fn root_type(&self) -> RootType {
        self.0.root_type()
    }

    pub fn invalidation_category(&self) -> InvalidationCategory {
        self.0.invalidation_category()
    }

    pub fn cache_state(&self) -> CacheState {
        self.0.cache_state()
    }

    /// Whether two handles share one collection object
    pub fn ptr_eq(&self, other: &LiveCollection) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for LiveCollection {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for LiveCollection {}

impl fmt::Debug for LiveCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveCollection")
            .field("type", &self.collection_type())
            .field("name", &self.qualifying_name())
            .field("root", &self.0.root)
            .field("cache", &self.cache_state())
            .finish()
    }
}

/// Iterator over a live collection. Reads through the cache, so it sees
/// mutations made while iterating.
pub struct Iter<'a> {
    collection: &'a LiveCollection,
    index: usize,
}

impl Iterator for Iter<'_> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let item = self.collection.item(self.index)?;
        self.index += 1;
        Some(item)
    }
}

impl<'a> IntoIterator for &'a LiveCollection {
    type Item = Node;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl Node {
    /// Get or create a collection of any type rooted at this node
    pub fn collection(
        &self,
        collection_type: CollectionType,
        name: Option<&str>,
    ) -> DomResult<LiveCollection> {
        match (collection_type.requires_name(), name) {
            (true, None) => Err(DomError::MissingQualifyingName(collection_type)),
            (false, Some(_)) => Err(DomError::UnexpectedQualifyingName(collection_type)),
            _ => Ok(ensure_collection(self, collection_type, name)),
        }
    }

    /// Element children
    pub fn children(&self) -> LiveCollection {
        ensure_collection(self, CollectionType::NodeChildren, None)
    }

    /// All children, including text and comments
    pub fn child_nodes(&self) -> LiveCollection {
        ensure_collection(self, CollectionType::ChildNodes, None)
    }

    /// Descendant elements by tag name; `"*"` matches all
    pub fn get_elements_by_tag_name(&self, name: &str) -> LiveCollection {
        ensure_collection(self, CollectionType::TagNodeList, Some(name))
    }

    /// Descendant elements carrying every class in `class_names`
    pub fn get_elements_by_class_name(&self, class_names: &str) -> LiveCollection {
        ensure_collection(self, CollectionType::ClassNodeList, Some(class_names))
    }

    /// Descendant elements whose name attribute is `name`
    pub fn get_elements_by_name(&self, name: &str) -> LiveCollection {
        ensure_collection(self, CollectionType::NameNodeList, Some(name))
    }

    pub fn t_bodies(&self) -> LiveCollection {
        ensure_collection(self, CollectionType::TableTBodies, None)
    }

    /// Rows of a table section
    pub fn section_rows(&self) -> LiveCollection {
        ensure_collection(self, CollectionType::TableSectionRows, None)
    }

    /// Rows of a table: head, body, then foot
    pub fn rows(&self) -> LiveCollection {
        ensure_collection(self, CollectionType::TableRows, None)
    }

    pub fn cells(&self) -> LiveCollection {
        ensure_collection(self, CollectionType::RowCells, None)
    }

    pub fn options(&self) -> LiveCollection {
        ensure_collection(self, CollectionType::SelectOptions, None)
    }

    pub fn selected_options(&self) -> LiveCollection {
        ensure_collection(self, CollectionType::SelectedOptions, None)
    }

    /// Enabled, non-empty options of a `<datalist>`
    pub fn datalist_options(&self) -> LiveCollection {
        ensure_collection(self, CollectionType::DataListOptions, None)
    }

    pub fn areas(&self) -> LiveCollection {
        ensure_collection(self, CollectionType::MapAreas, None)
    }

    /// Controls of a form or fieldset
    pub fn elements(&self) -> LiveCollection {
        ensure_collection(self, CollectionType::FormControls, None)
    }

    pub fn radio_node_list(&self, name: &str) -> LiveCollection {
        ensure_collection(self, CollectionType::RadioNodeList, Some(name))
    }

    /// Labels pointing at this control
    pub fn labels(&self) -> LiveCollection {
        ensure_collection(self, CollectionType::LabelsNodeList, None)
    }

    /// Microdata properties of an item
    pub fn properties(&self) -> LiveCollection {
        ensure_collection(self, CollectionType::ItemProperties, None)
    }

    pub fn property_node_list(&self, name: &str) -> LiveCollection {
        ensure_collection(self, CollectionType::PropertyNodeList, Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    fn list_with(doc: &Document, count: usize) -> Node {
        let ul = doc.create_element("ul");
        for i in 0..count {
            let li = doc.create_element("li");
            li.set_attribute("id", &format!("i{i}")).unwrap();
            ul.append_child(&li).unwrap();
        }
        ul
    }

    #[test]
    fn test_same_key_same_collection() {
        let doc = Document::new();
        let div = doc.create_element("div");
        assert_eq!(div.children(), div.children());
        assert_eq!(div.get_elements_by_tag_name("p"), div.get_elements_by_tag_name("p"));
        assert_ne!(div.get_elements_by_tag_name("p"), div.get_elements_by_tag_name("a"));
        assert_ne!(div.children(), div.child_nodes());
    }

    #[test]
    fn test_qualifying_name_checked() {
        let doc = Document::new();
        let div = doc.create_element("div");
        assert_eq!(
            div.collection(CollectionType::TagNodeList, None),
            Err(DomError::MissingQualifyingName(CollectionType::TagNodeList))
        );
        assert_eq!(
            div.collection(CollectionType::NodeChildren, Some("x")),
            Err(DomError::UnexpectedQualifyingName(CollectionType::NodeChildren))
        );
        assert_eq!(div.collection(CollectionType::NodeChildren, None), Ok(div.children()));
    }

    #[test]
    fn test_sequential_access_caches_position() {
        let doc = Document::new();
        let ul = list_with(&doc, 10);
        let children = ul.children();
        for i in 0..10 {
            assert_eq!(children.item(i).and_then(|n| n.id()), Some(format!("i{i}")));
            assert_eq!(children.cache_state().cached_offset, Some(i));
        }
        assert_eq!(children.item(10), None);
        assert_eq!(children.cache_state().cached_length, Some(10));
    }

    #[test]
    fn test_backward_walk_from_end() {
        let doc = Document::new();
        let ul = list_with(&doc, 10);
        let children = ul.children();
        assert_eq!(children.length(), 10);
        // length() leaves the cache on the last item; walk back from it
        assert_eq!(children.item(8).and_then(|n| n.id()).as_deref(), Some("i8"));
        assert_eq!(children.item(7).and_then(|n| n.id()).as_deref(), Some("i7"));
        assert_eq!(children.item(1).and_then(|n| n.id()).as_deref(), Some("i1"));
    }

    #[test]
    fn test_length_after_item_miss() {
        let doc = Document::new();
        let ul = list_with(&doc, 3);
        let children = ul.children();
        assert_eq!(children.item(5), None);
        assert_eq!(children.cache_state().cached_length, Some(3));
        assert_eq!(children.cache_state().cached_offset, Some(2));
    }

    #[test]
    fn test_rootless_collection_is_empty() {
        let doc = Document::new();
        let text = doc.create_text_node("x");
        assert_eq!(text.child_nodes().length(), 0);
        assert!(text.children().is_empty());
    }

    #[test]
    fn test_invalidate_by_category() {
        let doc = Document::new();
        let div = list_with(&doc, 2);
        let by_class = div.get_elements_by_class_name("a");
        assert_eq!(by_class.length(), 0);

        by_class.0.invalidate_cache(Some("style"));
        assert_eq!(by_class.cache_state().cached_length, Some(0));
        by_class.0.invalidate_cache(Some("class"));
        assert_eq!(by_class.cache_state(), CacheState::default());
    }

    #[test]
    fn test_iter_and_to_vec() {
        let doc = Document::new();
        let ul = list_with(&doc, 4);
        let ids: Vec<_> = ul.children().iter().filter_map(|n| n.id()).collect();
        assert_eq!(ids, ["i0", "i1", "i2", "i3"]);
        assert_eq!(ul.children().to_vec().len(), 4);
        let mut count = 0;
        for _ in &ul.children() {
            count += 1;
        }
        assert_eq!(count, 4);
    }
}
