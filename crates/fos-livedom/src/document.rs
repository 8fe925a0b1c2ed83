//! Document - High-level document API
//!
//! Besides creating nodes, the document owns the bookkeeping shared by all
//! of its live collections: one counter per invalidation category, the set of
//! collections rooted at document scope, and the id/name hash used by
//! `get_element_by_id` and the named-item fast path.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use crate::collection::{self, CollectionInner, CollectionType, InvalidationCategory, RootType};
use crate::node::{ElementData, NodeData};
use crate::ordered_map::DocumentOrderedMap;
use crate::{LiveCollection, LiveDomConfig, Namespace, Node};

/// State hung off the document node
#[derive(Default)]
pub(crate) struct DocumentData {
    config: RefCell<LiveDomConfig>,
    node_list_counts: RefCell<[u32; InvalidationCategory::COUNT]>,
    lists_invalidated_at_document: RefCell<Vec<Weak<CollectionInner>>>,
    pub(crate) ids: DocumentOrderedMap,
    pub(crate) names: DocumentOrderedMap,
}

impl DocumentData {
    fn new(config: LiveDomConfig) -> Self {
        Self {
            config: RefCell::new(config),
            ..Self::default()
        }
    }

    pub(crate) fn config(&self) -> LiveDomConfig {
        self.config.borrow().clone()
    }

    pub(crate) fn with_config<R>(&self, f: impl FnOnce(&LiveDomConfig) -> R) -> R {
        f(&self.config.borrow())
    }

    pub(crate) fn register_node_list(&self, list: &Rc<CollectionInner>) {
        {
            let mut counts = self.node_list_counts.borrow_mut();
            counts[list.invalidation_category().index()] += 1;
            if list.has_named_item_index() {
                counts[InvalidationCategory::OnIdOrNameAttrChange.index()] += 1;
            }
        }
        if list.root_type() == RootType::RootedAtDocument {
            self.lists_invalidated_at_document
                .borrow_mut()
                .push(Rc::downgrade(list));
        }
    }

    /// Called with the list's address because it may be mid-destruction
    pub(crate) fn unregister_node_list(&self, list: &CollectionInner) {
        {
            let mut counts = self.node_list_counts.borrow_mut();
            let category = list.invalidation_category().index();
            debug_assert!(counts[category] > 0, "node list counter underflow");
            counts[category] = counts[category].saturating_sub(1);
            if list.has_named_item_index() {
                let id_or_name = InvalidationCategory::OnIdOrNameAttrChange.index();
                debug_assert!(counts[id_or_name] > 0, "node list counter underflow");
                counts[id_or_name] = counts[id_or_name].saturating_sub(1);
            }
        }
        if list.root_type() == RootType::RootedAtDocument {
            let target: *const CollectionInner = list;
            self.lists_invalidated_at_document
                .borrow_mut()
                .retain(|weak| !std::ptr::eq(weak.as_ptr(), target));
        }
    }

    pub(crate) fn node_list_count(&self, category: InvalidationCategory) -> u32 {
        self.node_list_counts.borrow()[category.index()]
    }

    /// Cheap pre-check before walking ancestors. `None` stands for a
    /// structural change, which matters to any registered collection.
    pub(crate) fn should_invalidate_node_list_caches(&self, attr: Option<&str>) -> bool {
        let counts = self.node_list_counts.borrow();
        match attr {
            None => counts.iter().any(|&count| count > 0),
            Some(name) => InvalidationCategory::ALL
                .iter()
                .any(|category| counts[category.index()] > 0 && category.should_invalidate_on(name)),
        }
    }

    pub(crate) fn lists_invalidated_at_document(&self) -> Vec<Rc<CollectionInner>> {
        self.lists_invalidated_at_document
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

/// Handle to a document node
#[derive(Clone, PartialEq, Eq)]
pub struct Document(Node);

impl Document {
    /// Create an empty document with the default config
    pub fn new() -> Self {
        Self::with_config(LiveDomConfig::default())
    }

    pub fn with_config(config: LiveDomConfig) -> Self {
        tracing::debug!(?config, "Creating document");
        Document(Node::new_document(DocumentData::new(config)))
    }

    /// Wrap a node that is a document
    pub fn from_node(node: &Node) -> Option<Document> {
        node.is_document().then(|| Document(node.clone()))
    }

    #[inline]
    pub fn as_node(&self) -> &Node {
        &self.0
    }

    pub(crate) fn data(&self) -> &DocumentData {
        match &self.0 .0.data {
            NodeData::Document(data) => data,
            _ => unreachable!("Document wraps a non-document node"),
        }
    }

    pub fn config(&self) -> LiveDomConfig {
        self.data().config()
    }

    /// Replace the config. Cached state stays valid; only later walks and
    /// lookups see the new settings.
    pub fn set_config(&self, config: LiveDomConfig) {
        *self.data().config.borrow_mut() = config;
    }

    // --- node factories ------------------------------------------------------

    /// Create an HTML element
    pub fn create_element(&self, local_name: &str) -> Node {
        self.create_element_ns(Namespace::Html, local_name)
    }

    pub fn create_element_ns(&self, namespace: Namespace, local_name: &str) -> Node {
        Node::new_in(NodeData::Element(ElementData::new(namespace, local_name)), &self.0)
    }

    pub fn create_text_node(&self, data: &str) -> Node {
        Node::new_in(NodeData::Text(RefCell::new(data.to_owned())), &self.0)
    }

    pub fn create_comment(&self, data: &str) -> Node {
        Node::new_in(NodeData::Comment(RefCell::new(data.to_owned())), &self.0)
    }

    pub fn create_document_fragment(&self) -> Node {
        Node::new_in(NodeData::DocumentFragment, &self.0)
    }

    // --- structure -----------------------------------------------------------

    /// The root element
    pub fn document_element(&self) -> Option<Node> {
        crate::traversal::first_element_child(&self.0)
    }

    /// First `<body>` child of the root element
    pub fn body(&self) -> Option<Node> {
        self.document_element()?
            .child_iter()
            .find(|child| child.has_tag_name("body"))
    }

    /// First connected element whose id is `id`
    pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
        if id.is_empty() {
            return None;
        }
        self.data()
            .ids
            .get(id, &self.0, |element, key| element.attribute_equals("id", key))
    }

    /// First connected element whose name attribute is `name`
    pub(crate) fn first_element_by_name(&self, name: &str) -> Option<Node> {
        if name.is_empty() {
            return None;
        }
        self.data()
            .names
            .get(name, &self.0, |element, key| element.attribute_equals("name", key))
    }

    /// Number of live collections registered in `category`
    pub fn node_list_count(&self, category: InvalidationCategory) -> u32 {
        self.data().node_list_count(category)
    }

    // --- document collections -----------------------------------------------

    fn collection(&self, collection_type: CollectionType) -> LiveCollection {
        collection::ensure_collection(&self.0, collection_type, None)
    }

    pub fn images(&self) -> LiveCollection {
        self.collection(CollectionType::DocImages)
    }

    pub fn applets(&self) -> LiveCollection {
        self.collection(CollectionType::DocApplets)
    }

    pub fn embeds(&self) -> LiveCollection {
        self.collection(CollectionType::DocEmbeds)
    }

    /// Same collection as [`Document::embeds`]
    pub fn plugins(&self) -> LiveCollection {
        self.embeds()
    }

    pub fn forms(&self) -> LiveCollection {
        self.collection(CollectionType::DocForms)
    }

    pub fn links(&self) -> LiveCollection {
        self.collection(CollectionType::DocLinks)
    }

    pub fn anchors(&self) -> LiveCollection {
        self.collection(CollectionType::DocAnchors)
    }

    pub fn scripts(&self) -> LiveCollection {
        self.collection(CollectionType::DocScripts)
    }

    pub fn all(&self) -> LiveCollection {
        self.collection(CollectionType::DocAll)
    }

    /// Elements exposed as `window[name]`
    pub fn window_named_items(&self, name: &str) -> LiveCollection {
        collection::ensure_collection(&self.0, CollectionType::WindowNamedItems, Some(name))
    }

    /// Elements exposed as `document[name]`
    pub fn document_named_items(&self, name: &str) -> LiveCollection {
        collection::ensure_collection(&self.0, CollectionType::DocumentNamedItems, Some(name))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Document {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.0
    }
}

impl AsRef<Node> for Document {
    fn as_ref(&self) -> &Node {
        &self.0
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Document").field(&self.0).finish()
    }
}

impl Node {
    /// The document this node currently belongs to. A document is its own
    /// owner.
    pub fn owner_document(&self) -> Option<Document> {
        self.owner_document_node().map(Document)
    }
}
