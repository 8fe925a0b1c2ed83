//! DOM Node - shared-ownership handles
//!
//! Nodes are reference counted. The tree holds one set of strong references
//! (parent -> first child, node -> next sibling); back links (parent, previous
//! sibling, last child, owner document) are weak so the tree has no cycles.
//! Identity is by reference: two handles are equal iff they point at the
//! same node.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use crate::document::DocumentData;
use crate::rare_data::RareData;

/// Handle to a node in the tree
#[derive(Clone)]
pub struct Node(pub(crate) Rc<NodeInner>);

/// Weak counterpart of [`Node`]
pub(crate) type WeakNode = Weak<NodeInner>;

pub(crate) struct NodeInner {
    pub(crate) data: NodeData,
    pub(crate) links: RefCell<TreeLinks>,
    /// Owning document (a document points at itself)
    pub(crate) document: RefCell<WeakNode>,
    pub(crate) rare_data: RefCell<Option<Box<RareData>>>,
}

/// Intrusive child list links
#[derive(Default)]
pub(crate) struct TreeLinks {
    pub(crate) parent: WeakNode,
    pub(crate) first_child: Option<Node>,
    pub(crate) last_child: WeakNode,
    pub(crate) prev_sibling: WeakNode,
    pub(crate) next_sibling: Option<Node>,
}

/// Node-specific data
pub(crate) enum NodeData {
    Document(DocumentData),
    DocumentFragment,
    Element(ElementData),
    Text(RefCell<String>),
    Comment(RefCell<String>),
    PseudoElement(PseudoId),
}

/// DOM node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Element,
    Text,
    Comment,
    Document,
    DocumentFragment,
}

impl NodeType {
    pub fn to_u32(self) -> u32 {
        match self {
            NodeType::Element => 1,
            NodeType::Text => 3,
            NodeType::Comment => 8,
            NodeType::Document => 9,
            NodeType::DocumentFragment => 11,
        }
    }
}

/// Element namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Html,
    Svg,
    MathMl,
}

/// Generated-content pseudo-element kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoId {
    Before,
    After,
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Element-specific data
pub(crate) struct ElementData {
    pub(crate) namespace: Namespace,
    /// Lowercased for HTML elements
    pub(crate) local_name: Box<str>,
    pub(crate) attrs: RefCell<Vec<Attribute>>,
}

impl ElementData {
    pub(crate) fn new(namespace: Namespace, local_name: &str) -> Self {
        let local_name = if namespace == Namespace::Html {
            local_name.to_ascii_lowercase().into_boxed_str()
        } else {
            local_name.into()
        };
        Self {
            namespace,
            local_name,
            attrs: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn normalize_attr_name<'a>(&self, name: &'a str) -> std::borrow::Cow<'a, str> {
        if self.namespace == Namespace::Html && name.bytes().any(|b| b.is_ascii_uppercase()) {
            std::borrow::Cow::Owned(name.to_ascii_lowercase())
        } else {
            std::borrow::Cow::Borrowed(name)
        }
    }
}

impl NodeInner {
    fn new(data: NodeData, document: WeakNode) -> Self {
        Self {
            data,
            links: RefCell::new(TreeLinks::default()),
            document: RefCell::new(document),
            rare_data: RefCell::new(None),
        }
    }
}

impl Drop for NodeInner {
    // Release the subtree through a worklist so neither long sibling lists
    // nor deep nesting recurse through child drops. A node someone else
    // still holds keeps its own children.
    fn drop(&mut self) {
        let mut pending: Vec<Node> = Vec::new();
        let mut next = self.links.get_mut().first_child.take();
        while let Some(child) = next {
            next = child.0.links.borrow_mut().next_sibling.take();
            pending.push(child);
        }
        while let Some(node) = pending.pop() {
            if Rc::strong_count(&node.0) > 1 {
                continue;
            }
            let mut next = node.0.links.borrow_mut().first_child.take();
            while let Some(child) = next {
                next = child.0.links.borrow_mut().next_sibling.take();
                pending.push(child);
            }
        }
    }
}

impl Node {
    pub(crate) fn new_document(data: DocumentData) -> Node {
        Node(Rc::new_cyclic(|weak| {
            NodeInner::new(NodeData::Document(data), weak.clone())
        }))
    }

    pub(crate) fn new_in(data: NodeData, document: &Node) -> Node {
        Node(Rc::new(NodeInner::new(data, Rc::downgrade(&document.0))))
    }

    pub(crate) fn from_weak(weak: &WeakNode) -> Option<Node> {
        weak.upgrade().map(Node)
    }

    pub(crate) fn downgrade(&self) -> WeakNode {
        Rc::downgrade(&self.0)
    }

    /// Check whether two handles refer to the same node
    #[inline]
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn node_type(&self) -> NodeType {
        match &self.0.data {
            NodeData::Document(_) => NodeType::Document,
            NodeData::DocumentFragment => NodeType::DocumentFragment,
            NodeData::Element(_) | NodeData::PseudoElement(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment(_) => NodeType::Comment,
        }
    }

    /// Real elements only; pseudo-elements report `false`
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.0.data, NodeData::Element(_))
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.0.data, NodeData::Text(_))
    }

    #[inline]
    pub fn is_document(&self) -> bool {
        matches!(self.0.data, NodeData::Document(_))
    }

    #[inline]
    pub fn is_pseudo_element(&self) -> bool {
        matches!(self.0.data, NodeData::PseudoElement(_))
    }

    pub fn pseudo_id(&self) -> Option<PseudoId> {
        match self.0.data {
            NodeData::PseudoElement(id) => Some(id),
            _ => None,
        }
    }

    /// Nodes that can hold children
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(
            self.0.data,
            NodeData::Document(_) | NodeData::DocumentFragment | NodeData::Element(_)
        )
    }

    #[inline]
    pub(crate) fn element_data(&self) -> Option<&ElementData> {
        match &self.0.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn document_data(&self) -> Option<&DocumentData> {
        match &self.0.data {
            NodeData::Document(d) => Some(d),
            _ => None,
        }
    }

    /// Element local name (lowercase for HTML)
    pub fn local_name(&self) -> Option<&str> {
        self.element_data().map(|e| &*e.local_name)
    }

    pub fn namespace(&self) -> Option<Namespace> {
        self.element_data().map(|e| e.namespace)
    }

    #[inline]
    pub fn is_html_element(&self) -> bool {
        self.namespace() == Some(Namespace::Html)
    }

    /// HTML element with the given (lowercase) local name
    #[inline]
    pub fn has_tag_name(&self, name: &str) -> bool {
        match self.element_data() {
            Some(e) => e.namespace == Namespace::Html && &*e.local_name == name,
            None => false,
        }
    }

    /// Name used for debugging output
    pub fn node_name(&self) -> String {
        match &self.0.data {
            NodeData::Document(_) => "#document".into(),
            NodeData::DocumentFragment => "#document-fragment".into(),
            NodeData::Element(e) => e.local_name.to_string(),
            NodeData::Text(_) => "#text".into(),
            NodeData::Comment(_) => "#comment".into(),
            NodeData::PseudoElement(PseudoId::Before) => "::before".into(),
            NodeData::PseudoElement(PseudoId::After) => "::after".into(),
        }
    }

    // --- attributes --------------------------------------------------------

    /// Run `f` against the attribute value without cloning it
    pub fn with_attribute<R>(&self, name: &str, f: impl FnOnce(Option<&str>) -> R) -> R {
        let Some(element) = self.element_data() else {
            return f(None);
        };
        let name = element.normalize_attr_name(name);
        let attrs = element.attrs.borrow();
        f(attrs.iter().find(|a| a.name == *name).map(|a| a.value.as_str()))
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.with_attribute(name, |v| v.map(str::to_owned))
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.with_attribute(name, |v| v.is_some())
    }

    pub fn attribute_equals(&self, name: &str, expected: &str) -> bool {
        self.with_attribute(name, |v| v == Some(expected))
    }

    /// Non-empty attribute equal to `expected`
    pub(crate) fn attribute_is_nonempty_and(&self, name: &str, expected: &str) -> bool {
        !expected.is_empty() && self.attribute_equals(name, expected)
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        self.element_data()
            .map(|e| e.attrs.borrow().clone())
            .unwrap_or_default()
    }

    /// Value of the `id` attribute, if present and non-empty
    pub fn id(&self) -> Option<String> {
        self.get_attribute("id").filter(|v| !v.is_empty())
    }

    /// Value of the `name` attribute, if present and non-empty
    pub fn name_attribute(&self) -> Option<String> {
        self.get_attribute("name").filter(|v| !v.is_empty())
    }

    /// Whitespace-separated tokens of an attribute contain `token`
    pub(crate) fn attribute_has_token(&self, name: &str, token: &str) -> bool {
        self.with_attribute(name, |v| {
            v.is_some_and(|v| v.split_ascii_whitespace().any(|t| t == token))
        })
    }

    /// Set without notifying anyone. Returns (normalized name, old value).
    pub(crate) fn set_attribute_raw(&self, name: &str, value: &str) -> Option<(String, Option<String>)> {
        let element = self.element_data()?;
        let name = element.normalize_attr_name(name).into_owned();
        let mut attrs = element.attrs.borrow_mut();
        if let Some(attr) = attrs.iter_mut().find(|a| a.name == name) {
            let old = std::mem::replace(&mut attr.value, value.to_owned());
            return Some((name, Some(old)));
        }
        attrs.push(Attribute {
            name: name.clone(),
            value: value.to_owned(),
        });
        Some((name, None))
    }

    /// Remove without notifying anyone. Returns (normalized name, old value).
    pub(crate) fn remove_attribute_raw(&self, name: &str) -> Option<(String, String)> {
        let element = self.element_data()?;
        let name = element.normalize_attr_name(name).into_owned();
        let mut attrs = element.attrs.borrow_mut();
        let index = attrs.iter().position(|a| a.name == name)?;
        let removed = attrs.remove(index);
        Some((name, removed.value))
    }

    // --- character data ----------------------------------------------------

    /// Data of a text or comment node
    pub fn character_data(&self) -> Option<String> {
        match &self.0.data {
            NodeData::Text(t) | NodeData::Comment(t) => Some(t.borrow().clone()),
            _ => None,
        }
    }

    pub(crate) fn character_data_cell(&self) -> Option<&RefCell<String>> {
        match &self.0.data {
            NodeData::Text(t) | NodeData::Comment(t) => Some(t),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        if let Some(data) = self.character_data() {
            return data;
        }
        let mut out = String::new();
        let mut current = self.first_child();
        while let Some(node) = current {
            if let NodeData::Text(t) = &node.0.data {
                out.push_str(&t.borrow());
            }
            current = crate::traversal::next(&node, Some(self));
        }
        out
    }

    // --- tree accessors ----------------------------------------------------

    #[inline]
    pub(crate) fn links(&self) -> Ref<'_, TreeLinks> {
        self.0.links.borrow()
    }

    #[inline]
    pub(crate) fn links_mut(&self) -> RefMut<'_, TreeLinks> {
        self.0.links.borrow_mut()
    }

    pub fn parent_node(&self) -> Option<Node> {
        Node::from_weak(&self.links().parent)
    }

    /// Parent, if it is an element
    pub fn parent_element(&self) -> Option<Node> {
        self.parent_node().filter(Node::is_element)
    }

    pub fn first_child(&self) -> Option<Node> {
        self.links().first_child.clone()
    }

    pub fn last_child(&self) -> Option<Node> {
        Node::from_weak(&self.links().last_child)
    }

    pub fn next_sibling(&self) -> Option<Node> {
        self.links().next_sibling.clone()
    }

    pub fn previous_sibling(&self) -> Option<Node> {
        Node::from_weak(&self.links().prev_sibling)
    }

    pub fn has_children(&self) -> bool {
        self.links().first_child.is_some()
    }

    pub(crate) fn owner_document_node(&self) -> Option<Node> {
        Node::from_weak(&self.0.document.borrow())
    }

    /// The topmost ancestor (inclusive)
    pub fn tree_root(&self) -> Node {
        let mut root = self.clone();
        while let Some(parent) = root.parent_node() {
            root = parent;
        }
        root
    }

    /// Reachable from a document node through parent links
    pub fn is_connected(&self) -> bool {
        self.tree_root().is_document()
    }

    /// Strict descendant check
    pub fn is_descendant_of(&self, ancestor: &Node) -> bool {
        let mut current = self.parent_node();
        while let Some(node) = current {
            if node.ptr_eq(ancestor) {
                return true;
            }
            current = node.parent_node();
        }
        false
    }

    /// Inclusive descendant check
    pub fn contains(&self, other: &Node) -> bool {
        self.ptr_eq(other) || other.is_descendant_of(self)
    }

    /// Position among siblings
    pub fn node_index(&self) -> usize {
        let mut count = 0;
        let mut current = self.previous_sibling();
        while let Some(node) = current {
            count += 1;
            current = node.previous_sibling();
        }
        count
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0), state)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "<{} id={:?}>", self.node_name(), id),
            None => write!(f, "<{}>", self.node_name()),
        }
    }
}
