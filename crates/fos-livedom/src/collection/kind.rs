//! Collection kinds
//!
//! A collection's behaviour is fully described by its `CollectionType`
//! plus the qualifying name it was created with. Scope, root type and
//! invalidation category are plain data derived from the type, and element
//! matching is a single switch, so the invalidation dispatcher and the
//! traversal loop never need dynamic dispatch.

use super::form;
use super::CollectionInner;
use crate::Node;

/// What a live collection enumerates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionType {
    // Document collections
    DocImages,
    DocApplets,
    DocEmbeds,
    DocForms,
    DocLinks,
    DocAnchors,
    DocScripts,
    DocAll,
    WindowNamedItems,
    DocumentNamedItems,
    // Element collections
    NodeChildren,
    TableTBodies,
    TableSectionRows,
    TableRows,
    RowCells,
    SelectOptions,
    SelectedOptions,
    DataListOptions,
    MapAreas,
    FormControls,
    ItemProperties,
    // Node lists
    ChildNodes,
    TagNodeList,
    ClassNodeList,
    NameNodeList,
    RadioNodeList,
    LabelsNodeList,
    PropertyNodeList,
}

/// Whether the document-order walk is bounded by the root or the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootType {
    RootedAtNode,
    RootedAtDocument,
}

/// Which attribute changes reset a collection's caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidationCategory {
    None,
    OnClassAttrChange,
    OnNameAttrChange,
    OnIdOrNameAttrChange,
    OnForAttrChange,
    OnFormControlChange,
    OnHrefAttrChange,
    OnItemAttrChange,
    OnAnyAttrChange,
}

impl InvalidationCategory {
    pub const COUNT: usize = 9;

    pub const ALL: [InvalidationCategory; Self::COUNT] = [
        InvalidationCategory::None,
        InvalidationCategory::OnClassAttrChange,
        InvalidationCategory::OnNameAttrChange,
        InvalidationCategory::OnIdOrNameAttrChange,
        InvalidationCategory::OnForAttrChange,
        InvalidationCategory::OnFormControlChange,
        InvalidationCategory::OnHrefAttrChange,
        InvalidationCategory::OnItemAttrChange,
        InvalidationCategory::OnAnyAttrChange,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Does a change to attribute `name` affect collections in this category
    pub fn should_invalidate_on(self, name: &str) -> bool {
        match self {
            InvalidationCategory::None => false,
            InvalidationCategory::OnClassAttrChange => name == "class",
            InvalidationCategory::OnNameAttrChange => name == "name",
            InvalidationCategory::OnIdOrNameAttrChange => name == "id" || name == "name",
            // A label follows `for`, and the target's id and type decide
            // whether it resolves to a labelable control
            InvalidationCategory::OnForAttrChange => matches!(name, "for" | "id" | "type"),
            InvalidationCategory::OnFormControlChange => {
                matches!(name, "name" | "id" | "for" | "form" | "type")
            }
            InvalidationCategory::OnHrefAttrChange => name == "href",
            InvalidationCategory::OnItemAttrChange => {
                matches!(name, "itemscope" | "itemprop" | "itemtype" | "itemref" | "id")
            }
            InvalidationCategory::OnAnyAttrChange => true,
        }
    }
}

impl CollectionType {
    /// Types keyed by a qualifying name in addition to the root
    pub fn requires_name(self) -> bool {
        matches!(
            self,
            CollectionType::WindowNamedItems
                | CollectionType::DocumentNamedItems
                | CollectionType::TagNodeList
                | CollectionType::ClassNodeList
                | CollectionType::NameNodeList
                | CollectionType::RadioNodeList
                | CollectionType::PropertyNodeList
        )
    }

    /// HTMLCollection-style types keep a named-item index; node lists do not
    pub fn has_named_item_index(self) -> bool {
        !self.is_node_list()
    }

    pub fn is_node_list(self) -> bool {
        matches!(
            self,
            CollectionType::ChildNodes
                | CollectionType::TagNodeList
                | CollectionType::ClassNodeList
                | CollectionType::NameNodeList
                | CollectionType::RadioNodeList
                | CollectionType::LabelsNodeList
                | CollectionType::PropertyNodeList
        )
    }

    pub fn only_direct_children(self) -> bool {
        matches!(
            self,
            CollectionType::NodeChildren
                | CollectionType::ChildNodes
                | CollectionType::TableTBodies
                | CollectionType::TableSectionRows
                | CollectionType::RowCells
        )
    }

    /// Types whose order is not plain document order; they are only ever
    /// walked forward
    pub fn overrides_item_after(self) -> bool {
        matches!(
            self,
            CollectionType::TableRows
                | CollectionType::ItemProperties
                | CollectionType::PropertyNodeList
        )
    }

    /// Only `ChildNodes` yields text and comment nodes
    pub fn is_element_only(self) -> bool {
        self != CollectionType::ChildNodes
    }

    /// Membership depends on descendant text, not just on elements
    pub(crate) fn depends_on_text(self) -> bool {
        self == CollectionType::DataListOptions
    }

    pub fn root_type(self, root: &Node) -> RootType {
        match self {
            CollectionType::DocImages
            | CollectionType::DocApplets
            | CollectionType::DocEmbeds
            | CollectionType::DocForms
            | CollectionType::DocLinks
            | CollectionType::DocAnchors
            | CollectionType::DocScripts
            | CollectionType::DocAll
            | CollectionType::WindowNamedItems
            | CollectionType::DocumentNamedItems
            | CollectionType::FormControls
            | CollectionType::ItemProperties
            | CollectionType::PropertyNodeList
            | CollectionType::LabelsNodeList => RootType::RootedAtDocument,
            // Form-associated controls may live anywhere in the document
            CollectionType::RadioNodeList if root.has_tag_name("form") => {
                RootType::RootedAtDocument
            }
            _ => RootType::RootedAtNode,
        }
    }

    pub fn invalidation_category(self) -> InvalidationCategory {
        match self {
            CollectionType::DocImages
            | CollectionType::DocEmbeds
            | CollectionType::DocForms
            | CollectionType::DocScripts
            | CollectionType::DocAll
            | CollectionType::NodeChildren
            | CollectionType::TableTBodies
            | CollectionType::TableSectionRows
            | CollectionType::TableRows
            | CollectionType::RowCells
            | CollectionType::SelectOptions
            | CollectionType::MapAreas
            | CollectionType::ChildNodes
            | CollectionType::TagNodeList => InvalidationCategory::None,
            CollectionType::DocApplets
            | CollectionType::SelectedOptions
            | CollectionType::DataListOptions => InvalidationCategory::OnAnyAttrChange,
            CollectionType::DocAnchors | CollectionType::NameNodeList => {
                InvalidationCategory::OnNameAttrChange
            }
            CollectionType::DocLinks => InvalidationCategory::OnHrefAttrChange,
            CollectionType::WindowNamedItems | CollectionType::DocumentNamedItems => {
                InvalidationCategory::OnIdOrNameAttrChange
            }
            CollectionType::FormControls | CollectionType::RadioNodeList => {
                InvalidationCategory::OnFormControlChange
            }
            CollectionType::ItemProperties | CollectionType::PropertyNodeList => {
                InvalidationCategory::OnItemAttrChange
            }
            CollectionType::ClassNodeList => InvalidationCategory::OnClassAttrChange,
            CollectionType::LabelsNodeList => InvalidationCategory::OnForAttrChange,
        }
    }
}

impl CollectionInner {
    /// The matching predicate. `ChildNodes` accepts any node; every other
    /// type only ever sees elements.
    pub(crate) fn is_matching_element(&self, element: &Node) -> bool {
        let collection_type = self.collection_type();
        if collection_type == CollectionType::ChildNodes {
            return true;
        }
        if !element.is_element() {
            return false;
        }
        let html_only = !matches!(
            collection_type,
            CollectionType::DocAll
                | CollectionType::NodeChildren
                | CollectionType::WindowNamedItems
                | CollectionType::TagNodeList
                | CollectionType::ClassNodeList
                | CollectionType::NameNodeList
        );
        if html_only && !element.is_html_element() {
            return false;
        }
        let name = self.qualifying_name().unwrap_or("");

        match collection_type {
            CollectionType::DocImages => element.has_tag_name("img"),
            CollectionType::DocScripts => element.has_tag_name("script"),
            CollectionType::DocForms => element.has_tag_name("form"),
            CollectionType::DocEmbeds => element.has_tag_name("embed"),
            CollectionType::DocApplets => {
                element.has_tag_name("applet")
                    || (element.has_tag_name("object") && form::contains_java_applet(element))
            }
            CollectionType::DocLinks => {
                (element.has_tag_name("a") || element.has_tag_name("area"))
                    && element.has_attribute("href")
            }
            CollectionType::DocAnchors => {
                element.has_tag_name("a") && element.has_attribute("name")
            }
            CollectionType::DocAll | CollectionType::NodeChildren => true,
            CollectionType::WindowNamedItems => {
                (element.is_html_element()
                    && form::exposed_by_name_on_window(element)
                    && element.attribute_is_nonempty_and("name", name))
                    || element.attribute_is_nonempty_and("id", name)
            }
            CollectionType::DocumentNamedItems => form::exposed_on_document(element, name),
            CollectionType::TableTBodies => element.has_tag_name("tbody"),
            CollectionType::TableSectionRows | CollectionType::TableRows => {
                element.has_tag_name("tr")
            }
            CollectionType::RowCells => element.has_tag_name("td") || element.has_tag_name("th"),
            CollectionType::SelectOptions => element.has_tag_name("option"),
            CollectionType::SelectedOptions => {
                element.has_tag_name("option") && element.has_attribute("selected")
            }
            CollectionType::DataListOptions => {
                element.has_tag_name("option")
                    && !element.has_attribute("disabled")
                    && !form::option_value(element).is_empty()
            }
            CollectionType::MapAreas => element.has_tag_name("area"),
            CollectionType::FormControls => form::is_control_of(element, &self.root),
            CollectionType::ItemProperties => {
                !element.ptr_eq(&self.root)
                    && element.with_attribute("itemprop", |v| {
                        v.is_some_and(|v| v.split_ascii_whitespace().next().is_some())
                    })
            }
            CollectionType::PropertyNodeList => {
                !element.ptr_eq(&self.root) && element.attribute_has_token("itemprop", name)
            }
            CollectionType::TagNodeList => self.matches_tag(element),
            CollectionType::ClassNodeList => {
                !self.class_names.is_empty()
                    && self
                        .class_names
                        .iter()
                        .all(|class| element.attribute_has_token("class", class))
            }
            CollectionType::NameNodeList => element.attribute_equals("name", name),
            CollectionType::RadioNodeList => {
                form::is_radio_list_member(element, &self.root, name)
            }
            CollectionType::LabelsNodeList => {
                element.has_tag_name("label")
                    && form::labeled_control(element).is_some_and(|c| c.ptr_eq(&self.root))
            }
            CollectionType::ChildNodes => true,
        }
    }

    fn matches_tag(&self, element: &Node) -> bool {
        let name = self.qualifying_name().unwrap_or("");
        if name == "*" {
            return true;
        }
        match (element.local_name(), element.is_html_element()) {
            (Some(local), true) => Some(local) == self.lowered_name.as_deref(),
            (Some(local), false) => local == name,
            (None, _) => false,
        }
    }
}
