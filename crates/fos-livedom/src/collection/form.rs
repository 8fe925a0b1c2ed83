//! HTML element semantics used by the matching predicates
//!
//! Form ownership, label targets, option values and the tag allow-lists
//! that decide which elements are reachable by name.

use crate::{traversal, Node};

/// Elements listed in `form.elements`. Image buttons are excluded.
pub(crate) fn is_listed_element(element: &Node) -> bool {
    match element.local_name() {
        _ if !element.is_html_element() => false,
        Some("input") => !element.with_attribute("type", |t| {
            t.is_some_and(|t| t.eq_ignore_ascii_case("image"))
        }),
        Some("button" | "fieldset" | "object" | "output" | "select" | "textarea") => true,
        _ => false,
    }
}

/// Elements a `<label>` can point at
pub(crate) fn is_labelable(element: &Node) -> bool {
    match element.local_name() {
        _ if !element.is_html_element() => false,
        Some("input") => !element.with_attribute("type", |t| {
            t.is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
        }),
        Some("button" | "meter" | "output" | "progress" | "select" | "textarea") => true,
        _ => false,
    }
}

/// The form an element is associated with: the element named by its
/// `form` attribute when present, the nearest ancestor form otherwise.
pub(crate) fn form_owner(element: &Node) -> Option<Node> {
    let form_id = element.get_attribute("form");
    if let Some(form_id) = form_id {
        if !element.is_connected() {
            return None;
        }
        return element
            .owner_document()?
            .get_element_by_id(&form_id)
            .filter(|form| form.has_tag_name("form"));
    }
    element
        .inclusive_ancestors()
        .skip(1)
        .find(|ancestor| ancestor.has_tag_name("form"))
}

/// Member of `root.elements` where root is a form or a fieldset
pub(crate) fn is_control_of(element: &Node, root: &Node) -> bool {
    if !is_listed_element(element) {
        return false;
    }
    if root.has_tag_name("fieldset") {
        return element.is_descendant_of(root);
    }
    form_owner(element).is_some_and(|owner| owner.ptr_eq(root))
}

/// Member of a `RadioNodeList` named `name` under `root`
pub(crate) fn is_radio_list_member(element: &Node, root: &Node, name: &str) -> bool {
    if !is_listed_element(element) {
        return false;
    }
    let in_scope = if root.has_tag_name("form") {
        form_owner(element).is_some_and(|owner| owner.ptr_eq(root))
    } else {
        element.is_descendant_of(root)
    };
    in_scope
        && (element.attribute_is_nonempty_and("id", name)
            || element.attribute_is_nonempty_and("name", name))
}

/// The control a `<label>` is for
pub(crate) fn labeled_control(label: &Node) -> Option<Node> {
    if let Some(target) = label.get_attribute("for") {
        if !label.is_connected() {
            return None;
        }
        return label
            .owner_document()?
            .get_element_by_id(&target)
            .filter(is_labelable);
    }
    let mut current = traversal::first_element_within(label);
    while let Some(element) = current {
        if is_labelable(&element) {
            return Some(element);
        }
        current = traversal::next_element(&element, Some(label));
    }
    None
}

/// `value` attribute, else the text with whitespace collapsed
pub(crate) fn option_value(option: &Node) -> String {
    if let Some(value) = option.get_attribute("value") {
        return value;
    }
    option
        .text_content()
        .split_ascii_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `<object>` that will run a Java applet
pub(crate) fn contains_java_applet(object: &Node) -> bool {
    let is_java_type = |node: &Node| {
        node.with_attribute("type", |t| {
            t.is_some_and(|t| t.to_ascii_lowercase().starts_with("application/x-java-applet"))
        })
    };
    if is_java_type(object) {
        return true;
    }
    // Nested applets and java objects count too
    object.child_iter().any(|child| {
        child.has_tag_name("applet") || (child.has_tag_name("object") && contains_java_applet(&child))
    })
}

/// Tags `window[name]` resolves by the name attribute
pub(crate) fn exposed_by_name_on_window(element: &Node) -> bool {
    matches!(
        element.local_name(),
        Some("img" | "form" | "applet" | "embed" | "object")
    )
}

/// `document[name]` membership
pub(crate) fn exposed_on_document(element: &Node, name: &str) -> bool {
    match element.local_name() {
        Some("form" | "iframe" | "embed") => element.attribute_is_nonempty_and("name", name),
        Some("applet" | "object") => {
            element.attribute_is_nonempty_and("name", name)
                || element.attribute_is_nonempty_and("id", name)
        }
        // Images are only reachable by id when they also carry a name
        Some("img") => {
            element.attribute_is_nonempty_and("name", name)
                || (element.attribute_is_nonempty_and("id", name) && element.has_attribute("name"))
        }
        _ => false,
    }
}

/// Tags whose name attribute makes them a named property of `document.all`
pub(crate) fn name_visible_in_document_all(element: &Node) -> bool {
    matches!(
        element.local_name(),
        Some("applet" | "embed" | "form" | "img" | "input" | "object" | "select")
    ) && element.is_html_element()
}
