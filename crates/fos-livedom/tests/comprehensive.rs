//! Comprehensive tests for fos-livedom
//!
//! Live sharing, document order under mutation, selective invalidation,
//! access patterns, adoption and named lookup across the collection types.

use fos_livedom::invalidation::{notify_children_changed, ChildrenChangeKind};
use fos_livedom::{
    CacheState, CollectionType, Document, InvalidationCategory, LiveDomConfig, Node, RootType,
};

fn document_with_body(config: LiveDomConfig) -> (Document, Node) {
    let doc = Document::with_config(config);
    let html = doc.create_element("html");
    let body = doc.create_element("body");
    doc.append_child(&html).unwrap();
    html.append_child(&body).unwrap();
    (doc, body)
}

fn el(doc: &Document, tag: &str, attrs: &[(&str, &str)]) -> Node {
    let element = doc.create_element(tag);
    for (name, value) in attrs {
        element.set_attribute(name, value).unwrap();
    }
    element
}

fn ids(nodes: impl IntoIterator<Item = Node>) -> Vec<String> {
    nodes.into_iter().map(|n| n.id().unwrap_or_default()).collect()
}

/// Independent pre-order scan, used as the reference answer
fn scan(root: &Node, matches: &dyn Fn(&Node) -> bool) -> Vec<Node> {
    fn walk(node: &Node, matches: &dyn Fn(&Node) -> bool, out: &mut Vec<Node>) {
        for child in node.child_iter() {
            if child.is_element() && matches(&child) {
                out.push(child.clone());
            }
            walk(&child, matches, out);
        }
    }
    let mut out = Vec::new();
    walk(root, matches, &mut out);
    out
}

// ============================================================================
// CONCRETE SCENARIO
// ============================================================================

#[test]
fn test_tag_collection_scenario() {
    let doc = Document::new();
    let root = el(&doc, "div", &[("id", "root")]);
    let a = el(&doc, "p", &[("id", "a")]);
    let b = el(&doc, "span", &[("class", "x"), ("id", "b")]);
    let c = el(&doc, "p", &[("id", "c")]);
    root.append_child(&a).unwrap();
    root.append_child(&b).unwrap();
    root.append_child(&c).unwrap();

    let ps = root.get_elements_by_tag_name("p");
    assert_eq!(ps.length(), 2);
    assert_eq!(ps.item(0), Some(a.clone()));
    assert_eq!(ps.item(1), Some(c.clone()));

    let d = el(&doc, "p", &[("id", "d")]);
    root.insert_before(&d, root.first_child().as_ref()).unwrap();
    notify_children_changed(&root, ChildrenChangeKind::ElementInserted);
    assert_eq!(ps.length(), 3);
    assert_eq!(ps.item(0), Some(d.clone()));

    // Coarse child invalidation: the cache is reset even though no <p> moved
    root.remove_child(&b).unwrap();
    assert_eq!(ps.cache_state(), CacheState::default());
    assert_eq!(ps.length(), 3);
    assert_eq!(ids(ps.iter()), ["d", "a", "c"]);
}

// ============================================================================
// LIVE SHARING
// ============================================================================

#[test]
fn test_same_key_shares_one_instance() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let first = body.get_elements_by_class_name("x");
    let second = body.get_elements_by_class_name("x");
    assert!(first.ptr_eq(&second));
    assert_eq!(
        body.collection(CollectionType::ClassNodeList, Some("x")).unwrap(),
        first
    );

    body.append_child(&el(&doc, "div", &[("class", "x")])).unwrap();
    assert_eq!(first.length(), 1);
    assert_eq!(second.cache_state(), first.cache_state());
    assert_eq!(doc.images(), doc.images());
}

#[test]
fn test_dropping_last_handle_recreates() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    body.append_child(&el(&doc, "img", &[])).unwrap();
    let images = doc.images();
    assert_eq!(images.length(), 1);
    drop(images);
    assert_eq!(doc.node_list_count(InvalidationCategory::None), 0);
    let images = doc.images();
    assert_eq!(images.cache_state(), CacheState::default());
    assert_eq!(images.length(), 1);
}

// ============================================================================
// DOCUMENT ORDER UNDER MUTATION
// ============================================================================

struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next() % bound as u64) as usize
    }
}

#[test]
fn test_document_order_matches_full_scan() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let tags = ["p", "div", "span", "p", "em"];
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
    let mut nodes = vec![body.clone()];

    let by_tag = body.get_elements_by_tag_name("p");
    let by_class = body.get_elements_by_class_name("hot");
    let all = body.get_elements_by_tag_name("*");

    for step in 0..300 {
        match rng.below(5) {
            0 | 1 => {
                let parent = nodes[rng.below(nodes.len())].clone();
                let element = doc.create_element(tags[rng.below(tags.len())]);
                element.set_attribute("id", &format!("n{step}")).unwrap();
                let reference = parent.child_iter().nth(rng.below(parent.child_count() + 1));
                parent.insert_before(&element, reference.as_ref()).unwrap();
                nodes.push(element);
            }
            2 if nodes.len() > 1 => {
                let victim = nodes[1 + rng.below(nodes.len() - 1)].clone();
                victim.remove();
                nodes.retain(|n| n.is_connected());
            }
            3 if nodes.len() > 1 => {
                let target = &nodes[1 + rng.below(nodes.len() - 1)];
                if rng.below(2) == 0 {
                    target.set_attribute("class", "hot cold").unwrap();
                } else {
                    target.remove_attribute("class");
                }
            }
            _ => {
                let target = &nodes[rng.below(nodes.len())];
                target.append_child(&doc.create_text_node("t")).unwrap();
            }
        }

        // Interleave reads at random offsets
        let probe = rng.below(8);
        let _ = by_tag.item(probe);
        let _ = by_class.item(probe);

        let expected_p = scan(&body, &|n| n.has_tag_name("p"));
        let expected_hot = scan(&body, &|n| {
            n.get_attribute("class")
                .is_some_and(|c| c.split_ascii_whitespace().any(|t| t == "hot"))
        });
        let expected_all = scan(&body, &|_| true);
        assert_eq!(by_tag.to_vec(), expected_p, "step {step}");
        assert_eq!(by_class.to_vec(), expected_hot, "step {step}");
        assert_eq!(all.length(), expected_all.len(), "step {step}");
    }
}

// ============================================================================
// SELECTIVE INVALIDATION
// ============================================================================

#[test]
fn test_irrelevant_attributes_keep_caches() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let form = el(&doc, "form", &[("id", "f")]);
    let input = el(&doc, "input", &[("name", "q")]);
    let link = el(&doc, "a", &[("href", "/")]);
    form.append_child(&input).unwrap();
    body.append_child(&form).unwrap();
    body.append_child(&link).unwrap();

    let tags = body.get_elements_by_tag_name("input");
    let controls = form.elements();
    let links = doc.links();
    assert_eq!(tags.length(), 1);
    assert_eq!(controls.length(), 1);
    assert_eq!(links.length(), 1);
    let snapshot = (tags.cache_state(), controls.cache_state(), links.cache_state());

    input.set_attribute("style", "display:none").unwrap();
    input.set_attribute("placeholder", "search").unwrap();
    link.set_attribute("title", "home").unwrap();
    assert_eq!(
        (tags.cache_state(), controls.cache_state(), links.cache_state()),
        snapshot
    );

    // Each collection reacts to its own category
    link.set_attribute("href", "/other").unwrap();
    assert_eq!(links.cache_state(), CacheState::default());
    assert_eq!(tags.cache_state(), snapshot.0);

    input.set_attribute("form", "f").unwrap();
    assert_eq!(controls.cache_state(), CacheState::default());
    assert_eq!(controls.length(), 1);
}

#[test]
fn test_class_list_reacts_only_to_class() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let div = el(&doc, "div", &[]);
    body.append_child(&div).unwrap();
    let hot = body.get_elements_by_class_name("hot");
    assert_eq!(hot.length(), 0);

    div.set_attribute("data-hot", "1").unwrap();
    assert_eq!(hot.cache_state().cached_length, Some(0));
    div.set_attribute("class", "hot").unwrap();
    assert_eq!(hot.length(), 1);
    div.remove_attribute("class");
    assert_eq!(hot.length(), 0);
}

#[test]
fn test_counters_track_categories() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let anchors = doc.anchors();
    let labels = body.labels();
    let names = body.get_elements_by_name("n");
    assert_eq!(doc.node_list_count(InvalidationCategory::OnNameAttrChange), 2);
    assert_eq!(doc.node_list_count(InvalidationCategory::OnForAttrChange), 1);
    drop((anchors, labels, names));
    assert_eq!(doc.node_list_count(InvalidationCategory::OnNameAttrChange), 0);
    assert_eq!(doc.node_list_count(InvalidationCategory::OnForAttrChange), 0);
}

// ============================================================================
// ACCESS PATTERNS
// ============================================================================

#[test]
fn test_forward_then_backward_matches_scan() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    for i in 0..40 {
        let parent = if i % 3 == 0 { body.clone() } else { body.last_child().unwrap() };
        let tag = if i % 2 == 0 { "p" } else { "div" };
        parent.append_child(&el(&doc, tag, &[("id", &format!("e{i}"))])).unwrap();
    }
    let ps = body.get_elements_by_tag_name("p");
    let expected = scan(&body, &|n| n.has_tag_name("p"));
    let n = ps.length();
    assert_eq!(n, expected.len());

    let forward: Vec<_> = (0..n).filter_map(|i| ps.item(i)).collect();
    let backward: Vec<_> = (0..n).rev().filter_map(|i| ps.item(i)).collect();
    assert_eq!(forward, expected);
    assert_eq!(backward.into_iter().rev().collect::<Vec<_>>(), expected);

    // Jumps in both directions
    for &i in &[n - 1, 0, n / 2, 1, n - 2, n / 3] {
        assert_eq!(ps.item(i), Some(expected[i].clone()), "offset {i}");
    }
    assert_eq!(ps.item(n), None);
}

#[test]
fn test_child_nodes_include_text() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    body.append_child(&doc.create_text_node("a")).unwrap();
    body.append_child(&el(&doc, "b", &[])).unwrap();
    body.append_child(&doc.create_comment("c")).unwrap();
    let nodes = body.child_nodes();
    assert_eq!(nodes.length(), 3);
    assert!(nodes.item(0).unwrap().is_text());
    assert_eq!(nodes.item(2).unwrap().character_data().as_deref(), Some("c"));
    assert_eq!(body.children().length(), 1);
}

// ============================================================================
// ADOPTION
// ============================================================================

#[test]
fn test_adoption_transfers_collection() {
    let (first, first_body) = document_with_body(LiveDomConfig::default());
    let (second, second_body) = document_with_body(LiveDomConfig::default());

    let root = el(&first, "div", &[]);
    root.append_child(&el(&first, "p", &[])).unwrap();
    first_body.append_child(&root).unwrap();
    let ps = root.get_elements_by_tag_name("p");
    assert_eq!(ps.length(), 1);
    assert_eq!(first.node_list_count(InvalidationCategory::None), 1);

    second_body.append_child(&root).unwrap();
    assert_eq!(root.owner_document(), Some(second.clone()));
    assert_eq!(first.node_list_count(InvalidationCategory::None), 0);
    assert_eq!(second.node_list_count(InvalidationCategory::None), 1);

    root.append_child(&second.create_element("p")).unwrap();
    assert_eq!(ps.length(), 2);
    assert_eq!(ps.to_vec(), scan(&root, &|n| n.has_tag_name("p")));
}

#[test]
fn test_adoption_of_document_rooted_collection() {
    let (first, _) = document_with_body(LiveDomConfig::default());
    let (second, second_body) = document_with_body(LiveDomConfig::default());

    let form = first.create_element("form");
    form.append_child(&el(&first, "input", &[])).unwrap();
    let controls = form.elements();
    assert_eq!(controls.root_type(), RootType::RootedAtDocument);
    assert_eq!(controls.length(), 1);

    second.adopt_node(&form).unwrap();
    second_body.append_child(&form).unwrap();
    // A control elsewhere in the new document joins through the form attribute
    form.set_attribute("id", "f").unwrap();
    second_body.append_child(&el(&second, "input", &[("form", "f")])).unwrap();
    assert_eq!(controls.length(), 2);
    drop(first);
}

// ============================================================================
// NAMED ITEMS
// ============================================================================

#[test]
fn test_named_item_fast_and_slow_paths_agree() {
    for fast in [true, false] {
        let config = LiveDomConfig::builder().named_item_fast_path(fast).build();
        let (doc, body) = document_with_body(config);
        let unique = el(&doc, "img", &[("id", "unique")]);
        let first = el(&doc, "img", &[("name", "shared")]);
        let second = el(&doc, "img", &[("name", "shared")]);
        let third = el(&doc, "form", &[("name", "shared")]);
        body.append_child(&first).unwrap();
        body.append_child(&unique).unwrap();
        let wrapper = el(&doc, "div", &[]);
        wrapper.append_child(&second).unwrap();
        body.append_child(&wrapper).unwrap();
        body.append_child(&third).unwrap();

        let images = doc.images();
        assert_eq!(images.named_item("unique"), Some(unique.clone()), "fast={fast}");
        assert_eq!(images.named_item("shared"), Some(first.clone()), "fast={fast}");
        assert_eq!(images.named_items("shared"), vec![first.clone(), second.clone()]);

        let all = doc.all();
        assert_eq!(all.named_items("shared"), vec![first, second, third]);
        assert_eq!(all.named_item(""), None);
    }
}

#[test]
fn test_window_and_document_named_items() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let img = el(&doc, "img", &[("name", "x")]);
    let div = el(&doc, "div", &[("id", "x")]);
    let span = el(&doc, "span", &[("name", "x")]);
    let iframe = el(&doc, "iframe", &[("name", "x")]);
    for node in [&img, &div, &span, &iframe] {
        body.append_child(node).unwrap();
    }

    let window = doc.window_named_items("x");
    assert_eq!(window.to_vec(), vec![img.clone(), div.clone()]);
    let document = doc.document_named_items("x");
    assert_eq!(document.to_vec(), vec![img.clone(), iframe.clone()]);

    // The id/name category keeps both views honest
    div.set_attribute("id", "y").unwrap();
    assert_eq!(window.to_vec(), vec![img.clone()]);
    iframe.set_attribute("name", "z").unwrap();
    assert_eq!(document.to_vec(), vec![img]);
}

// ============================================================================
// CONCRETE COLLECTIONS
// ============================================================================

#[test]
fn test_document_collections() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    body.append_child(&el(&doc, "img", &[])).unwrap();
    body.append_child(&el(&doc, "a", &[("href", "/x")])).unwrap();
    body.append_child(&el(&doc, "a", &[("name", "top")])).unwrap();
    body.append_child(&el(&doc, "area", &[("href", "/y")])).unwrap();
    body.append_child(&el(&doc, "script", &[])).unwrap();
    body.append_child(&el(&doc, "embed", &[])).unwrap();
    body.append_child(&el(&doc, "applet", &[])).unwrap();
    body.append_child(&el(&doc, "object", &[("type", "application/x-java-applet")])).unwrap();
    body.append_child(&el(&doc, "object", &[("type", "image/png")])).unwrap();
    body.append_child(&el(&doc, "form", &[])).unwrap();

    assert_eq!(doc.images().length(), 1);
    assert_eq!(doc.links().length(), 2);
    assert_eq!(doc.anchors().length(), 1);
    assert_eq!(doc.scripts().length(), 1);
    assert_eq!(doc.embeds().length(), 1);
    assert_eq!(doc.plugins(), doc.embeds());
    assert_eq!(doc.applets().length(), 2);
    assert_eq!(doc.forms().length(), 1);
    // html, body and the ten above
    assert_eq!(doc.all().length(), 12);
}

#[test]
fn test_applets_follow_any_attribute() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let object = el(&doc, "object", &[]);
    body.append_child(&object).unwrap();
    let applets = doc.applets();
    assert_eq!(applets.length(), 0);
    object.set_attribute("type", "application/x-java-applet;version=1.8").unwrap();
    assert_eq!(applets.length(), 1);
}

#[test]
fn test_table_collections() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let table = el(&doc, "table", &[]);
    let tbody = el(&doc, "tbody", &[]);
    let tfoot = el(&doc, "tfoot", &[]);
    let thead = el(&doc, "thead", &[]);
    let row = |id: &str| el(&doc, "tr", &[("id", id)]);
    let (b1, f1, h1) = (row("b1"), row("f1"), row("h1"));
    tbody.append_child(&b1).unwrap();
    tfoot.append_child(&f1).unwrap();
    thead.append_child(&h1).unwrap();
    table.append_child(&tfoot).unwrap();
    table.append_child(&tbody).unwrap();
    table.append_child(&thead).unwrap();
    body.append_child(&table).unwrap();

    let rows = table.rows();
    assert_eq!(ids(rows.iter()), ["h1", "b1", "f1"]);
    assert_eq!(table.t_bodies().to_vec(), vec![tbody.clone()]);
    assert_eq!(tbody.section_rows().to_vec(), vec![b1.clone()]);

    // A direct row lands between the sections' body rows in tree order
    table.append_child(&row("r1")).unwrap();
    assert_eq!(ids(rows.iter()), ["h1", "b1", "r1", "f1"]);

    b1.append_child(&el(&doc, "td", &[])).unwrap();
    b1.append_child(&el(&doc, "th", &[])).unwrap();
    let inner = el(&doc, "div", &[]);
    inner.append_child(&el(&doc, "td", &[])).unwrap();
    b1.append_child(&inner).unwrap();
    assert_eq!(b1.cells().length(), 2);
}

#[test]
fn test_select_and_datalist_options() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let select = el(&doc, "select", &[]);
    let one = el(&doc, "option", &[("value", "1")]);
    let two = el(&doc, "option", &[("value", "2")]);
    let group = el(&doc, "optgroup", &[]);
    group.append_child(&two).unwrap();
    select.append_child(&one).unwrap();
    select.append_child(&group).unwrap();
    body.append_child(&select).unwrap();

    assert_eq!(select.options().length(), 2);
    let selected = select.selected_options();
    assert_eq!(selected.length(), 0);
    two.set_attribute("selected", "").unwrap();
    assert_eq!(selected.to_vec(), vec![two.clone()]);

    let datalist = el(&doc, "datalist", &[]);
    let enabled = el(&doc, "option", &[("value", "a")]);
    let disabled = el(&doc, "option", &[("value", "b"), ("disabled", "")]);
    let empty = el(&doc, "option", &[]);
    for option in [&enabled, &disabled, &empty] {
        datalist.append_child(option).unwrap();
    }
    body.append_child(&datalist).unwrap();
    let suggestions = datalist.datalist_options();
    assert_eq!(suggestions.to_vec(), vec![enabled.clone()]);
    disabled.remove_attribute("disabled");
    assert_eq!(suggestions.length(), 2);
}

#[test]
fn test_map_areas() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let map = el(&doc, "map", &[]);
    map.append_child(&el(&doc, "area", &[])).unwrap();
    let nested = el(&doc, "div", &[]);
    nested.append_child(&el(&doc, "area", &[])).unwrap();
    map.append_child(&nested).unwrap();
    body.append_child(&map).unwrap();
    assert_eq!(map.areas().length(), 2);
}

#[test]
fn test_form_controls_and_radio_lists() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let form = el(&doc, "form", &[("id", "f")]);
    let fieldset = el(&doc, "fieldset", &[]);
    let r1 = el(&doc, "input", &[("type", "radio"), ("name", "color")]);
    let r2 = el(&doc, "input", &[("type", "radio"), ("name", "color")]);
    let image = el(&doc, "input", &[("type", "image"), ("name", "color")]);
    let text = el(&doc, "textarea", &[]);
    fieldset.append_child(&r1).unwrap();
    fieldset.append_child(&r2).unwrap();
    form.append_child(&fieldset).unwrap();
    form.append_child(&image).unwrap();
    form.append_child(&text).unwrap();
    body.append_child(&form).unwrap();
    let outside = el(&doc, "input", &[("name", "color"), ("form", "f")]);
    body.append_child(&outside).unwrap();

    let controls = form.elements();
    assert_eq!(controls.to_vec(), vec![fieldset.clone(), r1.clone(), r2.clone(), text.clone(), outside.clone()]);
    assert_eq!(controls.named_item("color"), Some(r1.clone()));
    assert_eq!(fieldset.elements().to_vec(), vec![r1.clone(), r2.clone()]);

    let radios = form.radio_node_list("color");
    assert_eq!(radios.to_vec(), vec![r1.clone(), r2.clone(), outside.clone()]);
    outside.remove_attribute("form");
    assert_eq!(radios.to_vec(), vec![r1, r2]);
    assert_eq!(controls.length(), 4);
}

#[test]
fn test_labels_follow_for_attribute() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let input = el(&doc, "input", &[("id", "field")]);
    let wrapping = el(&doc, "label", &[]);
    let other = el(&doc, "input", &[]);
    wrapping.append_child(&other).unwrap();
    let pointing = el(&doc, "label", &[("for", "elsewhere")]);
    body.append_child(&input).unwrap();
    body.append_child(&wrapping).unwrap();
    body.append_child(&pointing).unwrap();

    let labels = input.labels();
    assert_eq!(labels.length(), 0);
    pointing.set_attribute("for", "field").unwrap();
    assert_eq!(labels.to_vec(), vec![pointing.clone()]);
    assert_eq!(other.labels().to_vec(), vec![wrapping]);
}

/// Labels of `control` found by a full walk: `for` pointing at its id, or
/// wrapping it without a `for`
fn labels_by_scan(scope: &Node, control: &Node) -> Vec<Node> {
    if control.attribute_equals("type", "hidden") {
        return Vec::new();
    }
    scan(scope, &|n| {
        n.has_tag_name("label")
            && match n.get_attribute("for") {
                Some(target) => control.id().as_deref() == Some(target.as_str()),
                None => control.is_descendant_of(n),
            }
    })
}

#[test]
fn test_labels_follow_control_id_and_type() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let pointing = el(&doc, "label", &[("for", "x")]);
    let control = el(&doc, "input", &[]);
    let wrapping = el(&doc, "label", &[]);
    let inner = el(&doc, "input", &[]);
    wrapping.append_child(&inner).unwrap();
    body.append_child(&pointing).unwrap();
    body.append_child(&control).unwrap();
    body.append_child(&wrapping).unwrap();

    let labels = control.labels();
    let inner_labels = inner.labels();
    assert_eq!(labels.length(), 0);
    assert_eq!(inner_labels.to_vec(), vec![wrapping.clone()]);

    // The control takes the id the label already points at
    control.set_attribute("id", "x").unwrap();
    assert_eq!(labels.to_vec(), vec![pointing.clone()]);
    assert_eq!(labels.to_vec(), labels_by_scan(&body, &control));

    // Hidden inputs are not labelable
    control.set_attribute("type", "hidden").unwrap();
    assert_eq!(labels.length(), 0);
    assert_eq!(labels.to_vec(), labels_by_scan(&body, &control));
    control.remove_attribute("type");
    assert_eq!(labels.to_vec(), vec![pointing]);

    control.set_attribute("id", "y").unwrap();
    assert_eq!(labels.length(), 0);
    assert_eq!(labels.to_vec(), labels_by_scan(&body, &control));

    inner.set_attribute("type", "hidden").unwrap();
    assert_eq!(inner_labels.length(), 0);
    inner.set_attribute("type", "text").unwrap();
    assert_eq!(inner_labels.to_vec(), labels_by_scan(&body, &inner));
}

#[test]
fn test_microdata_properties_react_to_itemprop() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let item = el(&doc, "div", &[("itemscope", "")]);
    let name = el(&doc, "span", &[("itemprop", "name")]);
    let price = el(&doc, "span", &[]);
    item.append_child(&name).unwrap();
    item.append_child(&price).unwrap();
    body.append_child(&item).unwrap();

    let props = item.properties();
    let prices = item.property_node_list("price");
    assert_eq!(props.to_vec(), vec![name.clone()]);
    assert_eq!(prices.length(), 0);

    price.set_attribute("itemprop", "price").unwrap();
    assert_eq!(props.to_vec(), vec![name, price.clone()]);
    assert_eq!(prices.to_vec(), vec![price.clone()]);
    assert_eq!(props.named_item("price"), Some(price));

    let detail = el(&doc, "p", &[("id", "detail"), ("itemprop", "detail")]);
    body.append_child(&detail).unwrap();
    item.set_attribute("itemref", "detail").unwrap();
    assert_eq!(props.length(), 3);
    assert_eq!(props.item(2), Some(detail));
}

fn has_itemprop(node: &Node, token: Option<&str>) -> bool {
    node.get_attribute("itemprop").is_some_and(|value| {
        let mut tokens = value.split_ascii_whitespace();
        match token {
            Some(token) => tokens.any(|t| t == token),
            None => tokens.next().is_some(),
        }
    })
}

#[test]
fn test_microdata_follows_itemref_target_mutations() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let referenced = el(&doc, "div", &[("id", "r")]);
    let item = el(&doc, "div", &[("itemscope", ""), ("itemref", "r")]);
    body.append_child(&referenced).unwrap();
    body.append_child(&item).unwrap();

    let named_a = item.property_node_list("a");
    let props = item.properties();
    assert_eq!(named_a.root_type(), RootType::RootedAtDocument);
    assert_eq!(named_a.length(), 0);
    assert_eq!(props.length(), 0);

    // Children inserted into the referenced element, outside the item
    let first = el(&doc, "span", &[("itemprop", "a")]);
    referenced.append_child(&first).unwrap();
    assert_eq!(named_a.to_vec(), vec![first.clone()]);
    assert_eq!(props.to_vec(), vec![first.clone()]);

    let second = el(&doc, "span", &[]);
    referenced.append_child(&second).unwrap();
    second.set_attribute("itemprop", "a b").unwrap();
    assert_eq!(named_a.to_vec(), scan(&referenced, &|n| has_itemprop(n, Some("a"))));
    assert_eq!(named_a.length(), 2);
    assert_eq!(props.to_vec(), scan(&referenced, &|n| has_itemprop(n, None)));

    first.remove();
    assert_eq!(named_a.to_vec(), vec![second.clone()]);
    assert_eq!(props.named_item("b"), Some(second));

    // The reference stops resolving once the target's id changes
    referenced.set_attribute("id", "elsewhere").unwrap();
    assert_eq!(named_a.length(), 0);
    assert_eq!(props.length(), 0);
}

#[test]
fn test_tag_names_in_foreign_content() {
    let (doc, body) = document_with_body(LiveDomConfig::default());
    let svg = doc.create_element_ns(fos_livedom::Namespace::Svg, "svg");
    let gradient = doc.create_element_ns(fos_livedom::Namespace::Svg, "linearGradient");
    svg.append_child(&gradient).unwrap();
    body.append_child(&svg).unwrap();
    body.append_child(&el(&doc, "DIV", &[])).unwrap();

    assert_eq!(body.get_elements_by_tag_name("linearGradient").length(), 1);
    assert_eq!(body.get_elements_by_tag_name("lineargradient").length(), 0);
    assert_eq!(body.get_elements_by_tag_name("DIV").length(), 1);
    // SVG elements are not HTML images even if named so
    body.append_child(&doc.create_element_ns(fos_livedom::Namespace::Svg, "img")).unwrap();
    assert_eq!(doc.images().length(), 0);
}
