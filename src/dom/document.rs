//! Document - Headless element tree for the control layer.
//!
//! One document per UI thread. Elements are indices into an arena:
//!
//! ```text
//! e0: body
//! e1: div.cycle-slideshow   (parent=e0)
//! e2: img                   (parent=e1)
//! e3: div.cycle-pager       (parent=e0)
//! ```
//!
//! Ids are handed out monotonically and never recycled, so a handle to a
//! removed element simply stops resolving.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::types::ElementId;

// =============================================================================
// Document State
// =============================================================================

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    disabled: bool,
    text: String,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            disabled: false,
            text: String::new(),
        }
    }
}

struct Document {
    nodes: Vec<Option<Node>>,
    body: ElementId,
    active: Option<ElementId>,
}

impl Document {
    fn new() -> Self {
        Self {
            nodes: vec![Some(Node::new("body"))],
            body: ElementId(0),
            active: None,
        }
    }

    fn node(&self, el: ElementId) -> Option<&Node> {
        self.nodes.get(el.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, el: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(el.0).and_then(Option::as_mut)
    }

    fn detach(&mut self, el: ElementId) {
        let parent = self.node(el).and_then(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(p) = self.node_mut(parent) {
                p.children.retain(|&c| c != el);
            }
        }
        if let Some(n) = self.node_mut(el) {
            n.parent = None;
        }
    }

    fn is_ancestor_or_self(&self, ancestor: ElementId, el: ElementId) -> bool {
        let mut cursor = Some(el);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.node(current).and_then(|n| n.parent);
        }
        false
    }

    fn collect_subtree(&self, root: ElementId, out: &mut Vec<ElementId>) {
        if let Some(node) = self.node(root) {
            for &child in &node.children {
                out.push(child);
                self.collect_subtree(child, out);
            }
        }
    }
}

thread_local! {
    static DOCUMENT: RefCell<Document> = RefCell::new(Document::new());
}

fn read<R>(f: impl FnOnce(&Document) -> R) -> R {
    DOCUMENT.with(|doc| f(&doc.borrow()))
}

fn write<R>(f: impl FnOnce(&mut Document) -> R) -> R {
    DOCUMENT.with(|doc| f(&mut doc.borrow_mut()))
}

// =============================================================================
// Tree
// =============================================================================

/// The document body (root of the connected tree).
pub fn body() -> ElementId {
    read(|doc| doc.body)
}

/// Create a detached element.
pub fn create_element(tag: &str) -> ElementId {
    write(|doc| {
        doc.nodes.push(Some(Node::new(tag)));
        ElementId(doc.nodes.len() - 1)
    })
}

/// Check if the handle refers to a live element.
pub fn exists(el: ElementId) -> bool {
    read(|doc| doc.node(el).is_some())
}

/// Lowercase tag name.
pub fn tag_name(el: ElementId) -> Option<String> {
    read(|doc| doc.node(el).map(|n| n.tag.clone()))
}

/// Append `child` as the last child of `parent`, moving it if already placed.
///
/// Returns false if either element is gone or the move would create a cycle.
pub fn append_child(parent: ElementId, child: ElementId) -> bool {
    let len = children(parent).len();
    insert_child(parent, len, child)
}

/// Insert `child` at `index` among `parent`'s children (clamped to the end).
pub fn insert_child(parent: ElementId, index: usize, child: ElementId) -> bool {
    write(|doc| {
        if doc.node(parent).is_none() || doc.node(child).is_none() {
            return false;
        }
        if doc.is_ancestor_or_self(child, parent) {
            return false;
        }
        doc.detach(child);
        if let Some(p) = doc.node_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, child);
        }
        if let Some(c) = doc.node_mut(child) {
            c.parent = Some(parent);
        }
        true
    })
}

/// Remove an element and its whole subtree from the document.
///
/// Listeners registered on removed elements are dropped; focus inside the
/// subtree is cleared.
pub fn remove(el: ElementId) {
    let removed = write(|doc| {
        if doc.node(el).is_none() || el == doc.body {
            return Vec::new();
        }
        let mut subtree = vec![el];
        doc.collect_subtree(el, &mut subtree);
        doc.detach(el);
        for id in &subtree {
            doc.nodes[id.0] = None;
        }
        if doc.active.is_some_and(|active| subtree.contains(&active)) {
            doc.active = None;
        }
        subtree
    });
    for id in removed {
        super::events::forget_element(id);
    }
}

/// Parent element, if attached.
pub fn parent(el: ElementId) -> Option<ElementId> {
    read(|doc| doc.node(el).and_then(|n| n.parent))
}

/// Children in document order.
pub fn children(el: ElementId) -> Vec<ElementId> {
    read(|doc| doc.node(el).map(|n| n.children.clone()).unwrap_or_default())
}

/// Position of `el` among its parent's children.
pub fn child_index(el: ElementId) -> Option<usize> {
    let parent = parent(el)?;
    children(parent).iter().position(|&c| c == el)
}

/// Ancestors from the parent up to the root (excluding `el`).
pub fn ancestors(el: ElementId) -> Vec<ElementId> {
    read(|doc| {
        let mut out = Vec::new();
        let mut cursor = doc.node(el).and_then(|n| n.parent);
        while let Some(current) = cursor {
            out.push(current);
            cursor = doc.node(current).and_then(|n| n.parent);
        }
        out
    })
}

/// All descendants in document (pre-)order, excluding `el`.
pub fn descendants(el: ElementId) -> Vec<ElementId> {
    read(|doc| {
        let mut out = Vec::new();
        doc.collect_subtree(el, &mut out);
        out
    })
}

/// True if `el` is `ancestor` or inside it.
pub fn contains(ancestor: ElementId, el: ElementId) -> bool {
    read(|doc| doc.node(el).is_some() && doc.is_ancestor_or_self(ancestor, el))
}

/// True if the element is attached under the body.
pub fn is_connected(el: ElementId) -> bool {
    contains(body(), el)
}

/// Nearest element, starting at `el` itself, that satisfies `predicate`.
pub fn closest(el: ElementId, predicate: impl Fn(ElementId) -> bool) -> Option<ElementId> {
    if !exists(el) {
        return None;
    }
    std::iter::once(el)
        .chain(ancestors(el))
        .find(|&candidate| predicate(candidate))
}

// =============================================================================
// Attributes & Classes
// =============================================================================

pub fn get_attribute(el: ElementId, name: &str) -> Option<String> {
    read(|doc| doc.node(el).and_then(|n| n.attributes.get(name).cloned()))
}

pub fn has_attribute(el: ElementId, name: &str) -> bool {
    read(|doc| doc.node(el).is_some_and(|n| n.attributes.contains_key(name)))
}

pub fn set_attribute(el: ElementId, name: &str, value: &str) {
    write(|doc| {
        if let Some(n) = doc.node_mut(el) {
            n.attributes.insert(name.to_string(), value.to_string());
        }
    });
}

pub fn remove_attribute(el: ElementId, name: &str) {
    write(|doc| {
        if let Some(n) = doc.node_mut(el) {
            n.attributes.remove(name);
        }
    });
}

/// All attributes whose name starts with `prefix`, in name order.
pub fn attributes_with_prefix(el: ElementId, prefix: &str) -> Vec<(String, String)> {
    read(|doc| {
        doc.node(el)
            .map(|n| {
                n.attributes
                    .iter()
                    .filter(|(k, _)| k.starts_with(prefix))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    })
}

pub fn has_class(el: ElementId, class: &str) -> bool {
    read(|doc| doc.node(el).is_some_and(|n| n.classes.iter().any(|c| c == class)))
}

pub fn add_class(el: ElementId, class: &str) {
    if class.is_empty() {
        return;
    }
    write(|doc| {
        if let Some(n) = doc.node_mut(el) {
            if !n.classes.iter().any(|c| c == class) {
                n.classes.push(class.to_string());
            }
        }
    });
}

pub fn remove_class(el: ElementId, class: &str) {
    write(|doc| {
        if let Some(n) = doc.node_mut(el) {
            n.classes.retain(|c| c != class);
        }
    });
}

/// Add or remove `class` depending on `on`.
pub fn toggle_class(el: ElementId, class: &str, on: bool) {
    if on {
        add_class(el, class);
    } else {
        remove_class(el, class);
    }
}

pub fn classes(el: ElementId) -> Vec<String> {
    read(|doc| doc.node(el).map(|n| n.classes.clone()).unwrap_or_default())
}

/// Native `disabled` property.
pub fn is_disabled(el: ElementId) -> bool {
    read(|doc| doc.node(el).is_some_and(|n| n.disabled))
}

pub fn set_disabled(el: ElementId, disabled: bool) {
    write(|doc| {
        if let Some(n) = doc.node_mut(el) {
            n.disabled = disabled;
        }
    });
}

pub fn text(el: ElementId) -> String {
    read(|doc| doc.node(el).map(|n| n.text.clone()).unwrap_or_default())
}

pub fn set_text(el: ElementId, text: &str) {
    write(|doc| {
        if let Some(n) = doc.node_mut(el) {
            n.text = text.to_string();
        }
    });
}

// =============================================================================
// Interactivity & Focus
// =============================================================================

/// Button-like form control, or a hyperlink carrying a navigable target.
pub fn is_natively_interactive(el: ElementId) -> bool {
    read(|doc| {
        doc.node(el).is_some_and(|n| match n.tag.as_str() {
            "button" | "input" | "select" | "textarea" => true,
            "a" => n.attributes.contains_key("href"),
            _ => false,
        })
    })
}

/// Parsed `tabindex`, if declared and numeric.
pub fn tab_index(el: ElementId) -> Option<i32> {
    get_attribute(el, "tabindex").and_then(|v| v.trim().parse().ok())
}

/// Can the element receive focus at all (programmatically included).
pub fn is_focusable(el: ElementId) -> bool {
    if !exists(el) {
        return false;
    }
    if is_natively_interactive(el) {
        return !is_disabled(el);
    }
    tab_index(el).is_some()
}

/// Is the element reachable in sequential focus order (native, or tabindex >= 0).
pub fn is_tabbable(el: ElementId) -> bool {
    match tab_index(el) {
        Some(index) => index >= 0 && is_focusable(el),
        None => is_focusable(el),
    }
}

/// Currently focused element.
pub fn active_element() -> Option<ElementId> {
    read(|doc| doc.active.filter(|&el| doc.node(el).is_some()))
}

/// Focus an element. Non-focusable targets are ignored (returns false).
pub fn focus(el: ElementId) -> bool {
    if !is_focusable(el) {
        return false;
    }
    write(|doc| doc.active = Some(el));
    true
}

/// Clear focus.
pub fn blur() {
    write(|doc| doc.active = None);
}

// =============================================================================
// Builder
// =============================================================================

/// Fluent element construction for hosts and tests.
///
/// ```ignore
/// let show = ElementBuilder::new("div")
///     .class("cycle-slideshow")
///     .child(ElementBuilder::new("img"))
///     .child(ElementBuilder::new("img"))
///     .append_to(dom::body());
/// ```
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    tag: String,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    disabled: bool,
    children: Vec<ElementBuilder>,
}

impl ElementBuilder {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            classes: Vec::new(),
            attributes: Vec::new(),
            text: None,
            disabled: false,
            children: Vec::new(),
        }
    }

    /// Add one or more whitespace-separated classes.
    pub fn class(mut self, class: &str) -> Self {
        self.classes.extend(class.split_whitespace().map(str::to_string));
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn child(mut self, child: ElementBuilder) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ElementBuilder>) -> Self {
        self.children.extend(children);
        self
    }

    /// Create the (detached) element tree and return its root.
    pub fn build(self) -> ElementId {
        let el = create_element(&self.tag);
        for class in &self.classes {
            add_class(el, class);
        }
        for (name, value) in &self.attributes {
            set_attribute(el, name, value);
        }
        if let Some(text) = &self.text {
            set_text(el, text);
        }
        set_disabled(el, self.disabled);
        for child in self.children {
            let child_el = child.build();
            append_child(el, child_el);
        }
        el
    }

    /// Build and append under `parent`.
    pub fn append_to(self, parent: ElementId) -> ElementId {
        let el = self.build();
        append_child(parent, el);
        el
    }
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Drop every element and start from an empty body.
pub fn reset_document() {
    write(|doc| *doc = Document::new());
}
