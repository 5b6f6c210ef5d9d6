//! DOM Events - Listener registry and dispatch
//!
//! Listeners are keyed by element and tagged with a namespace so a binder can
//! remove exactly what it added (`off(el, None, "cycle-pager")`).
//!
//! Dispatch order: target, then each ancestor (bubbling), then document-level
//! listeners. A handler can `prevent_default()` (consume) or
//! `stop_propagation()` (end the walk).
//!
//! Default actions mirror the browser:
//! - `click` is not delivered to a disabled element
//! - an unprevented `Enter` keydown on a natively interactive element
//!   synthesizes a `click`

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Deserialize;

use crate::error::Error;
use crate::input::KeyboardEvent;
use crate::types::ElementId;

use super::document as doc;

// =============================================================================
// TYPES
// =============================================================================

/// Event types the control layer listens for.
///
/// Deserializes from web event names (`"click"`, `"mouseover"`), with any
/// `.namespace` suffix ignored (`"click.cycle"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum EventType {
    Click,
    KeyDown,
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    MouseEnter,
    MouseLeave,
}

impl EventType {
    /// Parse a web event name. Hover names all map to `MouseEnter`.
    pub fn from_name(name: &str) -> Option<Self> {
        let base = name.trim().split('.').next().unwrap_or_default();
        match base.to_ascii_lowercase().as_str() {
            "click" => Some(EventType::Click),
            "keydown" => Some(EventType::KeyDown),
            "mouseenter" | "mouseover" => Some(EventType::MouseEnter),
            "mouseleave" | "mouseout" => Some(EventType::MouseLeave),
            "swipeleft" => Some(EventType::SwipeLeft),
            "swiperight" => Some(EventType::SwipeRight),
            "swipeup" => Some(EventType::SwipeUp),
            "swipedown" => Some(EventType::SwipeDown),
            _ => None,
        }
    }

    /// Enter/leave never bubble.
    fn bubbles(self) -> bool {
        !matches!(self, EventType::MouseEnter | EventType::MouseLeave)
    }
}

/// Event being dispatched.
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub kind: EventType,
    /// Element the event was dispatched to.
    pub target: ElementId,
    /// Element whose listener is running (None for document listeners).
    pub current_target: Option<ElementId>,
    /// Key info for `KeyDown`.
    pub key: Option<KeyboardEvent>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl TryFrom<String> for EventType {
    type Error = Error;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::from_name(&name).ok_or_else(|| Error::invalid_option("event", &name))
    }
}

impl DomEvent {
    pub fn new(kind: EventType, target: ElementId) -> Self {
        Self {
            kind,
            target,
            current_target: None,
            key: None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn key_down(target: ElementId, key: KeyboardEvent) -> Self {
        Self {
            key: Some(key),
            ..Self::new(EventType::KeyDown, target)
        }
    }

    /// Mark the event as handled.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Listener callback.
pub type Listener = Rc<dyn Fn(&mut DomEvent)>;

struct Entry {
    kind: EventType,
    namespace: String,
    listener: Listener,
}

#[derive(Default)]
struct ListenerRegistry {
    elements: HashMap<ElementId, Vec<Entry>>,
    document: Vec<Entry>,
}

thread_local! {
    static LISTENERS: RefCell<ListenerRegistry> = RefCell::new(ListenerRegistry::default());
}

// =============================================================================
// REGISTRATION
// =============================================================================

/// Listen for `kind` on `el` under `namespace`. Ignored for dead elements.
pub fn on<F>(el: ElementId, kind: EventType, namespace: &str, listener: F)
where
    F: Fn(&mut DomEvent) + 'static,
{
    if !doc::exists(el) {
        return;
    }
    LISTENERS.with(|reg| {
        reg.borrow_mut().elements.entry(el).or_default().push(Entry {
            kind,
            namespace: namespace.to_string(),
            listener: Rc::new(listener),
        });
    });
}

/// Remove listeners on `el` in `namespace`, optionally only of one type.
pub fn off(el: ElementId, kind: Option<EventType>, namespace: &str) {
    LISTENERS.with(|reg| {
        let mut reg = reg.borrow_mut();
        if let Some(entries) = reg.elements.get_mut(&el) {
            entries.retain(|e| !(e.namespace == namespace && kind.is_none_or(|k| k == e.kind)));
            if entries.is_empty() {
                reg.elements.remove(&el);
            }
        }
    });
}

/// Listen at document level.
pub fn on_document<F>(kind: EventType, namespace: &str, listener: F)
where
    F: Fn(&mut DomEvent) + 'static,
{
    LISTENERS.with(|reg| {
        reg.borrow_mut().document.push(Entry {
            kind,
            namespace: namespace.to_string(),
            listener: Rc::new(listener),
        });
    });
}

/// Remove document-level listeners in `namespace`.
pub fn off_document(namespace: &str) {
    LISTENERS.with(|reg| {
        reg.borrow_mut().document.retain(|e| e.namespace != namespace);
    });
}

/// Number of listeners on `el` (all namespaces).
pub fn listener_count(el: ElementId) -> usize {
    LISTENERS.with(|reg| reg.borrow().elements.get(&el).map_or(0, Vec::len))
}

/// Number of listeners on `el` in one namespace.
pub fn namespace_count(el: ElementId, namespace: &str) -> usize {
    LISTENERS.with(|reg| {
        reg.borrow()
            .elements
            .get(&el)
            .map_or(0, |entries| entries.iter().filter(|e| e.namespace == namespace).count())
    })
}

/// Number of document-level listeners of `kind`.
pub fn document_listener_count(kind: EventType) -> usize {
    LISTENERS.with(|reg| reg.borrow().document.iter().filter(|e| e.kind == kind).count())
}

/// Drop all listeners of a removed element.
pub(crate) fn forget_element(el: ElementId) {
    LISTENERS.with(|reg| {
        reg.borrow_mut().elements.remove(&el);
    });
}

// =============================================================================
// DISPATCH
// =============================================================================

fn element_listeners(el: ElementId, kind: EventType) -> Vec<Listener> {
    LISTENERS.with(|reg| {
        reg.borrow()
            .elements
            .get(&el)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.kind == kind)
                    .map(|e| e.listener.clone())
                    .collect()
            })
            .unwrap_or_default()
    })
}

fn document_listeners(kind: EventType) -> Vec<Listener> {
    LISTENERS.with(|reg| {
        reg.borrow()
            .document
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.listener.clone())
            .collect()
    })
}

/// Dispatch an event through target, ancestors, then document.
///
/// Listener lists are snapshotted per element before calling out, so
/// listeners may freely register, remove, or dispatch.
pub fn dispatch(mut event: DomEvent) -> DomEvent {
    if !doc::exists(event.target) {
        return event;
    }

    let mut path = vec![event.target];
    if event.kind.bubbles() {
        path.extend(doc::ancestors(event.target));
    }

    for el in path {
        event.current_target = Some(el);
        for listener in element_listeners(el, event.kind) {
            listener(&mut event);
        }
        if event.propagation_stopped {
            return event;
        }
    }

    if event.kind.bubbles() {
        event.current_target = None;
        for listener in document_listeners(event.kind) {
            listener(&mut event);
        }
    }
    event
}

/// Pointer activation. Disabled elements receive nothing.
pub fn click(el: ElementId) -> DomEvent {
    if doc::is_disabled(el) {
        return DomEvent::new(EventType::Click, el);
    }
    dispatch(DomEvent::new(EventType::Click, el))
}

/// Key event aimed at `el`, followed by the native Enter-activates default.
///
/// Only a press of Enter activates; repeats and releases are dispatched but
/// never synthesize a click.
pub fn key_down(el: ElementId, key: KeyboardEvent) -> DomEvent {
    let activates = key.is_enter() && key.is_press();
    let event = dispatch(DomEvent::key_down(el, key));
    if activates && !event.default_prevented && doc::is_natively_interactive(el) {
        click(el);
    }
    event
}

/// Key press aimed at the focused element (or the body when nothing has focus).
pub fn press_key(key: KeyboardEvent) -> DomEvent {
    let target = doc::active_element().unwrap_or_else(doc::body);
    key_down(target, key)
}

/// Directional swipe gesture on `el`.
pub fn swipe(el: ElementId, kind: EventType) -> DomEvent {
    dispatch(DomEvent::new(kind, el))
}

/// Pointer entering (`true`) or leaving (`false`) `el`.
pub fn hover(el: ElementId, entering: bool) -> DomEvent {
    let kind = if entering { EventType::MouseEnter } else { EventType::MouseLeave };
    dispatch(DomEvent::new(kind, el))
}

// =============================================================================
// RESET (for testing)
// =============================================================================

/// Drop every listener, element and document level.
pub fn reset_events() {
    LISTENERS.with(|reg| *reg.borrow_mut() = ListenerRegistry::default());
}

// =============================================================================
// TESTS
// =============================================================================
