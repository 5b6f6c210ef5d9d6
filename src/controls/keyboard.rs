//! Keyboard Navigation - arrow keys across items within a slide, then slides.
//!
//! One document-level keydown listener serves every slideshow. Each
//! ArrowLeft/ArrowRight is resolved to an instance from the focused element:
//! 1. nearest ancestor-or-self that hosts a slideshow
//! 2. nearest ancestor-or-self that is a live show's slides root
//! 3. the owner tag of a control outside the container (pager item, button)
//!
//! Within the resolved show, focus walks the active slide's tabbable items.
//! Past the last item the show advances, and once the engine reports the
//! transition finished, focus lands on the first item of the new slide (or
//! the container if it has none). ArrowLeft mirrors this toward the last item.
//!
//! # Example
//!
//! ```ignore
//! use spark_carousel::{controls, dom, input::KeyboardEvent, scheduler};
//!
//! controls::install();
//! dom::focus(first_link_in_slide);
//! dom::press_key(KeyboardEvent::arrow_right());
//! scheduler::flush(); // focus moves on the next turn
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::dom::{self, DomEvent, EventType};
use crate::engine::{self, bus, Api, EventName, State, TransitionCause};
use crate::scheduler::{self, TaskHandle};
use crate::types::{Cleanup, ElementId, InstanceId};

use super::registry;

pub(crate) const NAMESPACE: &str = "cycle.keyboard";

// =============================================================================
// DECISION
// =============================================================================

/// Where focus is relative to the active slide's focusable items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// On the item at this index.
    Item(usize),
    /// Inside the show (container, slide, non-focusable content) but on no item.
    Inside,
    /// On a control outside the show.
    Outside,
}

/// What a key press does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Focus the active slide's item at this index.
    Focus(usize),
    /// Advance, then focus the new slide's first item.
    NextThenFirst,
    /// Retreat, then focus the new slide's last item.
    PrevThenLast,
    Next,
    Prev,
}

/// Decide what an arrow key does. `n` is the number of focusable items in
/// the active slide.
pub fn decide(forward: bool, position: Position, n: usize, slide_count: usize) -> Action {
    if n <= 1 {
        return if forward { Action::Next } else { Action::Prev };
    }

    match (forward, position) {
        (true, Position::Outside) => Action::Next,
        (true, Position::Inside) => Action::Focus(0),
        (true, Position::Item(pos)) if pos + 1 < n => Action::Focus(pos + 1),
        (true, Position::Item(_)) if slide_count > 1 => Action::NextThenFirst,
        (true, Position::Item(_)) => Action::Focus(0),

        (false, Position::Outside) => Action::Prev,
        (false, Position::Inside) => Action::Focus(n - 1),
        (false, Position::Item(pos)) if pos > 0 => Action::Focus(pos - 1),
        (false, Position::Item(_)) if slide_count > 1 => Action::PrevThenLast,
        (false, Position::Item(_)) => Action::Focus(n - 1),
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Continuation waiting to move focus for one instance.
enum Pending {
    /// Waiting for the engine's `AfterTransition`.
    Transition(Cleanup),
    /// Focus queued for the next turn.
    Focus(TaskHandle),
}

impl Pending {
    fn cancel(self) {
        match self {
            Pending::Transition(unsubscribe) => unsubscribe(),
            Pending::Focus(handle) => handle.cancel(),
        }
    }
}

thread_local! {
    static INSTALLED: Cell<bool> = const { Cell::new(false) };
    static PENDING: RefCell<HashMap<InstanceId, Pending>> = RefCell::new(HashMap::new());
}

/// Store `pending` for `id`, cancelling whatever it replaces.
fn set_pending(id: InstanceId, pending: Pending) {
    let previous = PENDING.with(|map| map.borrow_mut().insert(id, pending));
    if let Some(previous) = previous {
        previous.cancel();
    }
}

/// Forget the entry without cancelling it (it has fired).
fn take_pending(id: InstanceId) {
    PENDING.with(|map| map.borrow_mut().remove(&id));
}

/// Cancel the pending continuation of `id`, if any.
pub fn cancel_pending(id: InstanceId) {
    let previous = PENDING.with(|map| map.borrow_mut().remove(&id));
    if let Some(previous) = previous {
        log::trace!("{} keyboard continuation cancelled", id);
        previous.cancel();
    }
}

pub fn has_pending(id: InstanceId) -> bool {
    PENDING.with(|map| map.borrow().contains_key(&id))
}

// =============================================================================
// INSTALL
// =============================================================================

/// Register the document keydown listener. Runs once per thread.
pub fn install() {
    if INSTALLED.with(|installed| installed.replace(true)) {
        return;
    }
    dom::on_document(EventType::KeyDown, NAMESPACE, handle_key);
    log::debug!("keyboard navigation installed");
}

/// Remove the listener and drop pending continuations (for testing).
pub fn reset_keyboard() {
    let pending: Vec<Pending> = PENDING.with(|map| map.borrow_mut().drain().map(|(_, p)| p).collect());
    for entry in pending {
        entry.cancel();
    }
    dom::off_document(NAMESPACE);
    INSTALLED.with(|installed| installed.set(false));
}

// =============================================================================
// HANDLER
// =============================================================================

fn handle_key(event: &mut DomEvent) {
    if event.default_prevented() {
        return;
    }
    let Some(key) = event.key.as_ref() else {
        return;
    };
    if !key.is_press() || key.modifiers.any() {
        return;
    }
    let forward = if key.is_arrow_right() {
        true
    } else if key.is_arrow_left() {
        false
    } else {
        return;
    };

    let focused = event.target;
    let Some(api) = resolve(focused) else {
        log::trace!("arrow key on {} matched no slideshow", focused);
        return;
    };
    let Some(state) = api.state() else {
        return;
    };
    if dom::closest(state.container, |el| dom::has_attribute(el, "hidden")).is_some() {
        return;
    }

    let items = focusable_items(&state);
    let position = position_of(&state, &items, focused);
    let action = decide(forward, position, items.len(), state.slide_count);
    log::trace!(
        "{} {} at {:?} of {} -> {:?}",
        state.id,
        if forward { "right" } else { "left" },
        position,
        items.len(),
        action
    );

    event.prevent_default();
    match action {
        Action::Focus(index) => defer_focus(state.id, items[index]),
        Action::NextThenFirst => step_then_focus(api, true, Edge::First),
        Action::PrevThenLast => step_then_focus(api, false, Edge::Last),
        Action::Next => api.advance(true, TransitionCause::Keyboard),
        Action::Prev => api.advance(false, TransitionCause::Keyboard),
    }
}

/// Owning instance of the focused element.
pub fn resolve(focused: ElementId) -> Option<Api> {
    dom::closest(focused, |el| engine::instance_for_container(el).is_some())
        .and_then(engine::instance_for_container)
        .or_else(|| {
            dom::closest(focused, |el| engine::instance_for_slides_root(el).is_some())
                .and_then(engine::instance_for_slides_root)
        })
        .or_else(|| registry::owner_of(focused))
}

/// Tabbable descendants of the active slide, in document order.
pub fn focusable_items(state: &State) -> Vec<ElementId> {
    state
        .active_slide()
        .map(|slide| dom::descendants(slide).into_iter().filter(|&el| dom::is_tabbable(el)).collect())
        .unwrap_or_default()
}

fn position_of(state: &State, items: &[ElementId], focused: ElementId) -> Position {
    if let Some(index) = items.iter().position(|&el| el == focused) {
        return Position::Item(index);
    }
    if dom::contains(state.container, focused) || dom::contains(state.slides_root(), focused) {
        Position::Inside
    } else {
        Position::Outside
    }
}

// =============================================================================
// FOCUS CONTINUATIONS
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Edge {
    First,
    Last,
}

fn defer_focus(id: InstanceId, target: ElementId) {
    let handle = scheduler::defer(move || {
        take_pending(id);
        dom::focus(target);
    });
    set_pending(id, Pending::Focus(handle));
}

/// Step the show; once the transition ends, focus the new slide's edge item.
fn step_then_focus(api: Api, forward: bool, edge: Edge) {
    let id = api.id();
    let before = api.state().map(|state| state.transitions);

    let unsubscribe = bus::once(id, EventName::AfterTransition, move |event| {
        take_pending(id);
        let api = event.api;
        let handle = scheduler::defer(move || {
            take_pending(id);
            let Some(state) = api.state() else {
                return;
            };
            let items = focusable_items(&state);
            let target = match edge {
                Edge::First => items.first(),
                Edge::Last => items.last(),
            };
            dom::focus(target.copied().unwrap_or(state.container));
        });
        set_pending(id, Pending::Focus(handle));
    });
    set_pending(id, Pending::Transition(Box::new(unsubscribe)));

    api.advance(forward, TransitionCause::Keyboard);

    let after = api.state().map(|state| state.transitions);
    if after == before {
        cancel_pending(id);
    }
}

// =============================================================================
// TESTS
// =============================================================================
