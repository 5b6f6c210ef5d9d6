//! Instances - slideshow registry, state snapshots, and the command handle.
//!
//! Each running slideshow is an `InstanceId` key into a thread-local map.
//! Hosts and controls never hold the instance itself, only an [`Api`] handle,
//! which is `Copy` and turns every command into a no-op once the instance is
//! destroyed.
//!
//! Transitions are immediate as far as state goes: a command updates
//! `curr_slide` and emits `UpdateView` before returning. The visual effect is
//! not modelled; the transition "completes" on the next scheduler turn, which
//! is when `AfterTransition` is delivered.
//!
//! # Example
//!
//! ```ignore
//! use spark_carousel::{dom, engine};
//!
//! let show = dom::ElementBuilder::new("div")
//!     .child(dom::ElementBuilder::new("img"))
//!     .child(dom::ElementBuilder::new("img"))
//!     .append_to(dom::body());
//!
//! let api = engine::init(show, engine::Options::default())?;
//! api.next();
//! assert_eq!(api.state().unwrap().curr_slide, 1);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::dom::{self, EventType};
use crate::error::{Error, Result};
use crate::scheduler::{self, TaskHandle};
use crate::types::{ElementId, InstanceId, Role};

use super::bus::{self, Lifecycle, LifecycleEvent};
use super::options::{fill_slide_num, Options, PagerTemplate};

/// Listener namespace for engine-owned DOM listeners.
const NAMESPACE: &str = "cycle.engine";

/// Class put on the container while paused.
const PAUSED_CLASS: &str = "cycle-paused";

// =============================================================================
// TYPES
// =============================================================================

/// What started a transition. Lets effect selection differ per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
    Command,
    Pager,
    Swipe,
    Keyboard,
}

/// The most recent transition an instance prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
    pub forward: bool,
    pub manual: bool,
    pub cause: TransitionCause,
    /// Effect name picked for this cause (`pagerFx`, `swipeFx`, else `fx`).
    pub fx: String,
}

/// Snapshot of an instance, as delivered with every lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub id: InstanceId,
    pub container: ElementId,
    pub slides: Vec<ElementId>,
    pub curr_slide: usize,
    pub next_slide: usize,
    pub slide_count: usize,
    pub paused: bool,
    pub hover_paused: bool,
    pub busy: bool,
    /// Number of transitions prepared so far.
    pub transitions: u64,
    pub last_transition: Option<Transition>,
    pub options: Options,
}

impl State {
    /// Paused by command or by hover.
    pub fn is_paused(&self) -> bool {
        self.paused || self.hover_paused
    }

    pub fn active_slide(&self) -> Option<ElementId> {
        self.slides.get(self.curr_slide).copied()
    }

    /// Parent element of the slides, or the container for an empty show.
    pub fn slides_root(&self) -> ElementId {
        self.slides
            .first()
            .and_then(|&slide| dom::parent(slide))
            .unwrap_or(self.container)
    }
}

struct Instance {
    state: State,
    /// Deferred completion of the in-flight transition.
    completion: Option<TaskHandle>,
}

thread_local! {
    static INSTANCES: RefCell<HashMap<InstanceId, Instance>> = RefCell::new(HashMap::new());
    static CONTAINERS: RefCell<HashMap<ElementId, InstanceId>> = RefCell::new(HashMap::new());
    static NEXT_ID: Cell<usize> = const { Cell::new(0) };
}

fn with_instance<R>(id: InstanceId, f: impl FnOnce(&mut Instance) -> R) -> Option<R> {
    INSTANCES.with(|map| map.borrow_mut().get_mut(&id).map(f))
}

fn snapshot(id: InstanceId) -> Option<State> {
    INSTANCES.with(|map| map.borrow().get(&id).map(|instance| instance.state.clone()))
}

/// Emit with a fresh snapshot. Silently dropped for dead instances.
fn emit(id: InstanceId, lifecycle: Lifecycle) {
    if let Some(state) = snapshot(id) {
        bus::emit(LifecycleEvent {
            lifecycle,
            api: Api { id },
            state,
        });
    }
}

fn paint_slides(state: &State) {
    let class = &state.options.slide_active_class;
    for (index, &slide) in state.slides.iter().enumerate() {
        dom::toggle_class(slide, class, index == state.curr_slide);
    }
}

// =============================================================================
// INIT
// =============================================================================

/// Start a slideshow on `container`.
///
/// `data-cycle-*` attributes on the container override `options`. Fails if the
/// container is unknown, already hosts a slideshow, or the options are invalid.
pub fn init(container: ElementId, mut options: Options) -> Result<Api> {
    if !dom::exists(container) {
        return Err(Error::UnknownElement(container));
    }
    if instance_for_container(container).is_some() {
        return Err(Error::AlreadyInitialized(container));
    }

    options.apply_data_attributes(container)?;
    options.validate()?;

    let id = NEXT_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        InstanceId(id)
    });
    let api = Api { id };

    let slides = options.slides.resolve_within(container);
    let starting_slide = options.starting_slide;
    let paused = options.paused;
    let pause_on_hover = options.pause_on_hover;

    INSTANCES.with(|map| {
        map.borrow_mut().insert(
            id,
            Instance {
                state: State {
                    id,
                    container,
                    slides: Vec::new(),
                    curr_slide: 0,
                    next_slide: 0,
                    slide_count: 0,
                    paused,
                    hover_paused: false,
                    busy: false,
                    transitions: 0,
                    last_transition: None,
                    options,
                },
                completion: None,
            },
        );
    });
    CONTAINERS.with(|map| map.borrow_mut().insert(container, id));
    log::debug!("{} init on {} with {} slides", id, container, slides.len());

    if paused {
        dom::add_class(container, PAUSED_CLASS);
    }

    for slide in slides {
        api.push_slide(slide);
    }

    with_instance(id, |instance| {
        let state = &mut instance.state;
        state.curr_slide = starting_slide.min(state.slide_count.saturating_sub(1));
        state.next_slide = state.curr_slide;
        paint_slides(state);
    });

    if pause_on_hover {
        dom::on(container, EventType::MouseEnter, NAMESPACE, move |_| api.set_hover_paused(true));
        dom::on(container, EventType::MouseLeave, NAMESPACE, move |_| api.set_hover_paused(false));
    }

    emit(id, Lifecycle::Initialized);
    emit(id, Lifecycle::UpdateView);
    Ok(api)
}

// =============================================================================
// LOOKUP
// =============================================================================

/// Instance hosted by exactly this container.
pub fn instance_for_container(container: ElementId) -> Option<Api> {
    CONTAINERS.with(|map| map.borrow().get(&container).map(|&id| Api { id }))
}

/// Handle for a live instance.
pub fn api_for(id: InstanceId) -> Option<Api> {
    let api = Api { id };
    api.is_alive().then_some(api)
}

/// Instance whose slides sit directly under `root`.
pub fn instance_for_slides_root(root: ElementId) -> Option<Api> {
    INSTANCES.with(|map| {
        map.borrow()
            .values()
            .find(|instance| !instance.state.slides.is_empty() && instance.state.slides_root() == root)
            .map(|instance| Api { id: instance.state.id })
    })
}

/// Every live instance, oldest first.
pub fn instances() -> Vec<Api> {
    let mut ids: Vec<InstanceId> = INSTANCES.with(|map| map.borrow().keys().copied().collect());
    ids.sort();
    ids.into_iter().map(|id| Api { id }).collect()
}

/// Forget every instance without emitting anything (for testing).
pub fn reset_instances() {
    INSTANCES.with(|map| map.borrow_mut().clear());
    CONTAINERS.with(|map| map.borrow_mut().clear());
    NEXT_ID.with(|next| next.set(0));
}

// =============================================================================
// API
// =============================================================================

/// Command handle for one instance.
///
/// Holds only the id; every method is a no-op on a destroyed instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Api {
    id: InstanceId,
}

impl Api {
    pub fn id(self) -> InstanceId {
        self.id
    }

    pub fn is_alive(self) -> bool {
        INSTANCES.with(|map| map.borrow().contains_key(&self.id))
    }

    /// Current state, or `None` once destroyed.
    pub fn state(self) -> Option<State> {
        snapshot(self.id)
    }

    pub fn container(self) -> Option<ElementId> {
        INSTANCES.with(|map| map.borrow().get(&self.id).map(|instance| instance.state.container))
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    pub fn next(self) {
        self.advance(true, TransitionCause::Command);
    }

    pub fn prev(self) {
        self.advance(false, TransitionCause::Command);
    }

    /// Move one slide forward or back, honoring `allowWrap`.
    pub fn advance(self, forward: bool, cause: TransitionCause) {
        let target = with_instance(self.id, |instance| {
            let state = &mut instance.state;
            let count = state.slide_count;
            if count == 0 {
                return None;
            }
            let curr = state.curr_slide;
            let target = if forward {
                if !state.options.allow_wrap && curr + 1 >= count {
                    return None;
                }
                (curr + 1) % count
            } else {
                if !state.options.allow_wrap && curr == 0 {
                    return None;
                }
                (curr + count - 1) % count
            };
            state.next_slide = target;
            Some(target)
        })
        .flatten();

        if target.is_some() {
            self.prepare_tx(true, forward, cause);
        } else {
            log::debug!("{} {} ignored at boundary", self.id, if forward { "next" } else { "prev" });
        }
    }

    /// Jump to the slide represented by `target`, a child of `pager`.
    ///
    /// No-op when `target` is the current slide's item.
    pub fn page(self, pager: ElementId, target: ElementId) {
        if dom::parent(target) != Some(pager) {
            return;
        }
        let Some(index) = dom::child_index(target) else {
            return;
        };

        let forward = with_instance(self.id, |instance| {
            let state = &mut instance.state;
            if index >= state.slide_count || index == state.curr_slide {
                return None;
            }
            state.next_slide = index;
            Some(index > state.curr_slide)
        })
        .flatten();

        if let Some(forward) = forward {
            self.prepare_tx(true, forward, TransitionCause::Pager);
            emit(self.id, Lifecycle::PagerActivated { pager, target });
        }
    }

    /// Start a transition from `curr_slide` to `next_slide`.
    ///
    /// Ignored while busy unless `manual` and `manualTrump` are both set, in
    /// which case the in-flight transition is cut short.
    pub fn prepare_tx(self, manual: bool, forward: bool, cause: TransitionCause) {
        let started = with_instance(self.id, |instance| {
            let state = &mut instance.state;
            if state.slide_count < 2 || state.next_slide == state.curr_slide {
                return None;
            }
            if state.busy && !(manual && state.options.manual_trump) {
                log::debug!("{} busy, transition dropped", state.id);
                state.next_slide = state.curr_slide;
                return None;
            }
            if let Some(handle) = instance.completion.take() {
                handle.cancel();
            }

            let from = state.curr_slide;
            let to = state.next_slide;
            let fx = match cause {
                TransitionCause::Pager => state.options.pager_fx.clone(),
                TransitionCause::Swipe => state.options.swipe_fx.clone(),
                _ => None,
            }
            .unwrap_or_else(|| state.options.fx.clone());

            state.curr_slide = to;
            state.busy = true;
            state.transitions += 1;
            state.last_transition = Some(Transition {
                from,
                to,
                forward,
                manual,
                cause,
                fx,
            });
            paint_slides(state);
            Some((from, to))
        })
        .flatten();

        let Some((from, to)) = started else {
            return;
        };
        log::debug!("{} transition {} -> {}", self.id, from, to);
        emit(self.id, Lifecycle::UpdateView);

        let id = self.id;
        let handle = scheduler::defer(move || {
            let finished = with_instance(id, |instance| {
                instance.state.busy = false;
                instance.completion = None;
            });
            if finished.is_some() {
                emit(id, Lifecycle::AfterTransition { from, to });
            }
        });
        // A handler of UpdateView may already have started another transition.
        with_instance(self.id, |instance| {
            if instance.state.curr_slide == to && instance.completion.is_none() {
                instance.completion = Some(handle.clone());
            } else {
                handle.cancel();
            }
        });
    }

    // -------------------------------------------------------------------------
    // Pause
    // -------------------------------------------------------------------------

    pub fn pause(self) {
        self.set_paused(false, true);
    }

    /// Resume from a command pause and from a hover pause.
    pub fn resume(self) {
        let was_paused = with_instance(self.id, |instance| {
            let state = &mut instance.state;
            let was = state.is_paused();
            state.paused = false;
            state.hover_paused = false;
            was
        });
        if was_paused == Some(true) {
            self.announce_pause(false);
        }
    }

    pub(crate) fn set_hover_paused(self, paused: bool) {
        self.set_paused(true, paused);
    }

    fn set_paused(self, hover: bool, paused: bool) {
        let changed = with_instance(self.id, |instance| {
            let state = &mut instance.state;
            let before = state.is_paused();
            if hover {
                state.hover_paused = paused;
            } else {
                state.paused = paused;
            }
            before != state.is_paused()
        });
        if changed == Some(true) {
            self.announce_pause(paused);
        }
    }

    fn announce_pause(self, paused: bool) {
        if let Some(container) = self.container() {
            dom::toggle_class(container, PAUSED_CLASS, paused);
        }
        log::debug!("{} {}", self.id, if paused { "paused" } else { "resumed" });
        emit(self.id, if paused { Lifecycle::Paused } else { Lifecycle::Resumed });
    }

    // -------------------------------------------------------------------------
    // Slides
    // -------------------------------------------------------------------------

    /// Append a slide, moving it under the slides root if needed.
    pub fn add_slide(self, slide: ElementId) {
        if !dom::exists(slide) {
            return;
        }
        let Some(root) = self.state().map(|state| state.slides_root()) else {
            return;
        };
        if dom::parent(slide) != Some(root) {
            dom::append_child(root, slide);
        }
        if self.push_slide(slide) {
            emit(self.id, Lifecycle::UpdateView);
        }
    }

    fn push_slide(self, slide: ElementId) -> bool {
        let index = with_instance(self.id, |instance| {
            let state = &mut instance.state;
            if state.slides.contains(&slide) {
                return None;
            }
            dom::add_class(slide, &state.options.slide_class);
            state.slides.push(slide);
            state.slide_count = state.slides.len();
            Some(state.slides.len() - 1)
        })
        .flatten();

        match index {
            Some(index) => {
                emit(self.id, Lifecycle::SlideAdded { index, slide });
                true
            }
            None => false,
        }
    }

    /// Remove the slide at `index` from the show and the document.
    pub fn remove_slide(self, index: usize) {
        let removed = with_instance(self.id, |instance| {
            let state = &mut instance.state;
            if index >= state.slide_count {
                return None;
            }
            let slide = state.slides.remove(index);
            state.slide_count = state.slides.len();
            if index < state.curr_slide {
                state.curr_slide -= 1;
            } else if state.curr_slide >= state.slide_count {
                state.curr_slide = 0;
            }
            state.next_slide = state.curr_slide;
            Some(slide)
        })
        .flatten();

        let Some(slide) = removed else {
            return;
        };
        dom::remove(slide);
        if let Some(state) = self.state() {
            paint_slides(&state);
        }
        emit(self.id, Lifecycle::SlideRemoved { index, slide });
        emit(self.id, Lifecycle::UpdateView);
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    /// Elements currently configured for `role`.
    pub fn get_component(self, role: Role) -> Vec<ElementId> {
        INSTANCES.with(|map| {
            map.borrow().get(&self.id).and_then(|instance| {
                instance
                    .state
                    .options
                    .source(role)
                    .map(|source| (source.clone(), instance.state.container))
            })
        })
        .map(|(source, container)| source.resolve(container))
        .unwrap_or_default()
    }

    /// Build a detached pager item for `slide_index` from `template`.
    pub fn tmpl(self, template: &PagerTemplate, slide_index: usize) -> ElementId {
        let mut builder = dom::ElementBuilder::new(&template.tag).text(&fill_slide_num(&template.text, slide_index));
        if let Some(class) = &template.class {
            builder = builder.class(class);
        }
        builder.build()
    }

    // -------------------------------------------------------------------------
    // Destroy
    // -------------------------------------------------------------------------

    /// Tear the instance down. Subscribers see `Destroyed` while the state is
    /// still readable; afterwards every handle to this instance is inert.
    pub fn destroy(self) {
        if !self.is_alive() {
            return;
        }
        emit(self.id, Lifecycle::Destroyed);

        let Some(instance) = INSTANCES.with(|map| map.borrow_mut().remove(&self.id)) else {
            return;
        };
        if let Some(handle) = instance.completion {
            handle.cancel();
        }
        let state = instance.state;
        CONTAINERS.with(|map| map.borrow_mut().remove(&state.container));

        for &slide in &state.slides {
            dom::remove_class(slide, &state.options.slide_class);
            dom::remove_class(slide, &state.options.slide_active_class);
        }
        dom::remove_class(state.container, PAUSED_CLASS);
        dom::off(state.container, None, NAMESPACE);
        bus::drop_instance(self.id);
        log::debug!("{} destroyed", self.id);
    }
}

// =============================================================================
// TESTS
// =============================================================================
