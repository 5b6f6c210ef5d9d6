//! Lifecycle Bus - synchronous pub/sub for instance state transitions.
//!
//! Every event carries the instance's `Api` handle and a `State` snapshot
//! taken at the moment of the transition, so subscribers always observe the
//! state *after* the command that produced the event.
//!
//! Three subscription scopes:
//! - `on(fn)` - every event of every instance (binders install here)
//! - `on_instance(id, fn)` - one instance, until unsubscribed or destroyed
//! - `once(id, name, fn)` - first matching event of one instance, then gone
//!
//! Handlers are snapshotted before being called, so a handler may issue
//! commands that emit further events, or (un)subscribe, without deadlock.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::{ElementId, InstanceId};

use super::instance::{Api, State};

// =============================================================================
// TYPES
// =============================================================================

/// Event names, for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    Initialized,
    Destroyed,
    SlideAdded,
    SlideRemoved,
    UpdateView,
    Paused,
    Resumed,
    AfterTransition,
    PagerActivated,
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Initialized,
    Destroyed,
    SlideAdded { index: usize, slide: ElementId },
    SlideRemoved { index: usize, slide: ElementId },
    UpdateView,
    Paused,
    Resumed,
    AfterTransition { from: usize, to: usize },
    PagerActivated { pager: ElementId, target: ElementId },
}

impl Lifecycle {
    pub fn name(&self) -> EventName {
        match self {
            Lifecycle::Initialized => EventName::Initialized,
            Lifecycle::Destroyed => EventName::Destroyed,
            Lifecycle::SlideAdded { .. } => EventName::SlideAdded,
            Lifecycle::SlideRemoved { .. } => EventName::SlideRemoved,
            Lifecycle::UpdateView => EventName::UpdateView,
            Lifecycle::Paused => EventName::Paused,
            Lifecycle::Resumed => EventName::Resumed,
            Lifecycle::AfterTransition { .. } => EventName::AfterTransition,
            Lifecycle::PagerActivated { .. } => EventName::PagerActivated,
        }
    }
}

/// Immutable notification delivered to subscribers.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub lifecycle: Lifecycle,
    pub api: Api,
    pub state: State,
}

impl LifecycleEvent {
    pub fn name(&self) -> EventName {
        self.lifecycle.name()
    }

    pub fn instance(&self) -> InstanceId {
        self.api.id()
    }
}

type Handler = Rc<dyn Fn(&LifecycleEvent)>;
type OnceHandler = Box<dyn FnOnce(&LifecycleEvent)>;

struct OnceEntry {
    id: usize,
    instance: InstanceId,
    name: EventName,
    handler: OnceHandler,
}

#[derive(Default)]
struct BusRegistry {
    global: Vec<(usize, Handler)>,
    scoped: HashMap<InstanceId, Vec<(usize, Handler)>>,
    once: Vec<OnceEntry>,
    next_id: usize,
}

impl BusRegistry {
    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

thread_local! {
    static BUS: RefCell<BusRegistry> = RefCell::new(BusRegistry::default());
}

// =============================================================================
// SUBSCRIBE
// =============================================================================

/// Subscribe to every lifecycle event. Returns cleanup function.
pub fn on<F>(handler: F) -> impl FnOnce()
where
    F: Fn(&LifecycleEvent) + 'static,
{
    let id = BUS.with(|bus| {
        let mut bus = bus.borrow_mut();
        let id = bus.next_id();
        bus.global.push((id, Rc::new(handler)));
        id
    });

    move || {
        BUS.with(|bus| {
            bus.borrow_mut().global.retain(|(handler_id, _)| *handler_id != id);
        });
    }
}

/// Subscribe to the events of one instance. Returns cleanup function.
pub fn on_instance<F>(instance: InstanceId, handler: F) -> impl FnOnce()
where
    F: Fn(&LifecycleEvent) + 'static,
{
    let id = BUS.with(|bus| {
        let mut bus = bus.borrow_mut();
        let id = bus.next_id();
        bus.scoped.entry(instance).or_default().push((id, Rc::new(handler)));
        id
    });

    move || {
        BUS.with(|bus| {
            let mut bus = bus.borrow_mut();
            if let Some(handlers) = bus.scoped.get_mut(&instance) {
                handlers.retain(|(handler_id, _)| *handler_id != id);
                if handlers.is_empty() {
                    bus.scoped.remove(&instance);
                }
            }
        });
    }
}

/// Run `handler` on the next `name` event of `instance`, then forget it.
/// The returned cleanup cancels it if it has not fired yet.
pub fn once<F>(instance: InstanceId, name: EventName, handler: F) -> impl FnOnce()
where
    F: FnOnce(&LifecycleEvent) + 'static,
{
    let id = BUS.with(|bus| {
        let mut bus = bus.borrow_mut();
        let id = bus.next_id();
        bus.once.push(OnceEntry {
            id,
            instance,
            name,
            handler: Box::new(handler),
        });
        id
    });

    move || {
        BUS.with(|bus| {
            bus.borrow_mut().once.retain(|entry| entry.id != id);
        });
    }
}

// =============================================================================
// EMIT
// =============================================================================

/// Deliver an event synchronously: global, then instance-scoped, then one-shot.
pub fn emit(event: LifecycleEvent) {
    let instance = event.instance();
    let name = event.name();

    let (global, scoped, once) = BUS.with(|bus| {
        let mut bus = bus.borrow_mut();
        let global: Vec<Handler> = bus.global.iter().map(|(_, h)| h.clone()).collect();
        let scoped: Vec<Handler> = bus
            .scoped
            .get(&instance)
            .map(|handlers| handlers.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();
        let (fired, kept): (Vec<OnceEntry>, Vec<OnceEntry>) = std::mem::take(&mut bus.once)
            .into_iter()
            .partition(|entry| entry.instance == instance && entry.name == name);
        bus.once = kept;
        (global, scoped, fired)
    });

    log::trace!("{} {:?}", instance, event.lifecycle);

    for handler in global {
        handler(&event);
    }
    for handler in scoped {
        handler(&event);
    }
    for entry in once {
        (entry.handler)(&event);
    }
}

/// Drop every scoped and one-shot subscription of a destroyed instance.
pub(crate) fn drop_instance(instance: InstanceId) {
    BUS.with(|bus| {
        let mut bus = bus.borrow_mut();
        bus.scoped.remove(&instance);
        bus.once.retain(|entry| entry.instance != instance);
    });
}

/// Scoped plus pending one-shot subscriptions for an instance.
pub fn subscriber_count(instance: InstanceId) -> usize {
    BUS.with(|bus| {
        let bus = bus.borrow();
        bus.scoped.get(&instance).map_or(0, Vec::len)
            + bus.once.iter().filter(|entry| entry.instance == instance).count()
    })
}

/// Number of global subscriptions.
pub fn global_subscriber_count() -> usize {
    BUS.with(|bus| bus.borrow().global.len())
}

/// Clear all subscriptions (for testing).
pub fn reset_bus() {
    BUS.with(|bus| *bus.borrow_mut() = BusRegistry::default());
}

// =============================================================================
// TESTS
// =============================================================================
