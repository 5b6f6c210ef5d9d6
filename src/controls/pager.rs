//! Pager Binder - one control per slide, in every pager container.
//!
//! Items come from the pager template (and are removed again on teardown) or,
//! with no template, are the container's existing children, which are only
//! enhanced and later stripped back to author markup.
//!
//! Lifecycle:
//! - `SlideAdded`   build or adopt the item at the slide's index
//! - `Initialized`  adopt pager containers and enhance every item
//! - `SlideRemoved` drop the item at that index, re-index the rest
//! - `UpdateView`   exactly one active item per pager (class + `aria-pressed`)
//!
//! Arrow keys on an item rove to the sibling item and page to it.

use crate::dom::{self, DomEvent, EventType};
use crate::engine::{fill_slide_num, Api, LifecycleEvent, Options, State};
use crate::scheduler;
use crate::types::{ControlFlags, ElementId, InstanceId, Role};

use super::{a11y, registry};

pub(crate) const NAMESPACE: &str = "cycle.pager";

// =============================================================================
// LIFECYCLE HANDLERS
// =============================================================================

pub(crate) fn slide_added(event: &LifecycleEvent, index: usize) {
    for pager in adopt_pagers(event.api, &event.state) {
        let item = match &event.state.options.pager_template {
            Some(template) => {
                let item = event.api.tmpl(template, index);
                dom::insert_child(pager, index, item);
                registry::tag_owner(item, event.state.id, Role::Pager);
                registry::insert_flags(item, ControlFlags::GENERATED);
                item
            }
            None => match dom::children(pager).get(index) {
                Some(&item) => item,
                None => continue,
            },
        };
        enhance_item(event.api, &event.state, pager, item, index);
        reindex(pager, &event.state.options);
    }
}

pub(crate) fn initialized(event: &LifecycleEvent) {
    for pager in adopt_pagers(event.api, &event.state) {
        for (index, item) in dom::children(pager).into_iter().enumerate() {
            if index >= event.state.slide_count {
                break;
            }
            enhance_item(event.api, &event.state, pager, item, index);
        }
    }
}

pub(crate) fn slide_removed(event: &LifecycleEvent, index: usize) {
    for pager in pagers_of(&event.state) {
        if let Some(&item) = dom::children(pager).get(index) {
            a11y::strip(item, event.state.id, NAMESPACE);
            dom::remove(item);
        }
        reindex(pager, &event.state.options);
    }
}

pub(crate) fn update_view(event: &LifecycleEvent) {
    let state = &event.state;
    let class = &state.options.pager_active_class;
    for pager in pagers_of(state) {
        for (index, item) in dom::children(pager).into_iter().enumerate() {
            let active = index == state.curr_slide;
            dom::toggle_class(item, class, active);
            if registry::record(item).is_some() {
                a11y::set_pressed(item, active);
            }
        }
    }
}

// =============================================================================
// CONTAINERS
// =============================================================================

/// Resolve the instance's pagers, claiming any not yet claimed.
fn adopt_pagers(api: Api, state: &State) -> Vec<ElementId> {
    let pagers = registry::resolve(api, Role::Pager);
    for &pager in &pagers {
        let claimed = registry::is_owned_by(pager, state.id)
            && registry::flags(pager).contains(ControlFlags::PAGER_CONTAINER);
        if claimed {
            continue;
        }
        registry::tag_owner(pager, state.id, Role::Pager);
        registry::insert_flags(pager, ControlFlags::PAGER_CONTAINER);
        let owner = state.id;
        let active_class = state.options.pager_active_class.clone();
        registry::bind(owner, move || teardown(pager, owner, &active_class));
        log::debug!("{} pager {} adopted", state.id, pager);
    }
    pagers
}

/// Pager containers already claimed by the instance.
fn pagers_of(state: &State) -> Vec<ElementId> {
    registry::controls_of(state.id, Role::Pager)
        .into_iter()
        .filter(|&el| registry::flags(el).contains(ControlFlags::PAGER_CONTAINER))
        .collect()
}

fn teardown(pager: ElementId, owner: InstanceId, active_class: &str) {
    for item in dom::children(pager) {
        let Some(record) = registry::record(item).filter(|record| record.owner == owner) else {
            continue;
        };
        dom::remove_class(item, active_class);
        a11y::strip(item, owner, NAMESPACE);
        if record.flags.contains(ControlFlags::GENERATED) {
            dom::remove(item);
        }
    }
    if registry::is_owned_by(pager, owner) {
        registry::clear_owner(pager);
    }
}

// =============================================================================
// ITEMS
// =============================================================================

fn enhance_item(api: Api, state: &State, pager: ElementId, item: ElementId, index: usize) {
    let label = fill_slide_num(&state.options.pager_aria_label, index);
    a11y::enhance(item, state.id, Role::Pager, Some(&label));
    registry::set_pager_index(item, index);
    a11y::set_pressed(item, index == state.curr_slide);

    let bubble = state.options.pager_event_bubble;
    let primary = state.options.activation_event(Role::Pager);
    a11y::bind_activation(item, NAMESPACE, primary, move |event| {
        if !bubble {
            event.prevent_default();
        }
        api.page(pager, item);
    });
    dom::on(item, EventType::KeyDown, NAMESPACE, move |event| rove(api, pager, item, event));
}

/// Keep indexes and owned labels in step with DOM order.
fn reindex(pager: ElementId, options: &Options) {
    for (index, item) in dom::children(pager).into_iter().enumerate() {
        if registry::record(item).is_none() {
            continue;
        }
        registry::set_pager_index(item, index);
        a11y::set_label(item, &fill_slide_num(&options.pager_aria_label, index));
    }
}

/// ArrowLeft/ArrowRight: page to the sibling item and focus it.
fn rove(api: Api, pager: ElementId, item: ElementId, event: &mut DomEvent) {
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
    event.prevent_default();

    let Some(state) = api.state() else {
        return;
    };
    let items = dom::children(pager);
    let Some(pos) = items.iter().position(|&el| el == item) else {
        return;
    };
    let Some(target) = sibling(pos, items.len(), forward, state.options.allow_wrap) else {
        return;
    };

    let target = items[target];
    api.page(pager, target);
    scheduler::defer(move || {
        dom::focus(target);
    });
}

fn sibling(pos: usize, len: usize, forward: bool, wrap: bool) -> Option<usize> {
    if forward {
        match pos + 1 {
            next if next < len => Some(next),
            _ if wrap => Some(0),
            _ => None,
        }
    } else {
        match pos.checked_sub(1) {
            Some(prev) => Some(prev),
            None if wrap && len > 0 => Some(len - 1),
            None => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
