//! Pause/Resume Binder - one toggle role, mirrored on every pause event.
//!
//! Controls come from `pauseControl`, or from `pause` when that resolves
//! nothing. A control with an author label keeps it in both states.

use crate::engine::{bus, Api, Lifecycle, LifecycleEvent, State};
use crate::dom;
use crate::types::Role;

use super::{a11y, registry};

pub(crate) const NAMESPACE: &str = "cycle.pause";

pub(crate) fn initialized(event: &LifecycleEvent) {
    let api = event.api;
    let state = &event.state;
    let controls = registry::resolve(api, Role::PauseControl);
    if controls.is_empty() {
        return;
    }

    for el in controls {
        a11y::enhance(el, state.id, Role::PauseControl, Some(label_for(state)));
        a11y::bind_activation(el, NAMESPACE, state.options.pause_control_event, move |event| {
            event.prevent_default();
            toggle(api);
        });

        let owner = state.id;
        let active = state.options.pause_active_class.clone();
        let playing = state.options.pause_playing_class.clone();
        registry::bind(owner, move || {
            if !registry::is_owned_by(el, owner) {
                return;
            }
            dom::remove_class(el, &active);
            dom::remove_class(el, &playing);
            a11y::strip(el, owner, NAMESPACE);
        });
    }
    render(state);

    let unsubscribe = bus::on_instance(state.id, |event| {
        if matches!(event.lifecycle, Lifecycle::Paused | Lifecycle::Resumed) {
            render(&event.state);
        }
    });
    registry::bind(state.id, unsubscribe);
}

/// Resume if paused by command or hover, else pause.
fn toggle(api: Api) {
    match api.state() {
        Some(state) if state.is_paused() => api.resume(),
        Some(_) => api.pause(),
        None => {}
    }
}

fn label_for(state: &State) -> &str {
    if state.is_paused() {
        &state.options.resume_aria_label
    } else {
        &state.options.pause_aria_label
    }
}

fn render(state: &State) {
    let paused = state.is_paused();
    let options = &state.options;
    for el in registry::controls_of(state.id, Role::PauseControl) {
        a11y::set_pressed(el, paused);
        a11y::set_label(el, label_for(state));
        if !options.pause_active_class.is_empty() {
            dom::toggle_class(el, &options.pause_active_class, paused);
        }
        if !options.pause_playing_class.is_empty() {
            dom::toggle_class(el, &options.pause_playing_class, !paused);
        }
    }
}
