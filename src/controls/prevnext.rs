//! Prev/Next Binder - step controls, boundary disabling, swipe gestures.

use crate::dom::{self, EventType};
use crate::engine::{Api, LifecycleEvent, State, TransitionCause};
use crate::types::{ElementId, Role};

use super::{a11y, registry};

pub(crate) const NAMESPACE: &str = "cycle.prevnext";
const SWIPE_NAMESPACE: &str = "cycle.swipe";

pub(crate) fn initialized(event: &LifecycleEvent) {
    let api = event.api;
    let options = &event.state.options;

    bind_role(api, &event.state, Role::Next, &options.next_aria_label, true);
    bind_role(api, &event.state, Role::Prev, &options.prev_aria_label, false);

    if options.swipe {
        bind_swipe(api, &event.state);
    }
}

/// With wrap disabled, disable whichever control sits at its boundary.
pub(crate) fn update_view(event: &LifecycleEvent) {
    let state = &event.state;
    let options = &state.options;
    if options.allow_wrap {
        return;
    }

    let prev_boundary = options.prev_boundary.unwrap_or(0);
    let next_boundary = options
        .next_boundary
        .unwrap_or(state.slide_count.saturating_sub(1));

    for el in registry::controls_of(state.id, Role::Next) {
        set_disabled(el, &options.disabled_class, state.curr_slide == next_boundary);
    }
    for el in registry::controls_of(state.id, Role::Prev) {
        set_disabled(el, &options.disabled_class, state.curr_slide == prev_boundary);
    }
}

fn bind_role(api: Api, state: &State, role: Role, label: &str, forward: bool) {
    for el in registry::resolve(api, role) {
        a11y::enhance(el, state.id, role, Some(label));
        let primary = state.options.activation_event(role);
        a11y::bind_activation(el, NAMESPACE, primary, move |event| {
            event.prevent_default();
            if !dom::is_disabled(el) {
                api.advance(forward, TransitionCause::Command);
            }
        });

        let owner = state.id;
        let disabled_class = state.options.disabled_class.clone();
        registry::bind(owner, move || {
            if !registry::is_owned_by(el, owner) {
                return;
            }
            if dom::has_class(el, &disabled_class) {
                set_disabled(el, &disabled_class, false);
            }
            a11y::strip(el, owner, NAMESPACE);
        });
    }
}

fn bind_swipe(api: Api, state: &State) {
    let container = state.container;
    let (forward, back) = if state.options.swipe_vert {
        (EventType::SwipeUp, EventType::SwipeDown)
    } else {
        (EventType::SwipeLeft, EventType::SwipeRight)
    };

    dom::off(container, None, SWIPE_NAMESPACE);
    dom::on(container, forward, SWIPE_NAMESPACE, move |_| {
        api.advance(true, TransitionCause::Swipe);
    });
    dom::on(container, back, SWIPE_NAMESPACE, move |_| {
        api.advance(false, TransitionCause::Swipe);
    });
    registry::bind(state.id, move || dom::off(container, None, SWIPE_NAMESPACE));
}

fn set_disabled(el: ElementId, class: &str, disabled: bool) {
    dom::toggle_class(el, class, disabled);
    dom::set_disabled(el, disabled);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::testing::setup;
    use crate::dom::{body, click, key_down, listener_count, swipe, ElementBuilder};
    use crate::engine::{init, Options};
    use crate::input::KeyboardEvent;
    use crate::types::ControlFlags;

    fn show(slides: usize) -> (ElementId, ElementId, ElementId) {
        let container = ElementBuilder::new("div")
            .children((0..slides).map(|_| ElementBuilder::new("img")))
            .child(ElementBuilder::new("button").class("cycle-prev"))
            .child(ElementBuilder::new("div").class("cycle-next"))
            .append_to(body());
        let children = dom::children(container);
        (container, children[slides], children[slides + 1])
    }

    fn no_wrap() -> Options {
        Options {
            allow_wrap: false,
            ..Options::default()
        }
    }

    #[test]
    fn test_enhances_controls() {
        setup();
        let (container, prev, next) = show(3);
        init(container, Options::default()).unwrap();

        assert_eq!(dom::get_attribute(next, "aria-label").as_deref(), Some("Next slide"));
        assert_eq!(dom::get_attribute(next, "tabindex").as_deref(), Some("0"));
        assert_eq!(dom::get_attribute(prev, "aria-label").as_deref(), Some("Previous slide"));
        assert!(!dom::has_attribute(prev, "tabindex"));
        assert!(registry::flags(prev).contains(ControlFlags::INTERACTIVE));
    }

    #[test]
    fn test_click_and_keys_step() {
        setup();
        let (container, prev, next) = show(3);
        let api = init(container, Options::default()).unwrap();

        click(next);
        assert_eq!(api.state().unwrap().curr_slide, 1);
        key_down(next, KeyboardEvent::enter());
        assert_eq!(api.state().unwrap().curr_slide, 2);
        key_down(prev, KeyboardEvent::space());
        assert_eq!(api.state().unwrap().curr_slide, 1);
        // Native button: Enter goes through the synthesized click, once.
        key_down(prev, KeyboardEvent::enter());
        assert_eq!(api.state().unwrap().curr_slide, 0);
    }

    #[test]
    fn test_boundaries_without_wrap() {
        setup();
        let (container, prev, next) = show(3);
        let api = init(container, no_wrap()).unwrap();

        assert!(dom::has_class(prev, "disabled"));
        assert!(dom::is_disabled(prev));
        assert!(!dom::is_disabled(next));

        click(next);
        click(next);
        assert_eq!(api.state().unwrap().curr_slide, 2);
        assert!(dom::has_class(next, "disabled"));
        assert!(dom::is_disabled(next));
        assert!(!dom::is_disabled(prev));

        click(next);
        key_down(next, KeyboardEvent::space());
        assert_eq!(api.state().unwrap().curr_slide, 2);
    }

    #[test]
    fn test_custom_boundaries() {
        setup();
        let (container, prev, next) = show(4);
        let api = init(
            container,
            Options {
                prev_boundary: Some(1),
                next_boundary: Some(2),
                starting_slide: 1,
                ..no_wrap()
            },
        )
        .unwrap();

        assert!(dom::is_disabled(prev));
        api.next();
        assert!(dom::is_disabled(next));
        assert!(!dom::is_disabled(prev));
    }

    #[test]
    fn test_wrap_never_disables() {
        setup();
        let (container, prev, _next) = show(3);
        init(container, Options::default()).unwrap();
        assert!(!dom::has_class(prev, "disabled"));
        assert!(!dom::is_disabled(prev));
    }

    #[test]
    fn test_swipe_horizontal_and_vertical() {
        setup();
        let (container, _, _) = show(3);
        let api = init(
            container,
            Options {
                swipe: true,
                ..Options::default()
            },
        )
        .unwrap();

        swipe(container, EventType::SwipeLeft);
        assert_eq!(api.state().unwrap().curr_slide, 1);
        assert_eq!(api.state().unwrap().last_transition.unwrap().cause, TransitionCause::Swipe);
        swipe(container, EventType::SwipeRight);
        assert_eq!(api.state().unwrap().curr_slide, 0);
        swipe(container, EventType::SwipeUp);
        assert_eq!(api.state().unwrap().curr_slide, 0);

        let (vertical, _, _) = show(3);
        let api = init(
            vertical,
            Options {
                swipe: true,
                swipe_vert: true,
                ..Options::default()
            },
        )
        .unwrap();
        swipe(vertical, EventType::SwipeUp);
        assert_eq!(api.state().unwrap().curr_slide, 1);
        swipe(vertical, EventType::SwipeLeft);
        assert_eq!(api.state().unwrap().curr_slide, 1);
    }

    #[test]
    fn test_destroy_unbinds() {
        setup();
        let (container, prev, next) = show(3);
        let api = init(
            container,
            Options {
                swipe: true,
                ..no_wrap()
            },
        )
        .unwrap();
        api.destroy();

        assert_eq!(listener_count(next), 0);
        assert_eq!(listener_count(container), 0);
        assert!(!dom::is_disabled(prev));
        assert!(!dom::has_class(prev, "disabled"));
        assert!(!dom::has_attribute(next, "aria-label"));
        assert_eq!(registry::record(next), None);
    }

    #[test]
    fn test_shared_control_survives_earlier_destroy() {
        setup();
        let shared = ElementBuilder::new("div").class("shared-next").append_to(body());
        let first = ElementBuilder::new("div")
            .children((0..3).map(|_| ElementBuilder::new("img")))
            .append_to(body());
        let second = ElementBuilder::new("div")
            .children((0..3).map(|_| ElementBuilder::new("img")))
            .append_to(body());
        let options = || Options {
            next: Some(".shared-next".into()),
            ..Options::default()
        };
        let api_a = init(first, options()).unwrap();
        let api_b = init(second, options()).unwrap();
        assert!(registry::is_owned_by(shared, api_b.id()));

        api_a.destroy();
        assert!(registry::is_owned_by(shared, api_b.id()));
        assert_eq!(dom::get_attribute(shared, "aria-label").as_deref(), Some("Next slide"));
        click(shared);
        assert_eq!(api_b.state().unwrap().curr_slide, 1);

        api_b.destroy();
        assert_eq!(listener_count(shared), 0);
        assert!(!dom::has_attribute(shared, "aria-label"));
        assert_eq!(registry::record(shared), None);
    }

    #[test]
    fn test_next_event_on_hover() {
        setup();
        let (container, prev, next) = show(3);
        let api = init(
            container,
            Options {
                next_event: EventType::MouseEnter,
                ..Options::default()
            },
        )
        .unwrap();

        dom::hover(next, true);
        assert_eq!(api.state().unwrap().curr_slide, 1);
        click(next);
        assert_eq!(api.state().unwrap().curr_slide, 1);
        click(prev);
        assert_eq!(api.state().unwrap().curr_slide, 0);
    }
}
