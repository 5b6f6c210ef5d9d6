//! End-to-end behaviour of the control layer against the reference engine.
//!
//! Each test builds markup in the headless document, starts one or more
//! slideshows with controls installed, and drives them only through DOM
//! input: clicks, key presses, swipes.
//!
//! Run with: cargo test --test controls -- --nocapture

use spark_carousel::dom::{self, ElementBuilder, EventType};
use spark_carousel::{controls, engine, flush, reset_all, ElementId, KeyState, KeyboardEvent, Options};

// =============================================================================
// HELPERS
// =============================================================================

fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
    reset_all();
    controls::install();
}

struct Show {
    container: ElementId,
    pager: ElementId,
    prev: ElementId,
    next: ElementId,
    pause: ElementId,
}

/// Container with `slides` images and the default control markup.
fn show(slides: usize) -> Show {
    let container = ElementBuilder::new("div")
        .attr("tabindex", "0")
        .children((0..slides).map(|_| ElementBuilder::new("img")))
        .child(ElementBuilder::new("div").class("cycle-pager"))
        .child(ElementBuilder::new("button").class("cycle-prev"))
        .child(ElementBuilder::new("button").class("cycle-next"))
        .child(ElementBuilder::new("span").class("cycle-pause"))
        .append_to(dom::body());
    let children = dom::children(container);
    Show {
        container,
        pager: children[slides],
        prev: children[slides + 1],
        next: children[slides + 2],
        pause: children[slides + 3],
    }
}

fn pressed_items(pager: ElementId) -> Vec<usize> {
    dom::children(pager)
        .into_iter()
        .enumerate()
        .filter(|&(_, item)| dom::get_attribute(item, "aria-pressed").as_deref() == Some("true"))
        .map(|(index, _)| index)
        .collect()
}

fn press(key: KeyboardEvent) {
    dom::press_key(key);
    flush();
}

/// Press then release, the way terminals with release reporting deliver a key.
fn stroke(key: KeyboardEvent) {
    let release = KeyboardEvent {
        state: KeyState::Release,
        ..key.clone()
    };
    press(key);
    press(release);
}

// =============================================================================
// PAGER
// =============================================================================

#[test]
fn pager_has_one_labelled_item_per_slide() {
    setup();
    for count in 1..=5 {
        let show = show(count);
        engine::init(show.container, Options::default()).unwrap();

        let items = dom::children(show.pager);
        assert_eq!(items.len(), count);
        for (index, item) in items.into_iter().enumerate() {
            assert_eq!(
                dom::get_attribute(item, "aria-label"),
                Some(format!("Go to slide {}", index + 1))
            );
        }
    }
}

#[test]
fn exactly_one_pager_item_is_pressed() {
    setup();
    let show = show(4);
    let api = engine::init(show.container, Options::default()).unwrap();

    let items = dom::children(show.pager);
    for target in [3, 1, 1, 0, 2] {
        dom::click(items[target]);
        assert_eq!(pressed_items(show.pager), vec![api.state().unwrap().curr_slide]);
    }
    dom::click(show.next);
    dom::click(show.next);
    assert_eq!(pressed_items(show.pager), vec![api.state().unwrap().curr_slide]);
}

// =============================================================================
// KEYBOARD
// =============================================================================

#[test]
fn arrow_keys_round_trip() {
    setup();
    let show = show(3);
    let api = engine::init(show.container, Options::default()).unwrap();
    dom::focus(show.container);

    let mut seen = Vec::new();
    for key in [
        KeyboardEvent::arrow_right(),
        KeyboardEvent::arrow_right(),
        KeyboardEvent::arrow_right(),
        KeyboardEvent::arrow_left(),
        KeyboardEvent::arrow_left(),
    ] {
        press(key);
        seen.push(api.state().unwrap().curr_slide);
    }
    assert_eq!(seen, vec![1, 2, 0, 2, 1]);

    for _ in 0..3 {
        press(KeyboardEvent::arrow_left());
    }
    assert_eq!(api.state().unwrap().curr_slide, 1);
}

#[test]
fn key_releases_never_step_twice() {
    setup();
    let show = show(4);
    let api = engine::init(show.container, Options::default()).unwrap();

    dom::focus(show.next);
    stroke(KeyboardEvent::enter());
    assert_eq!(api.state().unwrap().curr_slide, 1);

    let items = dom::children(show.pager);
    dom::focus(items[1]);
    stroke(KeyboardEvent::arrow_right());
    assert_eq!(api.state().unwrap().curr_slide, 2);

    dom::focus(show.container);
    let mut seen = Vec::new();
    for forward in [true, true, false] {
        stroke(if forward { KeyboardEvent::arrow_right() } else { KeyboardEvent::arrow_left() });
        seen.push(api.state().unwrap().curr_slide);
    }
    assert_eq!(seen, vec![3, 0, 3]);
}

#[test]
fn hover_pager_from_data_attribute() {
    setup();
    let show = show(3);
    dom::set_attribute(show.container, "data-cycle-pager-event", "mouseover.cycle");
    let api = engine::init(show.container, Options::default()).unwrap();

    dom::hover(dom::children(show.pager)[2], true);
    assert_eq!(api.state().unwrap().curr_slide, 2);
    assert_eq!(pressed_items(show.pager), vec![2]);
}

#[test]
fn focus_walks_slide_items_before_advancing() {
    setup();
    let container = ElementBuilder::new("div")
        .attr("tabindex", "0")
        .child(
            ElementBuilder::new("div")
                .class("slide")
                .child(ElementBuilder::new("a").attr("href", "#one"))
                .child(ElementBuilder::new("p").text("caption"))
                .child(ElementBuilder::new("button"))
                .child(ElementBuilder::new("span").attr("tabindex", "0"))
                .child(ElementBuilder::new("span").attr("tabindex", "-1")),
        )
        .child(
            ElementBuilder::new("div")
                .class("slide")
                .child(ElementBuilder::new("a").attr("href", "#two")),
        )
        .append_to(dom::body());
    let api = engine::init(
        container,
        Options {
            slides: "> .slide".into(),
            ..Options::default()
        },
    )
    .unwrap();

    let slides = api.state().unwrap().slides;
    let first = dom::children(slides[0]);
    let items = [first[0], first[2], first[3]];
    dom::focus(items[0]);

    for &expected in &items[1..] {
        press(KeyboardEvent::arrow_right());
        assert_eq!(dom::active_element(), Some(expected));
        assert_eq!(api.state().unwrap().curr_slide, 0);
    }

    press(KeyboardEvent::arrow_right());
    assert_eq!(api.state().unwrap().curr_slide, 1);
    assert_eq!(dom::active_element(), Some(dom::children(slides[1])[0]));
}

#[test]
fn pager_roving_does_not_double_step() {
    setup();
    let show = show(3);
    let api = engine::init(show.container, Options::default()).unwrap();
    let items = dom::children(show.pager);
    dom::focus(items[0]);

    press(KeyboardEvent::arrow_right());
    assert_eq!(api.state().unwrap().curr_slide, 1);
    assert_eq!(dom::active_element(), Some(items[1]));
}

// =============================================================================
// PREV / NEXT
// =============================================================================

#[test]
fn boundaries_disable_controls_without_wrap() {
    setup();
    let show = show(3);
    let api = engine::init(
        show.container,
        Options {
            allow_wrap: false,
            ..Options::default()
        },
    )
    .unwrap();

    assert!(dom::has_class(show.prev, "disabled") && dom::is_disabled(show.prev));
    dom::click(show.prev);
    assert_eq!(api.state().unwrap().curr_slide, 0);

    dom::click(show.next);
    dom::click(show.next);
    assert_eq!(api.state().unwrap().curr_slide, 2);
    assert!(dom::has_class(show.next, "disabled") && dom::is_disabled(show.next));
    dom::click(show.next);
    assert_eq!(api.state().unwrap().curr_slide, 2);
}

#[test]
fn shows_sharing_class_names_stay_isolated() {
    setup();
    let a = show(3);
    let b = show(3);
    let api_a = engine::init(a.container, Options::default()).unwrap();
    let api_b = engine::init(b.container, Options::default()).unwrap();

    dom::click(a.next);
    dom::click(dom::children(a.pager)[2]);
    assert_eq!(api_a.state().unwrap().curr_slide, 2);
    assert_eq!(api_b.state().unwrap().curr_slide, 0);

    dom::focus(b.container);
    press(KeyboardEvent::arrow_right());
    assert_eq!(api_a.state().unwrap().curr_slide, 2);
    assert_eq!(api_b.state().unwrap().curr_slide, 1);

    dom::click(b.pause);
    assert!(api_b.state().unwrap().paused);
    assert!(!api_a.state().unwrap().paused);
}

#[test]
fn swipe_steps_the_show() {
    setup();
    let show = show(3);
    let api = engine::init(
        show.container,
        Options {
            swipe: true,
            ..Options::default()
        },
    )
    .unwrap();

    dom::swipe(show.container, EventType::SwipeLeft);
    assert_eq!(api.state().unwrap().curr_slide, 1);
    dom::swipe(show.container, EventType::SwipeRight);
    assert_eq!(api.state().unwrap().curr_slide, 0);
}

// =============================================================================
// PAUSE
// =============================================================================

#[test]
fn pause_toggle_mirrors_state() {
    setup();
    let show = show(2);
    let api = engine::init(show.container, Options::default()).unwrap();

    dom::click(show.pause);
    assert!(api.state().unwrap().paused);
    assert_eq!(dom::get_attribute(show.pause, "aria-pressed").as_deref(), Some("true"));
    assert_eq!(dom::get_attribute(show.pause, "aria-label").as_deref(), Some("Resume slideshow"));

    dom::key_down(show.pause, KeyboardEvent::enter());
    assert!(!api.state().unwrap().paused);
    assert_eq!(dom::get_attribute(show.pause, "aria-pressed").as_deref(), Some("false"));
    assert_eq!(dom::get_attribute(show.pause, "aria-label").as_deref(), Some("Pause slideshow"));
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[test]
fn data_attributes_configure_controls() {
    setup();
    let controls_bar = ElementBuilder::new("div").class("demo-controls").append_to(dom::body());
    let next = ElementBuilder::new("div").class("ambl-next").append_to(controls_bar);
    let container = ElementBuilder::new("div")
        .attr("data-cycle-next", ".demo-controls .ambl-next")
        .attr("data-cycle-allow-wrap", "false")
        .child(ElementBuilder::new("img"))
        .child(ElementBuilder::new("img"))
        .append_to(dom::body());
    let api = engine::init(container, Options::default()).unwrap();

    assert_eq!(dom::get_attribute(next, "role").as_deref(), Some("button"));
    dom::key_down(next, KeyboardEvent::enter());
    assert_eq!(api.state().unwrap().curr_slide, 1);
    assert!(dom::is_disabled(next));

    // Arrow keys on a control outside the container still reach its show.
    dom::set_disabled(next, false);
    dom::focus(next);
    press(KeyboardEvent::arrow_left());
    assert_eq!(api.state().unwrap().curr_slide, 0);
}

#[test]
fn bad_configuration_fails_init() {
    setup();
    let container = ElementBuilder::new("div")
        .attr("data-cycle-pager", "> .pager >")
        .append_to(dom::body());
    assert!(matches!(
        engine::init(container, Options::default()),
        Err(spark_carousel::Error::Selector { .. })
    ));
    assert!(engine::instance_for_container(container).is_none());
}

// =============================================================================
// TEARDOWN
// =============================================================================

#[test]
fn destroy_restores_author_markup() {
    setup();
    let show = show(3);
    let api = engine::init(
        show.container,
        Options {
            allow_wrap: false,
            swipe: true,
            ..Options::default()
        },
    )
    .unwrap();
    dom::focus(show.container);
    press(KeyboardEvent::arrow_right());
    api.destroy();

    assert!(dom::children(show.pager).is_empty());
    for el in [show.prev, show.next, show.pause] {
        assert_eq!(dom::listener_count(el), 0);
        assert!(!dom::has_attribute(el, "aria-label"));
        assert!(!dom::has_attribute(el, "aria-pressed"));
        assert!(!dom::is_disabled(el));
        assert!(controls::registry::record(el).is_none());
    }
    assert_eq!(dom::listener_count(show.container), 0);
    assert_eq!(controls::registry::record_count(), 0);

    // Keys now fall through untouched.
    let event = dom::press_key(KeyboardEvent::arrow_right());
    assert!(!event.default_prevented());
}

#[test]
fn pending_focus_never_fires_after_destroy() {
    setup();
    let container = ElementBuilder::new("div")
        .child(
            ElementBuilder::new("div")
                .class("slide")
                .child(ElementBuilder::new("button"))
                .child(ElementBuilder::new("button")),
        )
        .child(ElementBuilder::new("div").class("slide").child(ElementBuilder::new("button")))
        .append_to(dom::body());
    let api = engine::init(
        container,
        Options {
            slides: "> .slide".into(),
            ..Options::default()
        },
    )
    .unwrap();
    let last = dom::children(api.state().unwrap().slides[0])[1];

    dom::focus(last);
    dom::press_key(KeyboardEvent::arrow_right());
    assert!(controls::keyboard::has_pending(api.id()));
    api.destroy();
    flush();

    assert_eq!(dom::active_element(), Some(last));
}
