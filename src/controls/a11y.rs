//! Accessibility Enhancer - interaction semantics for control elements.
//!
//! Shared by every binder. Enhancement only fills gaps: an attribute the
//! author already declared is never overwritten, and every attribute this
//! layer does write is recorded in the element's `ControlFlags` so teardown
//! can strip exactly those.
//!
//! | element            | tabindex | role     | label             |
//! |--------------------|----------|----------|-------------------|
//! | `<button>`, `<a href>` | kept | `button` if none | if none declared |
//! | anything else      | `0` if none | `button` if none | if none declared |
//!
//! Enhancement is idempotent: running it twice changes nothing, and binding
//! activation twice leaves one set of listeners.

use std::rc::Rc;

use crate::dom::{self, DomEvent, EventType};
use crate::types::{ControlFlags, ElementId, InstanceId, Role};

use super::registry;

/// Enhance `el` as a `role` control of `owner`. Returns the recorded flags.
///
/// `label` is applied only when the element has neither `aria-label` nor
/// `aria-labelledby`; in that case the layer owns the label from then on.
pub fn enhance(el: ElementId, owner: InstanceId, role: Role, label: Option<&str>) -> ControlFlags {
    registry::tag_owner(el, owner, role);
    let mut flags = registry::flags(el);

    if dom::is_natively_interactive(el) {
        flags |= ControlFlags::INTERACTIVE;
    } else if !dom::has_attribute(el, "tabindex") {
        dom::set_attribute(el, "tabindex", "0");
        flags |= ControlFlags::OWNS_TABINDEX;
    }

    if !dom::has_attribute(el, "role") {
        dom::set_attribute(el, "role", "button");
        flags |= ControlFlags::OWNS_ROLE;
    }

    if let Some(label) = label {
        if flags.contains(ControlFlags::OWNS_LABEL) {
            dom::set_attribute(el, "aria-label", label);
        } else if !dom::has_attribute(el, "aria-label") && !dom::has_attribute(el, "aria-labelledby") {
            dom::set_attribute(el, "aria-label", label);
            flags |= ControlFlags::OWNS_LABEL;
        }
    }

    registry::insert_flags(el, flags);
    flags
}

/// Bind `primary` (usually click), Space, and (for non-native elements) Enter
/// to `activate`.
///
/// All listeners live in `namespace`, which is cleared first.
pub fn bind_activation<F>(el: ElementId, namespace: &str, primary: EventType, activate: F)
where
    F: Fn(&mut DomEvent) + 'static,
{
    dom::off(el, None, namespace);
    let native = dom::is_natively_interactive(el);
    let activate = Rc::new(activate);

    let on_primary = activate.clone();
    dom::on(el, primary, namespace, move |event| on_primary(event));

    dom::on(el, EventType::KeyDown, namespace, move |event| {
        let Some(key) = event.key.as_ref() else {
            return;
        };
        if !key.is_press() {
            return;
        }
        // Native elements turn Enter into a click themselves.
        if key.is_space() || (key.is_enter() && !native) {
            event.prevent_default();
            activate(event);
        }
    });
}

/// Update the label, if this layer owns it.
pub fn set_label(el: ElementId, label: &str) -> bool {
    if registry::flags(el).contains(ControlFlags::OWNS_LABEL) {
        dom::set_attribute(el, "aria-label", label);
        true
    } else {
        false
    }
}

/// Mirror pressed state onto `aria-pressed`.
///
/// An author-declared value is saved on first write and put back by `strip`.
pub fn set_pressed(el: ElementId, pressed: bool) {
    if !registry::flags(el).contains(ControlFlags::OWNS_PRESSED)
        && registry::saved_attribute(el, "aria-pressed").is_none()
    {
        match dom::get_attribute(el, "aria-pressed") {
            Some(authored) => registry::save_attribute(el, "aria-pressed", &authored),
            None => registry::insert_flags(el, ControlFlags::OWNS_PRESSED),
        }
    }
    dom::set_attribute(el, "aria-pressed", if pressed { "true" } else { "false" });
}

/// Undo enhancement for `owner`: drop listeners in `namespace`, the
/// attributes this layer wrote, and the owner record. Author values the layer
/// overwrote are restored.
///
/// An element re-tagged by another instance is left alone; it belongs to that
/// instance now.
pub fn strip(el: ElementId, owner: InstanceId, namespace: &str) {
    if !registry::is_owned_by(el, owner) {
        return;
    }
    dom::off(el, None, namespace);
    let saved = registry::take_saved_attributes(el);
    let Some(record) = registry::clear_owner(el) else {
        return;
    };
    let flags = record.flags;
    if flags.contains(ControlFlags::OWNS_TABINDEX) {
        dom::remove_attribute(el, "tabindex");
    }
    if flags.contains(ControlFlags::OWNS_ROLE) {
        dom::remove_attribute(el, "role");
    }
    if flags.contains(ControlFlags::OWNS_LABEL) {
        dom::remove_attribute(el, "aria-label");
    }
    if flags.contains(ControlFlags::OWNS_PRESSED) {
        dom::remove_attribute(el, "aria-pressed");
    }
    for (name, value) in saved {
        dom::set_attribute(el, &name, &value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{body, click, events::reset_events, hover, key_down, listener_count, reset_document, ElementBuilder};
    use crate::input::KeyboardEvent;
    use crate::controls::registry::reset_registry;
    use std::cell::Cell;

    const NS: &str = "cycle.test";
    const OWNER: InstanceId = InstanceId(0);

    fn setup() {
        reset_document();
        reset_events();
        reset_registry();
    }

    fn counter(el: ElementId) -> Rc<Cell<usize>> {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        bind_activation(el, NS, EventType::Click, move |_| h.set(h.get() + 1));
        hits
    }

    #[test]
    fn test_enhance_plain_element() {
        setup();
        let el = ElementBuilder::new("div").append_to(body());
        let flags = enhance(el, OWNER, Role::Next, Some("Next slide"));

        assert_eq!(dom::get_attribute(el, "tabindex").as_deref(), Some("0"));
        assert_eq!(dom::get_attribute(el, "role").as_deref(), Some("button"));
        assert_eq!(dom::get_attribute(el, "aria-label").as_deref(), Some("Next slide"));
        assert!(flags.contains(ControlFlags::OWNS_LABEL | ControlFlags::OWNS_TABINDEX | ControlFlags::OWNS_ROLE));
        assert!(!flags.contains(ControlFlags::INTERACTIVE));
    }

    #[test]
    fn test_enhance_keeps_author_attributes() {
        setup();
        let el = ElementBuilder::new("div")
            .attr("tabindex", "-1")
            .attr("role", "link")
            .attr("aria-labelledby", "caption")
            .append_to(body());
        let flags = enhance(el, OWNER, Role::Prev, Some("Previous slide"));

        assert_eq!(dom::get_attribute(el, "tabindex").as_deref(), Some("-1"));
        assert_eq!(dom::get_attribute(el, "role").as_deref(), Some("link"));
        assert!(!dom::has_attribute(el, "aria-label"));
        assert_eq!(flags, ControlFlags::NONE);
    }

    #[test]
    fn test_enhance_native_button() {
        setup();
        let el = ElementBuilder::new("button").append_to(body());
        let flags = enhance(el, OWNER, Role::Next, None);
        assert!(flags.contains(ControlFlags::INTERACTIVE));
        assert!(!dom::has_attribute(el, "tabindex"));
        assert!(!dom::has_attribute(el, "aria-label"));
    }

    #[test]
    fn test_enhance_is_idempotent() {
        setup();
        let el = ElementBuilder::new("span").append_to(body());
        let first = enhance(el, OWNER, Role::Pager, Some("Go to slide 1"));
        let second = enhance(el, OWNER, Role::Pager, Some("Go to slide 2"));

        assert_eq!(first, second);
        // Owned label follows the latest text.
        assert_eq!(dom::get_attribute(el, "aria-label").as_deref(), Some("Go to slide 2"));
    }

    #[test]
    fn test_activation_keys_on_plain_element() {
        setup();
        let el = ElementBuilder::new("div").append_to(body());
        let hits = counter(el);

        click(el);
        key_down(el, KeyboardEvent::space());
        key_down(el, KeyboardEvent::enter());
        key_down(el, KeyboardEvent::new("a"));
        assert_eq!(hits.get(), 3);
    }

    #[test]
    fn test_activation_enter_on_button_fires_once() {
        setup();
        let el = ElementBuilder::new("button").append_to(body());
        let hits = counter(el);

        // Enter reaches the handler through the synthesized click only.
        key_down(el, KeyboardEvent::enter());
        assert_eq!(hits.get(), 1);
        key_down(el, KeyboardEvent::space());
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_rebinding_does_not_stack() {
        setup();
        let el = ElementBuilder::new("div").append_to(body());
        counter(el);
        let hits = counter(el);
        assert_eq!(listener_count(el), 2);

        click(el);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_set_label_only_when_owned() {
        setup();
        let owned = ElementBuilder::new("div").append_to(body());
        let authored = ElementBuilder::new("div").attr("aria-label", "Stop").append_to(body());
        enhance(owned, OWNER, Role::PauseControl, Some("Pause slideshow"));
        enhance(authored, OWNER, Role::PauseControl, Some("Pause slideshow"));

        assert!(set_label(owned, "Resume slideshow"));
        assert!(!set_label(authored, "Resume slideshow"));
        assert_eq!(dom::get_attribute(authored, "aria-label").as_deref(), Some("Stop"));
    }

    #[test]
    fn test_strip_restores_author_markup() {
        setup();
        let el = ElementBuilder::new("div").attr("role", "link").append_to(body());
        enhance(el, OWNER, Role::Next, Some("Next slide"));
        set_pressed(el, true);
        counter(el);

        strip(el, OWNER, NS);
        assert_eq!(listener_count(el), 0);
        assert!(!dom::has_attribute(el, "tabindex"));
        assert!(!dom::has_attribute(el, "aria-label"));
        assert!(!dom::has_attribute(el, "aria-pressed"));
        assert_eq!(dom::get_attribute(el, "role").as_deref(), Some("link"));
        assert_eq!(registry::record(el), None);
    }

    #[test]
    fn test_strip_restores_authored_pressed() {
        setup();
        let el = ElementBuilder::new("button").attr("aria-pressed", "mixed").append_to(body());
        enhance(el, OWNER, Role::PauseControl, Some("Pause slideshow"));
        set_pressed(el, true);
        set_pressed(el, false);
        assert_eq!(dom::get_attribute(el, "aria-pressed").as_deref(), Some("false"));
        assert!(!registry::flags(el).contains(ControlFlags::OWNS_PRESSED));

        strip(el, OWNER, NS);
        assert_eq!(dom::get_attribute(el, "aria-pressed").as_deref(), Some("mixed"));
    }

    #[test]
    fn test_strip_skips_elements_owned_elsewhere() {
        setup();
        let el = ElementBuilder::new("div").append_to(body());
        let other = InstanceId(1);
        enhance(el, OWNER, Role::Next, Some("Next slide"));
        enhance(el, other, Role::Next, Some("Next slide"));
        let hits = counter(el);

        strip(el, OWNER, NS);
        assert!(registry::is_owned_by(el, other));
        assert_eq!(dom::get_attribute(el, "aria-label").as_deref(), Some("Next slide"));
        click(el);
        assert_eq!(hits.get(), 1);

        strip(el, other, NS);
        assert_eq!(listener_count(el), 0);
        assert!(!dom::has_attribute(el, "aria-label"));
    }

    #[test]
    fn test_hover_as_primary_event() {
        setup();
        let el = ElementBuilder::new("span").append_to(body());
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        bind_activation(el, NS, EventType::MouseEnter, move |_| h.set(h.get() + 1));

        hover(el, true);
        click(el);
        key_down(el, KeyboardEvent::space());
        assert_eq!(hits.get(), 2);
    }
}
