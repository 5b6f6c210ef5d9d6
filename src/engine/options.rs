//! Options - per-instance configuration.
//!
//! Three layers, later wins:
//! 1. `Options::default()` (the documented defaults)
//! 2. values set by the host, directly or via `Options::from_json`
//! 3. `data-cycle-*` attributes on the container (`data-cycle-allow-wrap="false"`)
//!
//! Selectors are parsed in `validate`, which `init` calls, so a malformed
//! selector is a configuration error rather than a dead control.

use serde::Deserialize;

use crate::dom::{self, EventType, Selector};
use crate::error::{Error, Result};
use crate::types::{ElementId, Role};

// =============================================================================
// Component Source
// =============================================================================

/// Where a role's elements come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ComponentSource {
    /// Selector text. A leading `>` resolves inside the container, anything
    /// else resolves document-wide.
    Selector(String),
    /// Explicit element set, used verbatim.
    Elements(Vec<ElementId>),
}

impl From<String> for ComponentSource {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

impl From<&str> for ComponentSource {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<ElementId> for ComponentSource {
    fn from(el: ElementId) -> Self {
        Self::Elements(vec![el])
    }
}

impl From<Vec<ElementId>> for ComponentSource {
    fn from(elements: Vec<ElementId>) -> Self {
        Self::Elements(elements)
    }
}

impl ComponentSource {
    /// Parse the selector (if any).
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Selector(selector) => Selector::parse(selector).map(|_| ()),
            Self::Elements(_) => Ok(()),
        }
    }

    /// Resolve against an instance container.
    pub fn resolve(&self, container: ElementId) -> Vec<ElementId> {
        match self {
            Self::Selector(selector) => match Selector::parse(selector) {
                Ok(parsed) if parsed.is_scoped() => parsed.query(Some(container)),
                Ok(parsed) => parsed.query(None),
                Err(err) => {
                    log::warn!("{}", err);
                    Vec::new()
                }
            },
            Self::Elements(elements) => elements.iter().copied().filter(|&el| dom::exists(el)).collect(),
        }
    }

    /// Resolve strictly inside the container, whatever the selector's prefix.
    pub fn resolve_within(&self, container: ElementId) -> Vec<ElementId> {
        match self {
            Self::Selector(selector) => Selector::parse(selector)
                .map(|parsed| parsed.query(Some(container)))
                .unwrap_or_default(),
            Self::Elements(elements) => elements
                .iter()
                .copied()
                .filter(|&el| dom::contains(container, el) && el != container)
                .collect(),
        }
    }
}

// =============================================================================
// Pager Template
// =============================================================================

/// Markup for generated pager items: one element with text content.
///
/// `{{slideNum}}` in `text` is replaced with the 1-based slide number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PagerTemplate {
    pub tag: String,
    pub text: String,
    pub class: Option<String>,
}

impl Default for PagerTemplate {
    fn default() -> Self {
        Self {
            tag: "span".to_string(),
            text: "\u{2022}".to_string(),
            class: None,
        }
    }
}

/// Substitute `{{slideNum}}` (1-based) in a template string.
pub fn fill_slide_num(template: &str, slide_index: usize) -> String {
    template.replace("{{slideNum}}", &(slide_index + 1).to_string())
}

// =============================================================================
// Options
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    // Engine
    pub slides: ComponentSource,
    pub allow_wrap: bool,
    pub starting_slide: usize,
    pub manual_trump: bool,
    pub paused: bool,
    pub pause_on_hover: bool,
    pub fx: String,
    pub slide_class: String,
    pub slide_active_class: String,

    // Pager
    pub pager: Option<ComponentSource>,
    pub pager_active_class: String,
    pub pager_template: Option<PagerTemplate>,
    /// Event that activates a pager item (`"click"`, or `"mouseover"` to page on hover).
    pub pager_event: EventType,
    pub pager_event_bubble: bool,
    pub pager_fx: Option<String>,
    pub pager_aria_label: String,

    // Prev / next
    pub next: Option<ComponentSource>,
    pub prev: Option<ComponentSource>,
    pub next_event: EventType,
    pub prev_event: EventType,
    pub next_aria_label: String,
    pub prev_aria_label: String,
    pub disabled_class: String,
    pub prev_boundary: Option<usize>,
    pub next_boundary: Option<usize>,
    pub swipe: bool,
    pub swipe_vert: bool,
    pub swipe_fx: Option<String>,

    // Pause
    pub pause: Option<ComponentSource>,
    pub pause_control: Option<ComponentSource>,
    pub pause_control_event: EventType,
    pub pause_active_class: String,
    pub pause_playing_class: String,
    pub pause_aria_label: String,
    pub resume_aria_label: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            slides: "> img".into(),
            allow_wrap: true,
            starting_slide: 0,
            manual_trump: true,
            paused: false,
            pause_on_hover: false,
            fx: "fade".to_string(),
            slide_class: "cycle-slide".to_string(),
            slide_active_class: "cycle-slide-active".to_string(),

            pager: Some("> .cycle-pager".into()),
            pager_active_class: "cycle-pager-active".to_string(),
            pager_template: Some(PagerTemplate::default()),
            pager_event: EventType::Click,
            pager_event_bubble: false,
            pager_fx: None,
            pager_aria_label: "Go to slide {{slideNum}}".to_string(),

            next: Some("> .cycle-next".into()),
            prev: Some("> .cycle-prev".into()),
            next_event: EventType::Click,
            prev_event: EventType::Click,
            next_aria_label: "Next slide".to_string(),
            prev_aria_label: "Previous slide".to_string(),
            disabled_class: "disabled".to_string(),
            prev_boundary: None,
            next_boundary: None,
            swipe: false,
            swipe_vert: false,
            swipe_fx: None,

            pause: None,
            pause_control: Some("> .cycle-pause".into()),
            pause_control_event: EventType::Click,
            pause_active_class: "cycle-pause-active".to_string(),
            pause_playing_class: "cycle-pause-playing".to_string(),
            pause_aria_label: "Pause slideshow".to_string(),
            resume_aria_label: "Resume slideshow".to_string(),
        }
    }
}

impl Options {
    /// Defaults overridden by a JSON object with camelCase keys.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Configured source for a control role.
    pub fn source(&self, role: Role) -> Option<&ComponentSource> {
        match role {
            Role::Pager => self.pager.as_ref(),
            Role::Next => self.next.as_ref(),
            Role::Prev => self.prev.as_ref(),
            Role::PauseControl => self.pause_control.as_ref(),
            Role::Pause => self.pause.as_ref(),
        }
    }

    /// Event that activates controls of `role`.
    pub fn activation_event(&self, role: Role) -> EventType {
        match role {
            Role::Pager => self.pager_event,
            Role::Next => self.next_event,
            Role::Prev => self.prev_event,
            Role::PauseControl | Role::Pause => self.pause_control_event,
        }
    }

    /// Parse every selector.
    pub fn validate(&self) -> Result<()> {
        self.slides.validate()?;
        for role in [Role::Pager, Role::Next, Role::Prev, Role::PauseControl, Role::Pause] {
            if let Some(source) = self.source(role) {
                source.validate()?;
            }
        }
        if let Some(template) = &self.pager_template {
            if template.tag.trim().is_empty() {
                return Err(Error::invalid_option("pagerTemplate", "<empty tag>"));
            }
        }
        Ok(())
    }

    /// Set one option from its string form (camelCase key).
    ///
    /// Unknown keys are ignored; malformed values are errors.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "slides" => self.slides = value.into(),
            "allowWrap" => self.allow_wrap = parse_bool(key, value)?,
            "startingSlide" => self.starting_slide = parse_usize(key, value)?,
            "manualTrump" => self.manual_trump = parse_bool(key, value)?,
            "paused" => self.paused = parse_bool(key, value)?,
            "pauseOnHover" => self.pause_on_hover = parse_bool(key, value)?,
            "fx" => self.fx = value.to_string(),
            "slideClass" => self.slide_class = value.to_string(),
            "slideActiveClass" => self.slide_active_class = value.to_string(),

            "pager" => self.pager = parse_source(value),
            "pagerActiveClass" => self.pager_active_class = value.to_string(),
            "pagerTemplate" => {
                self.pager_template = if value.trim().is_empty() {
                    None
                } else {
                    Some(PagerTemplate {
                        text: value.to_string(),
                        ..PagerTemplate::default()
                    })
                }
            }
            "pagerEvent" => self.pager_event = parse_event(key, value)?,
            "pagerEventBubble" => self.pager_event_bubble = parse_bool(key, value)?,
            "pagerFx" => self.pager_fx = Some(value.to_string()),
            "pagerAriaLabel" => self.pager_aria_label = value.to_string(),

            "next" => self.next = parse_source(value),
            "prev" => self.prev = parse_source(value),
            "nextEvent" => self.next_event = parse_event(key, value)?,
            "prevEvent" => self.prev_event = parse_event(key, value)?,
            "nextAriaLabel" => self.next_aria_label = value.to_string(),
            "prevAriaLabel" => self.prev_aria_label = value.to_string(),
            "disabledClass" => self.disabled_class = value.to_string(),
            "prevBoundary" => self.prev_boundary = Some(parse_usize(key, value)?),
            "nextBoundary" => self.next_boundary = Some(parse_usize(key, value)?),
            "swipe" => self.swipe = parse_bool(key, value)?,
            "swipeVert" => self.swipe_vert = parse_bool(key, value)?,
            "swipeFx" => self.swipe_fx = Some(value.to_string()),

            "pause" => self.pause = parse_source(value),
            "pauseControl" => self.pause_control = parse_source(value),
            "pauseControlEvent" => self.pause_control_event = parse_event(key, value)?,
            "pauseActiveClass" => self.pause_active_class = value.to_string(),
            "pausePlayingClass" => self.pause_playing_class = value.to_string(),
            "pauseAriaLabel" => self.pause_aria_label = value.to_string(),
            "resumeAriaLabel" => self.resume_aria_label = value.to_string(),

            other => log::debug!("ignoring unknown option `{}`", other),
        }
        Ok(())
    }

    /// Apply `data-cycle-*` attributes found on `container`.
    pub fn apply_data_attributes(&mut self, container: ElementId) -> Result<()> {
        for (name, value) in dom::attributes_with_prefix(container, "data-cycle-") {
            let key = kebab_to_camel(&name["data-cycle-".len()..]);
            self.set(&key, &value)?;
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim() {
        "true" | "" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::invalid_option(key, value)),
    }
}

fn parse_event(key: &str, value: &str) -> Result<EventType> {
    EventType::from_name(value).ok_or_else(|| Error::invalid_option(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| Error::invalid_option(key, value))
}

/// `"false"` or an empty value switches a role off.
fn parse_source(value: &str) -> Option<ComponentSource> {
    match value.trim() {
        "" | "false" => None,
        selector => Some(selector.into()),
    }
}

fn kebab_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{body, reset_document, ElementBuilder};

    #[test]
    fn test_defaults() {
        let opts = Options::default();
        assert!(opts.allow_wrap);
        assert_eq!(opts.pager, Some(ComponentSource::Selector("> .cycle-pager".into())));
        assert_eq!(opts.pause_aria_label, "Pause slideshow");
        assert_eq!(opts.pager_template.unwrap().tag, "span");
    }

    #[test]
    fn test_from_json_overrides() {
        let opts = Options::from_json(
            r#"{ "allowWrap": false, "next": ".ambl-next", "pagerTemplate": { "tag": "button", "text": "{{slideNum}}" } }"#,
        )
        .unwrap();

        assert!(!opts.allow_wrap);
        assert_eq!(opts.next, Some(ComponentSource::Selector(".ambl-next".into())));
        assert_eq!(opts.pager_template.as_ref().unwrap().tag, "button");
        // Untouched keys keep defaults.
        assert_eq!(opts.prev, Some(ComponentSource::Selector("> .cycle-prev".into())));
    }

    #[test]
    fn test_from_json_rejects_bad_types() {
        assert!(matches!(Options::from_json(r#"{ "allowWrap": "maybe" }"#), Err(Error::Json(_))));
    }

    #[test]
    fn test_validate_catches_bad_selector() {
        let opts = Options {
            next: Some("> .a >".into()),
            ..Options::default()
        };
        assert!(matches!(opts.validate(), Err(Error::Selector { .. })));
    }

    #[test]
    fn test_data_attributes() {
        reset_document();
        let show = ElementBuilder::new("div")
            .attr("data-cycle-next", ".ambl-next")
            .attr("data-cycle-allow-wrap", "false")
            .attr("data-cycle-pager", "false")
            .attr("data-cycle-unknown-thing", "x")
            .append_to(body());

        let mut opts = Options::default();
        opts.apply_data_attributes(show).unwrap();

        assert_eq!(opts.next, Some(ComponentSource::Selector(".ambl-next".into())));
        assert!(!opts.allow_wrap);
        assert_eq!(opts.pager, None);
    }

    #[test]
    fn test_activation_events() {
        let opts = Options::from_json(r#"{ "pagerEvent": "mouseover.cycle", "prevEvent": "click" }"#).unwrap();
        assert_eq!(opts.activation_event(Role::Pager), EventType::MouseEnter);
        assert_eq!(opts.activation_event(Role::Prev), EventType::Click);
        assert_eq!(opts.activation_event(Role::Pause), EventType::Click);
        assert!(Options::from_json(r#"{ "nextEvent": "wheel" }"#).is_err());

        let mut opts = Options::default();
        opts.set("pauseControlEvent", "mouseenter").unwrap();
        assert_eq!(opts.pause_control_event, EventType::MouseEnter);
        assert!(matches!(opts.set("nextEvent", "dblclick"), Err(Error::InvalidOption { .. })));
    }

    #[test]
    fn test_data_attribute_bad_value() {
        reset_document();
        let show = ElementBuilder::new("div")
            .attr("data-cycle-starting-slide", "two")
            .append_to(body());

        let mut opts = Options::default();
        assert!(matches!(
            opts.apply_data_attributes(show),
            Err(Error::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_fill_slide_num() {
        assert_eq!(fill_slide_num("Go to slide {{slideNum}}", 0), "Go to slide 1");
        assert_eq!(fill_slide_num("{{slideNum}}", 4), "5");
    }

    #[test]
    fn test_kebab_to_camel() {
        assert_eq!(kebab_to_camel("pause-on-hover"), "pauseOnHover");
        assert_eq!(kebab_to_camel("fx"), "fx");
    }
}
