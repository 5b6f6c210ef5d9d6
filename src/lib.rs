//! # spark-carousel
//!
//! Accessible, pluggable slideshow controls.
//!
//! A slideshow engine advances through the slides inside a container; pager
//! dots, previous/next buttons, a pause toggle and arrow-key navigation attach
//! to a running instance and drive it through a small command surface.
//!
//! ## Architecture
//!
//! Elements and instances are handles into thread-local registries, never
//! objects. Controls talk to the engine through `Api` commands and listen to
//! its lifecycle events:
//! ```text
//! init → SlideAdded*, Initialized, UpdateView   (binders enhance + bind)
//! click / key → Api::next|prev|page|pause|resume (engine mutates state)
//!            → UpdateView / Paused / Resumed    (binders mirror state)
//!            → AfterTransition (next turn)      (keyboard moves focus)
//! destroy → Destroyed                           (binders unbind + strip)
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Handles, roles, control flags
//! - [`dom`] - Headless document: tree, attributes, focus, events, selectors
//! - [`scheduler`] - Deferred, cancellable tasks (one queue turn at a time)
//! - [`engine`] - Options, lifecycle bus, instances and the `Api` handle
//! - [`controls`] - Pager, prev/next, pause and keyboard controls
//! - [`input`] - Key events and crossterm conversion

pub mod controls;
pub mod dom;
pub mod engine;
pub mod error;
pub mod input;
pub mod scheduler;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{Error, Result};

pub use engine::{
    api_for, init, instance_for_container, instances, Api, ComponentSource, EventName,
    Lifecycle, LifecycleEvent, Options, PagerTemplate, State, Transition, TransitionCause,
};

pub use controls::install;

pub use input::{convert_key_event, KeyState, KeyboardEvent, Modifiers};

pub use scheduler::{defer, flush, run_turn, TaskHandle};

/// Reset every thread-local registry (for testing).
pub fn reset_all() {
    dom::reset_document();
    dom::events::reset_events();
    engine::bus::reset_bus();
    engine::reset_instances();
    scheduler::reset_scheduler();
    controls::reset_controls();
}
