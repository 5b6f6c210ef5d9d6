//! Headless DOM - the surface the control layer enhances and listens on.
//!
//! - Document: element arena, tree operations, attributes, classes, focus
//! - Selector: role-selector parsing and matching
//! - Events: namespaced listeners, bubbling dispatch, browser default actions
//!
//! Everything is thread-local: one document per UI thread.

mod document;
pub mod events;
pub mod selector;

pub use document::*;
pub use events::{
    click, dispatch, hover, key_down, listener_count, namespace_count, off, off_document, on,
    on_document, press_key, swipe, DomEvent, EventType,
};
pub use selector::Selector;
