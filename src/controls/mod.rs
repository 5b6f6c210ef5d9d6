//! Control Layer - pager, prev/next, pause and keyboard controls for slideshows.
//!
//! - Registry: role resolution, owner back-references, per-instance bindings
//! - A11y: shared enhancement (tabindex, role, label, pressed) and activation keys
//! - Pager, PrevNext, Pause: binders driven by lifecycle events
//! - Keyboard: one document listener, arrow keys across items and slides
//!
//! `install()` wires everything to the lifecycle bus once per thread. After
//! that, every `engine::init` picks up its controls and every `destroy`
//! returns them to author markup.
//!
//! # Example
//!
//! ```ignore
//! use spark_carousel::{controls, engine};
//!
//! controls::install();
//! let api = engine::init(show, engine::Options::default())?;
//! // pager dots, prev/next, pause toggle and arrow keys now drive `api`
//! api.destroy(); // all listeners and annotations removed
//! ```

pub mod a11y;
pub mod keyboard;
pub mod pager;
pub mod pause;
pub mod prevnext;
pub mod registry;

use std::cell::Cell;

use crate::engine::{bus, Lifecycle, LifecycleEvent};

thread_local! {
    static INSTALLED: Cell<bool> = const { Cell::new(false) };
}

/// Wire every binder and the keyboard listener. Idempotent.
pub fn install() {
    keyboard::install();
    if INSTALLED.with(|installed| installed.replace(true)) {
        return;
    }
    // Lives for the rest of the thread.
    let _unsubscribe = bus::on(route);
    log::debug!("controls installed");
}

pub fn is_installed() -> bool {
    INSTALLED.with(Cell::get)
}

fn route(event: &LifecycleEvent) {
    match event.lifecycle {
        Lifecycle::SlideAdded { index, .. } => pager::slide_added(event, index),
        Lifecycle::Initialized => {
            pager::initialized(event);
            prevnext::initialized(event);
            pause::initialized(event);
        }
        Lifecycle::SlideRemoved { index, .. } => pager::slide_removed(event, index),
        Lifecycle::UpdateView => {
            pager::update_view(event);
            prevnext::update_view(event);
        }
        Lifecycle::Destroyed => {
            keyboard::cancel_pending(event.instance());
            registry::release(event.instance());
        }
        _ => {}
    }
}

/// Forget installation, records and pending continuations (for testing).
///
/// Bus subscriptions are not touched; pair with `engine::bus::reset_bus`.
pub fn reset_controls() {
    keyboard::reset_keyboard();
    registry::reset_registry();
    INSTALLED.with(|installed| installed.set(false));
}
