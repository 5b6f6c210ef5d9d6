//! Slideshow Engine - the command surface and lifecycle events controls drive.
//!
//! The engine owns instances and their state:
//! - Options: defaults, JSON and `data-cycle-*` configuration
//! - Bus: synchronous lifecycle events with global, scoped and one-shot subscriptions
//! - Instance: registry, `State` snapshots, `Api` command handle
//!
//! # Architecture
//!
//! Instances are NOT objects. They are keys into a thread-local registry,
//! and everything outside the engine talks to them through `Api`:
//!
//! ```text
//! Api(cycle#0) --next()--> registry[cycle#0].curr_slide += 1
//!                           └── bus: UpdateView (now), AfterTransition (next turn)
//! ```

pub mod bus;
mod instance;
mod options;

pub use bus::{EventName, Lifecycle, LifecycleEvent};
pub use instance::*;
pub use options::*;
