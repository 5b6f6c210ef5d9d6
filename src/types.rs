//! Core Types - Handles and flags shared across the crate.
//!
//! Elements and instances are NOT objects. They are indices into thread-local
//! registries, so every cross-reference in the crate is a plain `Copy` handle:
//!
//! ```text
//! ElementId(3)  -> document arena slot 3   (pager item)
//! InstanceId(0) -> instance registry key 0 (slideshow owning the pager)
//! ```
//!
//! A handle never keeps its target alive. Looking up a handle whose target is
//! gone yields `None`, which is how stale references degrade to no-ops.

use std::fmt;

// =============================================================================
// Handles
// =============================================================================

/// Handle to an element in the headless document.
///
/// Ids are never reused within a document, so a handle to a removed element
/// can't alias a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Handle to a running slideshow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) usize);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cycle#{}", self.0)
    }
}

/// Boxed unsubscribe / unbind function.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Control Roles
// =============================================================================

/// Logical control role resolved per instance by the component registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Pager,
    Next,
    Prev,
    /// Preferred pause-toggle role.
    PauseControl,
    /// Fallback pause-toggle role, consulted when `PauseControl` resolves nothing.
    Pause,
}

impl Role {
    /// Option name the role is configured under.
    pub fn option_name(self) -> &'static str {
        match self {
            Role::Pager => "pager",
            Role::Next => "next",
            Role::Prev => "prev",
            Role::PauseControl => "pauseControl",
            Role::Pause => "pause",
        }
    }
}

// =============================================================================
// Control Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Per-element state recorded by the control layer.
    ///
    /// The `OWNS_*` bits remember which attributes this layer wrote, so
    /// teardown strips exactly those and leaves author markup alone.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ControlFlags: u8 {
        const NONE = 0;
        /// Element is natively interactive (button-like or link with href).
        const INTERACTIVE = 1 << 0;
        /// Label was absent at enhancement; the layer may keep rewriting it.
        const OWNS_LABEL = 1 << 1;
        const OWNS_TABINDEX = 1 << 2;
        const OWNS_ROLE = 1 << 3;
        const OWNS_PRESSED = 1 << 4;
        /// Pager item created from a template (removed on teardown).
        const GENERATED = 1 << 5;
        /// Element is a pager container rather than a control itself.
        const PAGER_CONTAINER = 1 << 6;
    }
}
