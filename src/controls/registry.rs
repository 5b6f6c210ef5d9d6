//! Component Registry - role resolution, owner back-references, bindings.
//!
//! Controls point back at their slideshow through a keyed map from element to
//! instance id. Neither side holds the other: removing an element or
//! destroying an instance leaves at worst a record that resolves to nothing.
//!
//! Every unbind closure a binder creates is recorded under the owning
//! instance. `release(owner)` runs them all and clears every owner tag, which
//! is how an instance's controls return to author markup on destroy.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::engine::{self, Api};
use crate::types::{Cleanup, ControlFlags, ElementId, InstanceId, Role};

// =============================================================================
// TYPES
// =============================================================================

/// What the layer knows about one control element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRecord {
    pub owner: InstanceId,
    pub role: Role,
    pub flags: ControlFlags,
    /// Zero-based slide index, pager items only.
    pub pager_index: Option<usize>,
}

thread_local! {
    static RECORDS: RefCell<HashMap<ElementId, ControlRecord>> = RefCell::new(HashMap::new());
    static BINDINGS: RefCell<HashMap<InstanceId, Vec<Cleanup>>> = RefCell::new(HashMap::new());
    /// Author attribute values the layer overwrote, restored on strip.
    static SAVED: RefCell<HashMap<ElementId, Vec<(String, String)>>> = RefCell::new(HashMap::new());
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Elements currently serving `role` for the instance.
///
/// `pauseControl` falls back to `pause` when it resolves nothing.
pub fn resolve(api: Api, role: Role) -> Vec<ElementId> {
    let elements = api.get_component(role);
    if elements.is_empty() && role == Role::PauseControl {
        return api.get_component(Role::Pause);
    }
    if elements.is_empty() {
        log::trace!("{} resolved no {}", api.id(), role.option_name());
    }
    elements
}

// =============================================================================
// OWNER TAGS
// =============================================================================

/// Record `owner` as the instance `el` controls. Last write wins.
pub fn tag_owner(el: ElementId, owner: InstanceId, role: Role) {
    RECORDS.with(|records| {
        let mut records = records.borrow_mut();
        match records.get_mut(&el) {
            Some(record) => {
                if record.owner != owner {
                    log::debug!("{} re-tagged from {} to {}", el, record.owner, owner);
                }
                record.owner = owner;
                record.role = role;
            }
            None => {
                records.insert(
                    el,
                    ControlRecord {
                        owner,
                        role,
                        flags: ControlFlags::NONE,
                        pager_index: None,
                    },
                );
            }
        }
    });
}

pub fn record(el: ElementId) -> Option<ControlRecord> {
    RECORDS.with(|records| records.borrow().get(&el).copied())
}

/// Live instance `el` is tagged with.
pub fn owner_of(el: ElementId) -> Option<Api> {
    record(el).and_then(|record| engine::api_for(record.owner))
}

pub fn is_owned_by(el: ElementId, owner: InstanceId) -> bool {
    record(el).is_some_and(|record| record.owner == owner)
}

/// Remove the record entirely. Returns what it held.
pub fn clear_owner(el: ElementId) -> Option<ControlRecord> {
    RECORDS.with(|records| records.borrow_mut().remove(&el))
}

/// Controls of `owner` serving `role`, in document-independent id order.
pub fn controls_of(owner: InstanceId, role: Role) -> Vec<ElementId> {
    let mut elements: Vec<ElementId> = RECORDS.with(|records| {
        records
            .borrow()
            .iter()
            .filter(|(_, record)| record.owner == owner && record.role == role)
            .map(|(&el, _)| el)
            .collect()
    });
    elements.sort();
    elements
}

// =============================================================================
// FLAGS
// =============================================================================

pub fn flags(el: ElementId) -> ControlFlags {
    record(el).map_or(ControlFlags::NONE, |record| record.flags)
}

pub fn insert_flags(el: ElementId, flags: ControlFlags) {
    RECORDS.with(|records| {
        if let Some(record) = records.borrow_mut().get_mut(&el) {
            record.flags.insert(flags);
        }
    });
}

pub fn remove_flags(el: ElementId, flags: ControlFlags) {
    RECORDS.with(|records| {
        if let Some(record) = records.borrow_mut().get_mut(&el) {
            record.flags.remove(flags);
        }
    });
}

pub fn set_pager_index(el: ElementId, index: usize) {
    RECORDS.with(|records| {
        if let Some(record) = records.borrow_mut().get_mut(&el) {
            record.pager_index = Some(index);
        }
    });
}

pub fn pager_index(el: ElementId) -> Option<usize> {
    record(el).and_then(|record| record.pager_index)
}

// =============================================================================
// SAVED AUTHOR VALUES
// =============================================================================

/// Remember an author value of `name` before the layer overwrites it.
pub fn save_attribute(el: ElementId, name: &str, value: &str) {
    SAVED.with(|saved| {
        let mut saved = saved.borrow_mut();
        let entries = saved.entry(el).or_default();
        if !entries.iter().any(|(saved_name, _)| saved_name == name) {
            entries.push((name.to_string(), value.to_string()));
        }
    });
}

pub fn saved_attribute(el: ElementId, name: &str) -> Option<String> {
    SAVED.with(|saved| {
        saved
            .borrow()
            .get(&el)
            .and_then(|entries| entries.iter().find(|(saved_name, _)| saved_name == name))
            .map(|(_, value)| value.clone())
    })
}

/// Remove and return every saved value of `el`.
pub fn take_saved_attributes(el: ElementId) -> Vec<(String, String)> {
    SAVED.with(|saved| saved.borrow_mut().remove(&el).unwrap_or_default())
}

// =============================================================================
// BINDINGS
// =============================================================================

/// Record an unbind closure to run when `owner` is released.
pub fn bind(owner: InstanceId, cleanup: impl FnOnce() + 'static) {
    BINDINGS.with(|bindings| {
        bindings.borrow_mut().entry(owner).or_default().push(Box::new(cleanup));
    });
}

pub fn binding_count(owner: InstanceId) -> usize {
    BINDINGS.with(|bindings| bindings.borrow().get(&owner).map_or(0, Vec::len))
}

/// Run every unbind closure of `owner`, then drop its remaining owner tags.
pub fn release(owner: InstanceId) {
    let cleanups = BINDINGS.with(|bindings| bindings.borrow_mut().remove(&owner).unwrap_or_default());
    log::debug!("{} releasing {} bindings", owner, cleanups.len());
    for cleanup in cleanups {
        cleanup();
    }
    let released: Vec<ElementId> = RECORDS.with(|records| {
        let mut records = records.borrow_mut();
        let released = records
            .iter()
            .filter(|(_, record)| record.owner == owner)
            .map(|(&el, _)| el)
            .collect();
        records.retain(|_, record| record.owner != owner);
        released
    });
    SAVED.with(|saved| {
        let mut saved = saved.borrow_mut();
        for el in released {
            saved.remove(&el);
        }
    });
}

/// Number of elements carrying a record (for testing and diagnostics).
pub fn record_count() -> usize {
    RECORDS.with(|records| records.borrow().len())
}

/// Clear all records and bindings without running them (for testing).
pub fn reset_registry() {
    RECORDS.with(|records| records.borrow_mut().clear());
    BINDINGS.with(|bindings| bindings.borrow_mut().clear());
    SAVED.with(|saved| saved.borrow_mut().clear());
}

// =============================================================================
// TESTS
// =============================================================================
