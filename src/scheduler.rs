//! Deferred Tasks - Zero-delay continuation queue
//!
//! The control layer never moves focus synchronously inside an input handler:
//! the engine may still be mutating the document for a transition. Focus calls
//! (and the engine's own post-transition notification) are queued here and run
//! on the next turn.
//!
//! The host drives the queue:
//! - `run_turn()` runs the tasks queued before the call (one event-loop turn)
//! - `flush()` runs turns until the queue is idle
//!
//! Every queued task returns a [`TaskHandle`]; cancelling it before the task
//! runs turns the task into a no-op.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Upper bound on turns `flush` will run before giving up on a self-requeuing task.
const MAX_FLUSH_TURNS: usize = 1024;

struct Task {
    cancelled: Rc<Cell<bool>>,
    run: Box<dyn FnOnce()>,
}

thread_local! {
    static QUEUE: RefCell<VecDeque<Task>> = RefCell::new(VecDeque::new());
}

// =============================================================================
// TASK HANDLE
// =============================================================================

/// Cancellable, single-fire token for a deferred task.
#[derive(Clone, Debug)]
pub struct TaskHandle {
    cancelled: Rc<Cell<bool>>,
}

impl TaskHandle {
    /// Prevent the task from running. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// True once cancelled or already run.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

// =============================================================================
// QUEUE
// =============================================================================

/// Queue a task for the next turn.
pub fn defer(task: impl FnOnce() + 'static) -> TaskHandle {
    let cancelled = Rc::new(Cell::new(false));
    QUEUE.with(|queue| {
        queue.borrow_mut().push_back(Task {
            cancelled: cancelled.clone(),
            run: Box::new(task),
        });
    });
    TaskHandle { cancelled }
}

/// Number of queued tasks (cancelled ones included until drained).
pub fn pending() -> usize {
    QUEUE.with(|queue| queue.borrow().len())
}

/// Run every task queued before this call. Tasks queued while running wait
/// for the next turn. Returns the number of tasks actually run.
pub fn run_turn() -> usize {
    let batch: Vec<Task> = QUEUE.with(|queue| queue.borrow_mut().drain(..).collect());
    let mut ran = 0;
    for task in batch {
        // Mark as spent before running so the handle reports it as done.
        if task.cancelled.replace(true) {
            continue;
        }
        (task.run)();
        ran += 1;
    }
    ran
}

/// Run turns until no task is left. Returns the total number of tasks run.
pub fn flush() -> usize {
    let mut total = 0;
    for _ in 0..MAX_FLUSH_TURNS {
        if pending() == 0 {
            return total;
        }
        total += run_turn();
    }
    log::warn!("scheduler still busy after {} turns, leaving remaining tasks queued", MAX_FLUSH_TURNS);
    total
}

/// Drop all queued tasks without running them (for testing).
pub fn reset_scheduler() {
    QUEUE.with(|queue| queue.borrow_mut().clear());
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defer_runs_on_next_turn() {
        reset_scheduler();
        let hit = Rc::new(Cell::new(false));
        let hit_clone = hit.clone();

        defer(move || hit_clone.set(true));
        assert!(!hit.get());
        assert_eq!(pending(), 1);

        assert_eq!(run_turn(), 1);
        assert!(hit.get());
        assert_eq!(pending(), 0);
    }

    #[test]
    fn test_cancelled_task_is_skipped() {
        reset_scheduler();
        let hit = Rc::new(Cell::new(false));
        let hit_clone = hit.clone();

        let handle = defer(move || hit_clone.set(true));
        handle.cancel();

        assert_eq!(run_turn(), 0);
        assert!(!hit.get());
    }

    #[test]
    fn test_nested_defer_waits_for_next_turn() {
        reset_scheduler();
        let order = Rc::new(RefCell::new(Vec::new()));
        let outer = order.clone();

        defer(move || {
            outer.borrow_mut().push("outer");
            let inner = outer.clone();
            defer(move || inner.borrow_mut().push("inner"));
        });

        run_turn();
        assert_eq!(*order.borrow(), vec!["outer"]);

        assert_eq!(flush(), 1);
        assert_eq!(*order.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_handle_reports_spent_after_run() {
        reset_scheduler();
        let handle = defer(|| {});
        assert!(!handle.is_cancelled());
        flush();
        assert!(handle.is_cancelled());
    }
}
