//! Bounded one-shot task scheduler.
//!
//! Records tagged actions with an absolute fire time and releases each one
//! exactly once when a poll observes its deadline passed. Actions are plain
//! enum values, not closures, so pending work stays inspectable and the
//! scheduler never owns component references.
//!
//! The queue is a fixed-capacity `heapless::Vec`: scheduling never
//! allocates and never blocks. Overflow drops the new action with a logged
//! warning rather than failing the caller.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{error, warn};

/// Maximum number of pending tasks.
pub const MAX_TASKS: usize = 8;

/// A pending one-shot task. Destroyed once fired; never re-fires.
#[derive(Debug, Clone, Copy)]
struct ScheduledTask<T> {
    action: T,
    fire_at: Instant,
}

/// One-shot deferred task scheduler over a tagged action type.
#[derive(Debug, Default)]
pub struct Scheduler<T> {
    /// Pending tasks in scheduling order (FIFO tie-break on poll).
    tasks: heapless::Vec<ScheduledTask<T>, MAX_TASKS>,
}

impl<T: fmt::Debug> Scheduler<T> {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            tasks: heapless::Vec::new(),
        }
    }

    /// Record `action` to fire no earlier than `now + delay`.
    ///
    /// Returns immediately. On queue overflow the action is dropped and a
    /// warning logged; the scheduler itself never fails.
    pub fn schedule(&mut self, action: T, delay: Duration, now: Instant) {
        let task = ScheduledTask {
            action,
            fire_at: now + delay,
        };
        if let Err(dropped) = self.tasks.push(task) {
            warn!(
                "scheduler queue full ({} pending), dropping {:?}",
                MAX_TASKS, dropped.action
            );
        }
    }

    /// Fire every task whose deadline has passed, in scheduling order.
    ///
    /// Each due task is removed and handed to `fire` exactly once. A
    /// handler error is logged and does not prevent the remaining due
    /// tasks from firing. Returns the number of tasks fired.
    pub fn poll<F, E>(&mut self, now: Instant, mut fire: F) -> usize
    where
        F: FnMut(T) -> Result<(), E>,
        E: fmt::Display,
    {
        let mut fired = 0;
        // Storage order is scheduling order, so repeatedly removing the
        // first due task preserves the FIFO tie-break.
        while let Some(index) = self.tasks.iter().position(|t| t.fire_at <= now) {
            let task = self.tasks.remove(index);
            fired += 1;
            if let Err(e) = fire(task.action) {
                error!("deferred task failed: {e}");
            }
        }
        fired
    }

    /// Number of pending (unfired) tasks.
    #[inline]
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Drop all pending tasks without firing them.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
