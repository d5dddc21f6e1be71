//! Resource model.
//!
//! The shared processing resource: `capacity` identical units of
//! exclusive-use capacity plus the admission queue of tasks waiting for
//! a unit. The resource only tracks occupancy; which task gets a unit is
//! decided by the dispatcher.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::{SimTime, TaskId};

/// One held unit: which task occupies it and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    /// Holding task.
    pub task_id: TaskId,
    /// Unit index (0-based, lowest free unit is used first).
    pub unit: usize,
    /// Instant the hold began.
    pub since: SimTime,
    /// Instant the hold lapses: completion, or the end of a time slice.
    pub until: SimTime,
}

/// A resource with `capacity` units and a FIFO admission queue.
#[derive(Debug, Clone)]
pub struct Resource {
    capacity: usize,
    held: Vec<Occupancy>,
    waiting: VecDeque<TaskId>,
}

impl Resource {
    /// Creates an idle resource. `capacity` must be positive; the driver
    /// validates it before constructing one.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            capacity,
            held: Vec::with_capacity(capacity),
            waiting: VecDeque::new(),
        }
    }

    /// Number of units.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Units not currently held.
    pub fn free_units(&self) -> usize {
        self.capacity - self.held.len()
    }

    /// Current occupancies, ordered by unit.
    pub fn held(&self) -> &[Occupancy] {
        &self.held
    }

    /// Whether a task holds a unit.
    pub fn is_held(&self, task_id: TaskId) -> bool {
        self.held.iter().any(|o| o.task_id == task_id)
    }

    /// Waiting tasks in admission order.
    pub fn waiting(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.waiting.iter().copied()
    }

    /// Number of waiting tasks.
    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    /// No unit held and nobody waiting.
    pub fn is_idle(&self) -> bool {
        self.held.is_empty() && self.waiting.is_empty()
    }

    /// Appends a task to the back of the admission queue.
    pub fn enqueue(&mut self, task_id: TaskId) {
        debug_assert!(!self.is_held(task_id));
        debug_assert!(!self.waiting.contains(&task_id));
        self.waiting.push_back(task_id);
    }

    /// Grants a free unit to a waiting task. Returns the unit index, or
    /// `None` if the task is not waiting or no unit is free.
    pub fn admit(&mut self, task_id: TaskId, since: SimTime, until: SimTime) -> Option<usize> {
        if self.free_units() == 0 {
            return None;
        }
        let pos = self.waiting.iter().position(|&id| id == task_id)?;
        self.waiting.remove(pos);

        let unit = (0..self.capacity)
            .find(|u| self.held.iter().all(|o| o.unit != *u))
            .unwrap_or(self.held.len());
        self.held.push(Occupancy {
            task_id,
            unit,
            since,
            until,
        });
        self.held.sort_by_key(|o| o.unit);
        Some(unit)
    }

    /// Releases the unit held by a task.
    pub fn release(&mut self, task_id: TaskId) -> Option<Occupancy> {
        let pos = self.held.iter().position(|o| o.task_id == task_id)?;
        Some(self.held.remove(pos))
    }

    /// Releases every hold that lapses at or before `now`, in unit order.
    pub fn release_due(&mut self, now: SimTime) -> Vec<Occupancy> {
        let (due, kept): (Vec<Occupancy>, Vec<Occupancy>) = std::mem::take(&mut self.held)
            .into_iter()
            .partition(|o| o.until <= now);
        self.held = kept;
        due
    }

    /// Earliest instant at which a current hold lapses.
    pub fn next_release(&self) -> Option<SimTime> {
        self.held.iter().map(|o| o.until).min()
    }
}
