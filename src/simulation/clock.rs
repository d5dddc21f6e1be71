//! Simulated clock with pending arrival events.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::models::{SimTime, TaskId};

/// Simulated time plus the arrivals that have not happened yet.
///
/// Pending arrivals are ordered by `(time, id)`, so tasks arriving at the
/// same instant are released in ID order.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    now: SimTime,
    pending: BinaryHeap<Reverse<(SimTime, TaskId)>>,
}

impl Clock {
    /// A clock at the epoch with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Registers a future arrival.
    pub fn schedule_arrival(&mut self, time: SimTime, task_id: TaskId) {
        self.pending.push(Reverse((time, task_id)));
    }

    /// Time of the earliest pending arrival.
    pub fn next_arrival(&self) -> Option<SimTime> {
        self.pending.peek().map(|Reverse((time, _))| *time)
    }

    /// Number of arrivals still pending.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Moves the clock forward. Time never runs backwards.
    pub fn advance_to(&mut self, time: SimTime) {
        debug_assert!(time >= self.now, "clock moved backwards: {time} < {}", self.now);
        self.now = self.now.max(time);
    }

    /// Removes and returns every arrival due at or before now.
    pub fn pop_due(&mut self) -> Vec<TaskId> {
        let mut due = Vec::new();
        while let Some(&Reverse((time, task_id))) = self.pending.peek() {
            if time > self.now {
                break;
            }
            self.pending.pop();
            due.push(task_id);
        }
        due
    }
}
