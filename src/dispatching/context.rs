//! Decision-point context for dispatching rule evaluation.

use crate::models::SimTime;

/// Runtime state passed to dispatching rules at a decision point.
///
/// Per-task progress (remaining time, service received) is read from the
/// candidate [`TaskRun`](crate::models::TaskRun) itself; the context only
/// carries what is shared by every candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingContext {
    /// Current simulated time.
    pub current_time: SimTime,
    /// Resource units.
    pub capacity: usize,
    /// Units held when the decision point was entered.
    pub held: usize,
}

impl SchedulingContext {
    /// Creates a context at the given time for a single-unit resource.
    pub fn at_time(current_time: SimTime) -> Self {
        Self {
            current_time,
            capacity: 1,
            held: 0,
        }
    }

    /// Sets the resource capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the number of held units.
    pub fn with_held(mut self, held: usize) -> Self {
        self.held = held;
        self
    }

    /// Units available to waiting tasks without preemption.
    pub fn free_units(&self) -> usize {
        self.capacity.saturating_sub(self.held)
    }
}

impl Default for SchedulingContext {
    fn default() -> Self {
        Self::at_time(0)
    }
}
