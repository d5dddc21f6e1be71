//! Schedule record (run artifact).
//!
//! A schedule record is everything one run of one discipline over one task
//! set produced: the completion order, the aggregate totals, per-task
//! timing and the raw event log. It is built once when the run drains and
//! never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{SimTime, TaskId, TaskOutcome};
use crate::dispatching::Discipline;

/// What happened at an instant of simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// The task entered the admission queue.
    Arrival,
    /// The task was granted a unit.
    Dispatch {
        /// Unit index.
        unit: usize,
    },
    /// The task was returned to the queue with work remaining.
    Preemption {
        /// Unit index.
        unit: usize,
    },
    /// The task received its last unit of service.
    Completion {
        /// Unit index.
        unit: usize,
    },
}

/// A timestamped event in the raw run log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Simulated time.
    pub time: SimTime,
    /// Task concerned.
    pub task_id: TaskId,
    /// Event type.
    pub kind: EventKind,
}

/// A contiguous execution interval of one task on one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    /// Executing task.
    pub task_id: TaskId,
    /// Unit index.
    pub unit: usize,
    /// Slice start (inclusive).
    pub start: SimTime,
    /// Slice end (exclusive).
    pub end: SimTime,
}

impl Slice {
    /// Length of the slice.
    #[inline]
    pub fn duration(&self) -> SimTime {
        self.end - self.start
    }
}

/// Aggregate timing over all tasks of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTotals {
    /// Sum of turnaround times.
    pub turnaround: SimTime,
    /// Sum of service (burst) times.
    pub burst: SimTime,
    /// Sum of waiting times.
    pub waiting: SimTime,
}

/// The immutable result of one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Discipline the run used.
    pub discipline: Discipline,
    /// Resource units.
    pub capacity: usize,
    /// Task IDs in completion order (ties by ID).
    pub order: Vec<TaskId>,
    /// Aggregate totals.
    pub totals: ScheduleTotals,
    /// Per-task timing, sorted by task ID.
    pub tasks: Vec<TaskOutcome>,
    /// Raw event log in emission order.
    pub events: Vec<Event>,
    /// Number of preemptions (including quantum expiries).
    pub preemptions: usize,
}

impl ScheduleRecord {
    /// Number of tasks in the run.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the run had no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Latest completion time; 0 for an empty run.
    pub fn makespan(&self) -> SimTime {
        self.tasks.iter().map(|t| t.end_time).max().unwrap_or(0)
    }

    /// Finds the outcome of a task.
    pub fn task(&self, task_id: TaskId) -> Option<&TaskOutcome> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Execution trace reconstructed from the event log, in start order.
    pub fn slices(&self) -> Vec<Slice> {
        let mut open: HashMap<TaskId, (SimTime, usize)> = HashMap::new();
        let mut slices = Vec::new();

        for event in &self.events {
            match event.kind {
                EventKind::Arrival => {}
                EventKind::Dispatch { unit } => {
                    open.insert(event.task_id, (event.time, unit));
                }
                EventKind::Preemption { .. } | EventKind::Completion { .. } => {
                    if let Some((start, unit)) = open.remove(&event.task_id) {
                        slices.push(Slice {
                            task_id: event.task_id,
                            unit,
                            start,
                            end: event.time,
                        });
                    }
                }
            }
        }

        slices.sort_by_key(|s| (s.start, s.unit));
        slices
    }

    /// Execution slices of one task, in start order.
    pub fn slices_for(&self, task_id: TaskId) -> Vec<Slice> {
        self.slices()
            .into_iter()
            .filter(|s| s.task_id == task_id)
            .collect()
    }

    /// Mean turnaround time; 0.0 for an empty run.
    pub fn average_turnaround(&self) -> f64 {
        if self.tasks.is_empty() {
            0.0
        } else {
            self.totals.turnaround as f64 / self.tasks.len() as f64
        }
    }

    /// Mean waiting time; 0.0 for an empty run.
    pub fn average_waiting(&self) -> f64 {
        if self.tasks.is_empty() {
            0.0
        } else {
            self.totals.waiting as f64 / self.tasks.len() as f64
        }
    }
}
