//! Task model.
//!
//! A task is one unit of work contending for the shared resource. The
//! immutable part ([`Task`]) is created by the workload generator; the
//! mutable part ([`TaskRun`]) is rebuilt from it for every run and owned
//! exclusively by the simulation driver.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulated time, in abstract integer units relative to the epoch (t=0).
pub type SimTime = i64;

/// Stable task identifier. Assigned at creation, never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(pub u32);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TaskId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A task to be simulated.
///
/// `arrival_time` and `service_time` are fixed at creation; runtime
/// progress lives in [`TaskRun`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Instant the task enters the system.
    pub arrival_time: SimTime,
    /// Total processing the task requires ("burst time").
    pub service_time: SimTime,
}

impl Task {
    /// Creates a task.
    pub fn new(id: u32, arrival_time: SimTime, service_time: SimTime) -> Self {
        Self {
            id: TaskId(id),
            arrival_time,
            service_time,
        }
    }
}

/// Lifecycle state of a task within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// Arrival time not reached yet.
    Unarrived,
    /// Arrived and queued for the resource.
    Waiting,
    /// Holding a unit of the resource.
    Running,
    /// All service received.
    Completed,
}

/// Runtime state of one task during one run.
///
/// Transitions are driven only by the simulation driver:
/// `Unarrived → Waiting ⇄ Running → Completed`.
#[derive(Debug, Clone)]
pub struct TaskRun {
    task: Task,
    remaining_time: SimTime,
    start_time: Option<SimTime>,
    end_time: Option<SimTime>,
    state: TaskState,
}

impl TaskRun {
    /// Fresh runtime state for a task: nothing served, not arrived.
    pub fn new(task: &Task) -> Self {
        Self {
            task: task.clone(),
            remaining_time: task.service_time,
            start_time: None,
            end_time: None,
            state: TaskState::Unarrived,
        }
    }

    /// The immutable task definition.
    pub fn task(&self) -> &Task {
        &self.task
    }

    /// Task identifier.
    pub fn id(&self) -> TaskId {
        self.task.id
    }

    /// Arrival time.
    pub fn arrival_time(&self) -> SimTime {
        self.task.arrival_time
    }

    /// Total service requirement.
    pub fn service_time(&self) -> SimTime {
        self.task.service_time
    }

    /// Service still owed.
    pub fn remaining_time(&self) -> SimTime {
        self.remaining_time
    }

    /// First instant the task held the resource.
    pub fn start_time(&self) -> Option<SimTime> {
        self.start_time
    }

    /// Completion instant.
    pub fn end_time(&self) -> Option<SimTime> {
        self.end_time
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Service already received.
    pub fn served_time(&self) -> SimTime {
        self.task.service_time - self.remaining_time
    }

    /// Time spent queued so far at `now` (excludes service received).
    pub fn waiting_so_far(&self, now: SimTime) -> SimTime {
        now - self.task.arrival_time - self.served_time()
    }

    pub(crate) fn arrive(&mut self) {
        debug_assert_eq!(self.state, TaskState::Unarrived);
        self.state = TaskState::Waiting;
    }

    pub(crate) fn dispatch(&mut self, now: SimTime) {
        debug_assert_eq!(self.state, TaskState::Waiting);
        debug_assert!(now >= self.task.arrival_time);
        self.start_time.get_or_insert(now);
        self.state = TaskState::Running;
    }

    /// Consumes `elapsed` units of service. Floors at zero.
    pub(crate) fn serve(&mut self, elapsed: SimTime) {
        debug_assert_eq!(self.state, TaskState::Running);
        self.remaining_time = (self.remaining_time - elapsed).max(0);
    }

    pub(crate) fn preempt(&mut self) {
        debug_assert_eq!(self.state, TaskState::Running);
        debug_assert!(self.remaining_time > 0);
        self.state = TaskState::Waiting;
    }

    pub(crate) fn complete(&mut self, now: SimTime) {
        debug_assert_eq!(self.remaining_time, 0);
        debug_assert!(self.end_time.is_none());
        self.end_time = Some(now);
        self.state = TaskState::Completed;
    }

    /// Final timing of a completed task; `None` until completion.
    pub fn outcome(&self) -> Option<TaskOutcome> {
        let start_time = self.start_time?;
        let end_time = self.end_time?;
        Some(TaskOutcome {
            id: self.task.id,
            arrival_time: self.task.arrival_time,
            service_time: self.task.service_time,
            start_time,
            end_time,
        })
    }
}

/// Per-task timing of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// Task identifier.
    pub id: TaskId,
    /// Arrival time.
    pub arrival_time: SimTime,
    /// Service requirement (burst).
    pub service_time: SimTime,
    /// First dispatch.
    pub start_time: SimTime,
    /// Completion.
    pub end_time: SimTime,
}

impl TaskOutcome {
    /// Elapsed time from arrival to completion.
    #[inline]
    pub fn turnaround_time(&self) -> SimTime {
        self.end_time - self.arrival_time
    }

    /// Turnaround minus burst.
    #[inline]
    pub fn waiting_time(&self) -> SimTime {
        self.turnaround_time() - self.service_time
    }

    /// Delay between arrival and first dispatch.
    #[inline]
    pub fn response_time(&self) -> SimTime {
        self.start_time - self.arrival_time
    }
}
