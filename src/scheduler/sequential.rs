//! Sequential non-preemptive evaluation of a fixed task order.
//!
//! # Algorithm
//!
//! 1. Walk the tasks in the given order on a single unit.
//! 2. Each task starts at `max(unit free, arrival)` and runs to completion.
//!
//! # Complexity
//! O(n) per order.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 3: Single Machine Models

use crate::models::{SimTime, Task, TaskOutcome};

/// Runs tasks back to back in the given order, honoring arrivals as
/// earliest starts.
///
/// # Example
///
/// ```
/// use u_schedsim::models::Task;
/// use u_schedsim::scheduler::sequential;
///
/// let a = Task::new(1, 0, 5);
/// let b = Task::new(2, 8, 2);
/// let outcomes = sequential::schedule([&a, &b]);
/// assert_eq!(outcomes[0].end_time, 5);
/// assert_eq!(outcomes[1].start_time, 8); // unit idles until arrival
/// ```
pub fn schedule<'a>(order: impl IntoIterator<Item = &'a Task>) -> Vec<TaskOutcome> {
    let mut free_at: SimTime = 0;
    order
        .into_iter()
        .map(|task| {
            let start_time = free_at.max(task.arrival_time);
            let end_time = start_time + task.service_time;
            free_at = end_time;
            TaskOutcome {
                id: task.id,
                arrival_time: task.arrival_time,
                service_time: task.service_time,
                start_time,
                end_time,
            }
        })
        .collect()
}

/// Total turnaround of the order, without building outcomes.
pub fn total_turnaround<'a>(order: impl IntoIterator<Item = &'a Task>) -> SimTime {
    let mut free_at: SimTime = 0;
    let mut total: SimTime = 0;
    for task in order {
        free_at = free_at.max(task.arrival_time) + task.service_time;
        total += free_at - task.arrival_time;
    }
    total
}
