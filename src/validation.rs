//! Input validation for task sets.
//!
//! Checks structural integrity of caller-supplied tasks before a run
//! starts. Detects:
//! - Duplicate IDs
//! - Non-positive service times
//! - Negative arrival times
//! - Task sets whose time horizon overflows `SimTime`
//!
//! Generated workloads always pass; these checks guard hand-built task
//! lists so that no partial schedule is ever produced.

use std::collections::HashSet;
use std::fmt;

use crate::models::{SimTime, Task};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two tasks share the same ID.
    DuplicateId,
    /// A task requires zero or negative processing.
    NonPositiveServiceTime,
    /// A task arrives before the simulation epoch.
    NegativeArrivalTime,
    /// Latest arrival plus total service, or the sum of turnarounds it
    /// bounds, does not fit in `SimTime`.
    TimeOverflow,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates a task set.
///
/// Checks:
/// 1. No duplicate task IDs
/// 2. Every service time is positive
/// 3. Every arrival time is non-negative
/// 4. The time horizon (latest arrival plus total service) and the
///    worst-case turnaround sum fit in `SimTime`
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_tasks(tasks: &[Task]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut task_ids = HashSet::new();

    for task in tasks {
        if !task_ids.insert(task.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate task ID: {}", task.id),
            ));
        }

        if task.service_time <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveServiceTime,
                format!("Task {} has service time {}", task.id, task.service_time),
            ));
        }

        if task.arrival_time < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NegativeArrivalTime,
                format!("Task {} arrives at {}", task.id, task.arrival_time),
            ));
        }
    }

    if time_horizon(tasks).is_none() {
        errors.push(ValidationError::new(
            ValidationErrorKind::TimeOverflow,
            format!("Time horizon of {} tasks overflows simulated time", tasks.len()),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Bound on every time a run can reach, scaled by the task count so that
/// turnaround totals stay in range too. `None` on overflow.
fn time_horizon(tasks: &[Task]) -> Option<SimTime> {
    let latest_arrival = tasks.iter().map(|t| t.arrival_time.max(0)).max().unwrap_or(0);
    let horizon = tasks
        .iter()
        .try_fold(latest_arrival, |acc, t| acc.checked_add(t.service_time.max(0)))?;
    let count = SimTime::try_from(tasks.len()).ok()?;
    horizon.checked_mul(count.max(1))
}
