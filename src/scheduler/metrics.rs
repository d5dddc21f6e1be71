//! Run metrics.
//!
//! Aggregates per-task outcomes into the dispatch order and totals of a
//! [`ScheduleRecord`], and derives standard performance indicators.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan (C_max) | Latest completion time |
//! | Avg Turnaround | Mean of completion - arrival |
//! | Avg Waiting | Mean of turnaround - service |
//! | Max Waiting | Largest single waiting time |
//! | Throughput | Completed tasks per time unit |
//! | Utilization | Busy unit-time / (capacity × makespan) |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use serde::{Deserialize, Serialize};

use crate::models::{ScheduleRecord, ScheduleTotals, SimTime, TaskId, TaskOutcome};

/// Task IDs by completion time, ties by ID.
pub fn dispatch_order(outcomes: &[TaskOutcome]) -> Vec<TaskId> {
    let mut keyed: Vec<(SimTime, TaskId)> =
        outcomes.iter().map(|t| (t.end_time, t.id)).collect();
    keyed.sort_unstable();
    keyed.into_iter().map(|(_, id)| id).collect()
}

/// Sums turnaround, burst and waiting.
///
/// `waiting == turnaround - burst` holds exactly.
pub fn totals(outcomes: &[TaskOutcome]) -> ScheduleTotals {
    let turnaround: SimTime = outcomes.iter().map(TaskOutcome::turnaround_time).sum();
    let burst: SimTime = outcomes.iter().map(|t| t.service_time).sum();
    ScheduleTotals {
        turnaround,
        burst,
        waiting: turnaround - burst,
    }
}

/// Schedule performance indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Makespan: latest completion time.
    pub makespan: SimTime,
    /// Average turnaround time.
    pub avg_turnaround: f64,
    /// Average waiting time.
    pub avg_waiting: f64,
    /// Maximum waiting time of any single task.
    pub max_waiting: SimTime,
    /// Average response time (arrival to first dispatch).
    pub avg_response: f64,
    /// Completed tasks per unit of time.
    pub throughput: f64,
    /// Fraction of available unit-time spent serving (0.0..=1.0).
    pub utilization: f64,
}

impl ScheduleKpi {
    /// Computes KPIs from a finished run.
    pub fn calculate(record: &ScheduleRecord) -> Self {
        let n = record.task_count();
        let makespan = record.makespan();
        let max_waiting = record
            .tasks
            .iter()
            .map(TaskOutcome::waiting_time)
            .max()
            .unwrap_or(0);

        let avg_response = if n == 0 {
            0.0
        } else {
            record
                .tasks
                .iter()
                .map(|t| t.response_time() as f64)
                .sum::<f64>()
                / n as f64
        };

        let (throughput, utilization) = if makespan > 0 {
            let span = makespan as f64;
            (
                n as f64 / span,
                record.totals.burst as f64 / (record.capacity.max(1) as f64 * span),
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            makespan,
            avg_turnaround: record.average_turnaround(),
            avg_waiting: record.average_waiting(),
            max_waiting,
            avg_response,
            throughput,
            utilization,
        }
    }

    /// Whether the run meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_waiting: SimTime, min_utilization: f64) -> bool {
        self.max_waiting <= max_waiting && self.utilization >= min_utilization
    }
}
