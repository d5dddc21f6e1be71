//! Run metrics and the optimal ordering baseline.
//!
//! # Metrics
//!
//! [`metrics`] turns per-task outcomes into the dispatch order and totals
//! of a run; `ScheduleKpi` computes standard indicators: makespan,
//! turnaround, waiting, throughput and utilization.
//!
//! # Baseline
//!
//! `BaselineSolver` enumerates every ordering of a small task set and
//! evaluates each with [`sequential`] non-preemptive execution. It is
//! exact, but factorial, so it is gated by a task-count ceiling.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3
//! - Smith (1956), "Various optimizers for single-stage production"

mod baseline;
pub mod metrics;
pub mod sequential;

pub use baseline::{BaselineOutcome, BaselineSolver, OptimalOrder, SkipReason, DEFAULT_MAX_TASKS};
pub use metrics::ScheduleKpi;
