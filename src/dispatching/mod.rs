//! Dispatching rules, disciplines and the decision-point dispatcher.
//!
//! Provides priority-based dispatching rules (FIFO, SPT, LWKR, HRR), a
//! composable rule engine, the closed set of five [`Discipline`]s built
//! from them, and the [`Dispatcher`] that applies a discipline whenever
//! the simulation reaches a decision point.
//!
//! # Usage
//!
//! ```
//! use u_schedsim::dispatching::{Discipline, Dispatcher, SchedulingContext};
//!
//! let discipline: Discipline = "srtn".parse().unwrap();
//! let dispatcher = Dispatcher::new(discipline);
//! let decision = dispatcher.decide(&SchedulingContext::at_time(0), &[], &[]);
//! assert!(decision.is_noop());
//! ```
//!
//! # References
//!
//! - Silberschatz et al. (2018), "Operating System Concepts", Ch. 5
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

mod context;
mod discipline;
mod dispatcher;
mod engine;
pub mod rules;

pub use context::SchedulingContext;
pub use discipline::{Discipline, Preemption};
pub use dispatcher::{Decision, Dispatcher};
pub use engine::{RuleEngine, TieBreaker};

use crate::models::TaskRun;
use std::cmp::Ordering;
use std::fmt::Debug;

/// Score returned by a dispatching rule.
///
/// Lower scores = higher priority (dispatched first).
pub type RuleScore = f64;

/// A dispatching rule that evaluates task priority.
///
/// # Score Convention
/// **Lower score = higher priority.** Rules should return smaller values
/// for tasks that should be dispatched first.
pub trait DispatchingRule: Send + Sync + Debug {
    /// Rule name (e.g., "SPT", "FIFO").
    fn name(&self) -> &'static str;

    /// Evaluates the priority of a task at the current decision point.
    ///
    /// Returns a score where lower = higher priority.
    fn evaluate(&self, task: &TaskRun, context: &SchedulingContext) -> RuleScore;

    /// Exact ordering of two tasks, for rules whose scores lose precision
    /// as `f64`. `Less` means `a` is dispatched first.
    ///
    /// The engine uses this instead of [`evaluate`](Self::evaluate) when it
    /// returns `Some`.
    fn compare_exact(
        &self,
        _a: &TaskRun,
        _b: &TaskRun,
        _context: &SchedulingContext,
    ) -> Option<Ordering> {
        None
    }

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
