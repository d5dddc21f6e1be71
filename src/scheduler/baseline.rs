//! Brute-force optimal ordering.
//!
//! Enumerates every permutation of the task set, evaluates each with
//! [`sequential::total_turnaround`], and keeps the minimum. Ties go to the
//! permutation that is lexicographically first by task ID.
//!
//! Cost is factorial in the task count, so the solver refuses task sets
//! above its ceiling and reports [`BaselineOutcome::NotComputed`] instead.
//!
//! # Parallelism
//!
//! Permutations are partitioned by their first element across scoped
//! worker threads. Each worker explores its prefixes in lexicographic
//! order; the per-worker bests are reduced by `(total, permutation)`, so
//! the result does not depend on the worker count.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::sequential;
use crate::models::{SimTime, Task, TaskId};

/// Default task-count ceiling.
pub const DEFAULT_MAX_TASKS: usize = 8;

/// The best ordering found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimalOrder {
    /// Task IDs in execution order.
    pub order: Vec<TaskId>,
    /// Total turnaround of the sequential run of `order`.
    pub total_turnaround: SimTime,
    /// Permutations evaluated.
    pub evaluated: u64,
}

/// Why the baseline was not computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// More tasks than the configured ceiling.
    ExceedsCeiling {
        /// Tasks in the set.
        task_count: usize,
        /// Configured ceiling.
        ceiling: usize,
    },
    /// Sequential evaluation models a single unit only.
    MultiUnitResource {
        /// Resource units.
        capacity: usize,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExceedsCeiling {
                task_count,
                ceiling,
            } => write!(f, "not computed: {task_count} tasks exceeds ceiling of {ceiling}"),
            Self::MultiUnitResource { capacity } => {
                write!(f, "not computed: resource has {capacity} units")
            }
        }
    }
}

/// Result of a baseline search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaselineOutcome {
    /// Search completed.
    Optimal(OptimalOrder),
    /// Search refused.
    NotComputed(SkipReason),
}

impl BaselineOutcome {
    /// The optimal ordering, if computed.
    pub fn optimal(&self) -> Option<&OptimalOrder> {
        match self {
            Self::Optimal(best) => Some(best),
            Self::NotComputed(_) => None,
        }
    }

    /// Whether the search ran.
    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Optimal(_))
    }
}

/// Exhaustive search for the minimum-turnaround ordering.
///
/// # Example
/// ```
/// use u_schedsim::models::{Task, TaskId};
/// use u_schedsim::scheduler::BaselineSolver;
///
/// let tasks = vec![Task::new(1, 0, 5), Task::new(2, 0, 2), Task::new(3, 0, 8)];
/// let outcome = BaselineSolver::default().solve(&tasks);
/// let best = outcome.optimal().unwrap();
/// assert_eq!(best.order, vec![TaskId(2), TaskId(1), TaskId(3)]);
/// assert_eq!(best.total_turnaround, 24);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaselineSolver {
    max_tasks: usize,
    workers: usize,
}

impl BaselineSolver {
    /// Solver refusing task sets larger than `max_tasks`.
    pub fn new(max_tasks: usize) -> Self {
        Self {
            max_tasks,
            workers: 1,
        }
    }

    /// Sets the number of worker threads (at least 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Task-count ceiling.
    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }

    /// Worker threads.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Searches for the optimal single-unit ordering.
    pub fn solve(&self, tasks: &[Task]) -> BaselineOutcome {
        if tasks.len() > self.max_tasks {
            warn!(
                task_count = tasks.len(),
                ceiling = self.max_tasks,
                "baseline search refused above ceiling"
            );
            return BaselineOutcome::NotComputed(SkipReason::ExceedsCeiling {
                task_count: tasks.len(),
                ceiling: self.max_tasks,
            });
        }

        let mut sorted: Vec<&Task> = tasks.iter().collect();
        sorted.sort_by_key(|t| t.id);

        let best = self.search(&sorted);
        debug!(
            total_turnaround = best.total,
            evaluated = best.evaluated,
            "baseline search complete"
        );
        BaselineOutcome::Optimal(OptimalOrder {
            order: best.perm.iter().map(|&i| sorted[i].id).collect(),
            total_turnaround: best.total,
            evaluated: best.evaluated,
        })
    }

    /// Like [`solve`](Self::solve), but refuses multi-unit resources.
    pub fn solve_for_capacity(&self, tasks: &[Task], capacity: usize) -> BaselineOutcome {
        if capacity > 1 {
            return BaselineOutcome::NotComputed(SkipReason::MultiUnitResource { capacity });
        }
        self.solve(tasks)
    }

    fn search(&self, sorted: &[&Task]) -> Best {
        let n = sorted.len();
        if n == 0 {
            return Best {
                perm: Vec::new(),
                total: 0,
                evaluated: 1,
            };
        }

        let workers = self.workers.min(n);
        if workers == 1 {
            return search_prefixes(sorted, 0..n);
        }

        let partials: Vec<Best> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|w| scope.spawn(move || search_prefixes(sorted, (w..n).step_by(workers))))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        });

        let evaluated = partials.iter().map(|b| b.evaluated).sum();
        let mut best = partials
            .into_iter()
            .min_by(|a, b| (a.total, &a.perm).cmp(&(b.total, &b.perm)))
            .unwrap_or_default();
        best.evaluated = evaluated;
        best
    }
}

impl Default for BaselineSolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TASKS)
    }
}

#[derive(Debug, Default)]
struct Best {
    perm: Vec<usize>,
    total: SimTime,
    evaluated: u64,
}

/// Explores every permutation starting with one of `firsts`, in
/// lexicographic order.
fn search_prefixes(sorted: &[&Task], firsts: impl Iterator<Item = usize>) -> Best {
    let n = sorted.len();
    let mut best: Option<(SimTime, Vec<usize>)> = None;
    let mut evaluated = 0u64;

    for first in firsts {
        let mut perm: Vec<usize> = std::iter::once(first)
            .chain((0..n).filter(|&i| i != first))
            .collect();
        loop {
            let total = sequential::total_turnaround(perm.iter().map(|&i| sorted[i]));
            evaluated += 1;
            if best.as_ref().map_or(true, |(t, _)| total < *t) {
                best = Some((total, perm.clone()));
            }
            if !next_permutation(&mut perm[1..]) {
                break;
            }
        }
    }

    let (total, perm) = best.unwrap_or_default();
    Best {
        perm,
        total,
        evaluated,
    }
}

/// Rearranges into the next lexicographic permutation. Returns `false`
/// (leaving the slice untouched) when already at the last one.
fn next_permutation(p: &mut [usize]) -> bool {
    if p.len() < 2 {
        return false;
    }
    let mut i = p.len() - 1;
    while i > 0 && p[i - 1] >= p[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = p.len() - 1;
    while p[j] <= p[i - 1] {
        j -= 1;
    }
    p.swap(i - 1, j);
    p[i..].reverse();
    true
}
