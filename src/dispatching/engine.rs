//! Rule engine for multi-criteria dispatching.
//!
//! Composes dispatching rules in sequence: later rules only break ties
//! left by earlier ones, and a final strategy settles anything still tied.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::cmp::Ordering;
use std::sync::Arc;

use super::{DispatchingRule, SchedulingContext};
use crate::models::TaskRun;

/// How ties are broken after all rules are exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieBreaker {
    /// Leave tied tasks in input order (stable sort).
    #[default]
    InputOrder,
    /// Deterministic by task ID (ascending).
    ById,
}

/// A composable rule engine for task prioritization.
///
/// # Example
/// ```
/// use u_schedsim::dispatching::{rules, RuleEngine, SchedulingContext, TieBreaker};
/// use u_schedsim::models::{Task, TaskRun};
///
/// let engine = RuleEngine::new()
///     .with_rule(rules::Spt)
///     .with_rule(rules::Fifo)
///     .with_final_tie_breaker(TieBreaker::ById);
///
/// let runs = [
///     TaskRun::new(&Task::new(1, 0, 5)),
///     TaskRun::new(&Task::new(2, 0, 2)),
/// ];
/// let candidates: Vec<&TaskRun> = runs.iter().collect();
/// let best = engine.select_best(&candidates, &SchedulingContext::at_time(0));
/// assert_eq!(best, Some(1));
/// ```
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<Arc<dyn DispatchingRule>>,
    tie_breaker: TieBreaker,
    epsilon: f64,
}

impl RuleEngine {
    /// Creates an empty rule engine.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            tie_breaker: TieBreaker::InputOrder,
            epsilon: 1e-9,
        }
    }

    /// Appends a rule. The first rule is primary; each later rule only
    /// decides between tasks the earlier rules scored equally.
    pub fn with_rule<R: DispatchingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Sets the final tie-breaking strategy.
    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Names of the configured rules, primary first.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Sorts candidates by priority (highest priority first).
    ///
    /// Returns indices into the candidate slice.
    pub fn sort_indices(&self, tasks: &[&TaskRun], context: &SchedulingContext) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..tasks.len()).collect();
        indices.sort_by(|&a, &b| self.compare(tasks[a], tasks[b], context));
        indices
    }

    /// Returns the index of the highest-priority candidate.
    pub fn select_best(&self, tasks: &[&TaskRun], context: &SchedulingContext) -> Option<usize> {
        (0..tasks.len()).min_by(|&a, &b| {
            self.compare(tasks[a], tasks[b], context)
                .then(a.cmp(&b))
        })
    }

    /// Compares two candidates: `Less` means `a` is dispatched first.
    pub fn compare(&self, a: &TaskRun, b: &TaskRun, context: &SchedulingContext) -> Ordering {
        for rule in &self.rules {
            if let Some(ordering) = rule.compare_exact(a, b, context) {
                if ordering != Ordering::Equal {
                    return ordering;
                }
                continue;
            }

            let score_a = rule.evaluate(a, context);
            let score_b = rule.evaluate(b, context);

            if (score_a - score_b).abs() > self.epsilon {
                return score_a.partial_cmp(&score_b).unwrap_or(Ordering::Equal);
            }
        }

        // All rules tied → use final tie-breaker
        match self.tie_breaker {
            TieBreaker::InputOrder => Ordering::Equal,
            TieBreaker::ById => a.id().cmp(&b.id()),
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rule_names())
            .field("tie_breaker", &self.tie_breaker)
            .finish()
    }
}
