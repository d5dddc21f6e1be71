//! Built-in dispatching rules.
//!
//! # Categories
//!
//! - **Arrival-based**: FIFO
//! - **Time-based**: SPT, LWKR
//! - **Ratio-based**: HRR
//!
//! # Score Convention
//! All rules return lower scores for higher priority tasks.
//!
//! # References
//! - Silberschatz et al. (2018), "Operating System Concepts", Ch. 5
//! - Brinch Hansen (1971), "Short-term scheduling in multiprogramming systems"

use std::cmp::Ordering;

use super::{DispatchingRule, RuleScore, SchedulingContext};
use crate::models::TaskRun;

// ======================== Arrival-based rules ========================

/// First In First Out.
///
/// Prioritizes tasks by arrival time.
#[derive(Debug, Clone, Copy)]
pub struct Fifo;

impl DispatchingRule for Fifo {
    fn name(&self) -> &'static str {
        "FIFO"
    }

    fn evaluate(&self, task: &TaskRun, _context: &SchedulingContext) -> RuleScore {
        task.arrival_time() as f64
    }

    fn description(&self) -> &'static str {
        "First In First Out"
    }
}

// ======================== Time-based rules ========================

/// Shortest Processing Time.
///
/// Prioritizes tasks with shorter total service time, regardless of how
/// much of it has already been received.
///
/// # Reference
/// Smith (1956), optimal for minimizing mean flow time on single machine.
#[derive(Debug, Clone, Copy)]
pub struct Spt;

impl DispatchingRule for Spt {
    fn name(&self) -> &'static str {
        "SPT"
    }

    fn evaluate(&self, task: &TaskRun, _context: &SchedulingContext) -> RuleScore {
        task.service_time() as f64
    }

    fn description(&self) -> &'static str {
        "Shortest Processing Time"
    }
}

/// Least Work Remaining.
///
/// Prioritizes tasks closest to completion. Preemptive use of this rule
/// gives shortest-remaining-time-next.
///
/// # Reference
/// Schrage (1968), SRPT minimizes mean flow time with preemption.
#[derive(Debug, Clone, Copy)]
pub struct Lwkr;

impl DispatchingRule for Lwkr {
    fn name(&self) -> &'static str {
        "LWKR"
    }

    fn evaluate(&self, task: &TaskRun, _context: &SchedulingContext) -> RuleScore {
        task.remaining_time() as f64
    }

    fn description(&self) -> &'static str {
        "Least Work Remaining"
    }
}

// ======================== Ratio-based rules ========================

/// Highest Response Ratio.
///
/// Ratio = (waiting so far + remaining) / remaining, at the current time.
/// Long-waiting tasks age toward the front, so short tasks are favoured
/// without starving long ones.
///
/// # Reference
/// Brinch Hansen (1971), "Short-term scheduling in multiprogramming systems"
#[derive(Debug, Clone, Copy)]
pub struct Hrr;

impl DispatchingRule for Hrr {
    fn name(&self) -> &'static str {
        "HRR"
    }

    fn evaluate(&self, task: &TaskRun, context: &SchedulingContext) -> RuleScore {
        -response_ratio(task, context) // Higher ratio = higher priority → negate
    }

    fn compare_exact(
        &self,
        a: &TaskRun,
        b: &TaskRun,
        context: &SchedulingContext,
    ) -> Option<Ordering> {
        let ordering = match (ratio_terms(a, context), ratio_terms(b, context)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            // n_a / d_a > n_b / d_b  <=>  n_a * d_b > n_b * d_a
            (Some((n_a, d_a)), Some((n_b, d_b))) => (n_b * d_a).cmp(&(n_a * d_b)),
        };
        Some(ordering)
    }

    fn description(&self) -> &'static str {
        "Highest Response Ratio"
    }
}

/// Response ratio of a task at the context's current time.
///
/// Returns `f64::MAX` for a task with nothing left to run.
pub fn response_ratio(task: &TaskRun, context: &SchedulingContext) -> f64 {
    let remaining = task.remaining_time();
    if remaining <= 0 {
        return f64::MAX;
    }
    let waited = task.waiting_so_far(context.current_time).max(0);
    (waited + remaining) as f64 / remaining as f64
}

/// Numerator and denominator of the response ratio, or `None` when the
/// ratio is unbounded.
fn ratio_terms(task: &TaskRun, context: &SchedulingContext) -> Option<(i128, i128)> {
    let remaining = i128::from(task.remaining_time());
    if remaining <= 0 {
        return None;
    }
    let waited = i128::from(task.waiting_so_far(context.current_time).max(0));
    Some((waited + remaining, remaining))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    fn make_run(id: u32, arrival: i64, service: i64) -> TaskRun {
        TaskRun::new(&Task::new(id, arrival, service))
    }

    #[test]
    fn test_fifo() {
        let ctx = SchedulingContext::at_time(10);
        let early = make_run(2, 1, 9);
        let late = make_run(1, 4, 1);
        assert!(Fifo.evaluate(&early, &ctx) < Fifo.evaluate(&late, &ctx));
    }

    #[test]
    fn test_spt() {
        let ctx = SchedulingContext::at_time(0);
        let short = make_run(1, 0, 2);
        let long = make_run(2, 0, 8);
        assert!(Spt.evaluate(&short, &ctx) < Spt.evaluate(&long, &ctx));
    }

    #[test]
    fn test_lwkr_tracks_progress() {
        let ctx = SchedulingContext::at_time(6);
        let mut started = make_run(1, 0, 10);
        started.arrive();
        started.dispatch(0);
        started.serve(6); // 4 left
        let fresh = make_run(2, 5, 5);
        assert!(Lwkr.evaluate(&started, &ctx) < Lwkr.evaluate(&fresh, &ctx));
        // SPT ignores progress
        assert!(Spt.evaluate(&fresh, &ctx) < Spt.evaluate(&started, &ctx));
    }

    #[test]
    fn test_response_ratio() {
        let ctx = SchedulingContext::at_time(10);
        // waited 6, remaining 3 → (6+3)/3 = 3.0
        let t = make_run(1, 4, 3);
        assert!((response_ratio(&t, &ctx) - 3.0).abs() < 1e-10);
        // not waited at all → 1.0
        let fresh = make_run(2, 10, 7);
        assert!((response_ratio(&fresh, &ctx) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_hrr_prefers_aged_task() {
        let ctx = SchedulingContext::at_time(20);
        let aged_long = make_run(1, 0, 10); // (20+10)/10 = 3.0
        let new_short = make_run(2, 18, 2); // (2+2)/2 = 2.0
        assert!(Hrr.evaluate(&aged_long, &ctx) < Hrr.evaluate(&new_short, &ctx));
    }

    #[test]
    fn test_hrr_exact_for_close_ratios() {
        let ctx = SchedulingContext::at_time(10);
        let longer = make_run(2, 9, 100_001); // 100_002 / 100_001
        let shorter = make_run(3, 9, 100_000); // 100_001 / 100_000, slightly higher
        assert_eq!(
            Hrr.compare_exact(&shorter, &longer, &ctx),
            Some(Ordering::Less)
        );
        assert_eq!(
            Hrr.compare_exact(&longer, &shorter, &ctx),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Hrr.compare_exact(&longer, &longer, &ctx),
            Some(Ordering::Equal)
        );
    }
}
