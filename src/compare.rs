//! Discipline comparison against the optimal baseline.
//!
//! A [`Comparison`] runs several disciplines on one task set and joins
//! their records with the [`BaselineOutcome`]. An [`Experiment`] repeats
//! that over freshly generated task sets and tallies how often each
//! discipline reproduced the optimal order.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dispatching::Discipline;
use crate::error::Result;
use crate::models::{ScheduleRecord, ScheduleTotals, SimTime, Task, TaskId};
use crate::scheduler::{BaselineOutcome, BaselineSolver};
use crate::simulation::Simulator;
use crate::workload::WorkloadGenerator;

/// Every requested discipline run on the same task set, plus the baseline.
///
/// # Example
/// ```
/// use u_schedsim::compare::Comparison;
/// use u_schedsim::dispatching::Discipline;
/// use u_schedsim::models::Task;
/// use u_schedsim::scheduler::BaselineSolver;
///
/// let tasks = vec![Task::new(1, 0, 5), Task::new(2, 0, 2), Task::new(3, 0, 8)];
/// let disciplines = Discipline::all(3).unwrap();
/// let cmp = Comparison::run(&tasks, &disciplines, 1, &BaselineSolver::default()).unwrap();
///
/// assert_eq!(cmp.matches_optimal(Discipline::Sjf), Some(true));
/// assert_eq!(cmp.matches_optimal(Discipline::Fcfs), Some(false));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    /// One record per requested discipline, in request order.
    pub records: Vec<ScheduleRecord>,
    /// Optimal ordering, or why it was skipped.
    pub baseline: BaselineOutcome,
}

/// Reporting view of one discipline within a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySummary {
    /// Discipline.
    pub discipline: Discipline,
    /// Completion order.
    pub order: Vec<TaskId>,
    /// Aggregate totals.
    pub totals: ScheduleTotals,
    /// Exact sequence equality with the optimal order.
    pub matches_optimal: Option<bool>,
    /// Positions agreeing with the optimal order.
    pub positional_matches: Option<usize>,
}

impl Comparison {
    /// Runs each discipline on its own scoped thread and solves the
    /// baseline on the caller's thread.
    pub fn run(
        tasks: &[Task],
        disciplines: &[Discipline],
        capacity: usize,
        solver: &BaselineSolver,
    ) -> Result<Self> {
        let records = std::thread::scope(|scope| {
            let handles: Vec<_> = disciplines
                .iter()
                .map(|&d| scope.spawn(move || Simulator::new(d).with_capacity(capacity).run(tasks)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect::<Result<Vec<_>>>()
        })?;
        Ok(Self {
            records,
            baseline: solver.solve_for_capacity(tasks, capacity),
        })
    }

    /// Same as [`run`](Self::run) without spawning threads.
    pub fn run_sequential(
        tasks: &[Task],
        disciplines: &[Discipline],
        capacity: usize,
        solver: &BaselineSolver,
    ) -> Result<Self> {
        let records = disciplines
            .iter()
            .map(|&d| Simulator::new(d).with_capacity(capacity).run(tasks))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            records,
            baseline: solver.solve_for_capacity(tasks, capacity),
        })
    }

    /// Record of a discipline.
    pub fn record(&self, discipline: Discipline) -> Option<&ScheduleRecord> {
        self.records.iter().find(|r| r.discipline == discipline)
    }

    /// Whether the discipline's completion order equals the optimal order.
    /// `None` if either side is missing.
    pub fn matches_optimal(&self, discipline: Discipline) -> Option<bool> {
        self.order_matches(self.record(discipline)?)
    }

    /// Positions at which the discipline's order agrees with the optimal one.
    pub fn positional_matches(&self, discipline: Discipline) -> Option<usize> {
        self.order_positions(self.record(discipline)?)
    }

    fn order_matches(&self, record: &ScheduleRecord) -> Option<bool> {
        let optimal = self.baseline.optimal()?;
        Some(record.order == optimal.order)
    }

    fn order_positions(&self, record: &ScheduleRecord) -> Option<usize> {
        let optimal = self.baseline.optimal()?;
        Some(
            record
                .order
                .iter()
                .zip(&optimal.order)
                .filter(|(a, b)| a == b)
                .count(),
        )
    }

    /// Record with the lowest total turnaround; ties keep request order.
    pub fn best_by_turnaround(&self) -> Option<&ScheduleRecord> {
        self.records
            .iter()
            .enumerate()
            .min_by_key(|(i, r)| (r.totals.turnaround, *i))
            .map(|(_, r)| r)
    }

    /// One summary per record, in request order.
    pub fn summaries(&self) -> Vec<PolicySummary> {
        self.records
            .iter()
            .map(|r| PolicySummary {
                discipline: r.discipline,
                order: r.order.clone(),
                totals: r.totals,
                matches_optimal: self.order_matches(r),
                positional_matches: self.order_positions(r),
            })
            .collect()
    }
}

/// Per-discipline tally over a trial experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisciplineTally {
    /// Discipline.
    pub discipline: Discipline,
    /// Trials in which the completion order equalled the optimal order.
    pub optimal_matches: usize,
    /// Sum of positional matches over computed trials.
    pub positional_matches: usize,
    /// Sum of total turnaround over all trials.
    pub total_turnaround: SimTime,
    /// Sum of total waiting over all trials.
    pub total_waiting: SimTime,
}

/// Outcome of a trial experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSummary {
    /// Trials run.
    pub trials: usize,
    /// Trials in which the baseline was computed.
    pub computed_trials: usize,
    /// One tally per discipline, in request order.
    pub tallies: Vec<DisciplineTally>,
    /// Most optimal matches, then lowest summed turnaround, then request
    /// order. `None` when no trial ran.
    pub best: Option<Discipline>,
}

impl TrialSummary {
    /// Tally of a discipline.
    pub fn tally(&self, discipline: Discipline) -> Option<&DisciplineTally> {
        self.tallies.iter().find(|t| t.discipline == discipline)
    }
}

/// Repeated comparisons over freshly generated workloads.
#[derive(Debug, Clone)]
pub struct Experiment {
    generator: WorkloadGenerator,
    disciplines: Vec<Discipline>,
    capacity: usize,
    solver: BaselineSolver,
    workers: usize,
}

impl Experiment {
    /// Experiment over single-unit runs with the default baseline ceiling.
    /// Repeated disciplines keep their first position only.
    pub fn new(generator: WorkloadGenerator, mut disciplines: Vec<Discipline>) -> Self {
        let mut seen = Vec::with_capacity(disciplines.len());
        disciplines.retain(|d| {
            let first = !seen.contains(d);
            seen.push(*d);
            first
        });
        Self {
            generator,
            disciplines,
            capacity: 1,
            solver: BaselineSolver::default(),
            workers: 1,
        }
    }

    /// Sets the resource capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the baseline solver.
    pub fn with_solver(mut self, solver: BaselineSolver) -> Self {
        self.solver = solver;
        self
    }

    /// Sets the number of worker threads trials are spread over.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Runs `trials` comparisons. Trial `i` draws its task set from seed
    /// `seed + i`, so the result does not depend on the worker count.
    pub fn run(&self, trials: usize, seed: u64) -> Result<TrialSummary> {
        let workers = self.workers.min(trials.max(1));
        let partials: Vec<Result<Vec<Comparison>>> = if workers == 1 {
            vec![self.run_shard(0, 1, trials, seed)]
        } else {
            std::thread::scope(|scope| {
                let handles: Vec<_> = (0..workers)
                    .map(|w| scope.spawn(move || self.run_shard(w, workers, trials, seed)))
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                    .collect()
            })
        };

        let mut tallies: Vec<DisciplineTally> = self
            .disciplines
            .iter()
            .map(|&discipline| DisciplineTally {
                discipline,
                optimal_matches: 0,
                positional_matches: 0,
                total_turnaround: 0,
                total_waiting: 0,
            })
            .collect();
        let mut computed_trials = 0;

        for comparison in partials.into_iter().collect::<Result<Vec<_>>>()?.iter().flatten() {
            if comparison.baseline.is_computed() {
                computed_trials += 1;
            }
            for (tally, record) in tallies.iter_mut().zip(&comparison.records) {
                tally.total_turnaround += record.totals.turnaround;
                tally.total_waiting += record.totals.waiting;
                if comparison.order_matches(record) == Some(true) {
                    tally.optimal_matches += 1;
                }
                tally.positional_matches += comparison.order_positions(record).unwrap_or(0);
            }
        }

        let best = if trials == 0 {
            None
        } else {
            tallies
                .iter()
                .enumerate()
                .min_by_key(|(i, t)| (std::cmp::Reverse(t.optimal_matches), t.total_turnaround, *i))
                .map(|(_, t)| t.discipline)
        };

        info!(
            trials,
            computed_trials,
            best = ?best,
            "trial experiment complete"
        );
        Ok(TrialSummary {
            trials,
            computed_trials,
            tallies,
            best,
        })
    }

    fn run_shard(
        &self,
        worker: usize,
        workers: usize,
        trials: usize,
        seed: u64,
    ) -> Result<Vec<Comparison>> {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        (worker..trials)
            .step_by(workers)
            .map(|trial| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(trial as u64));
                let tasks = self.generator.generate(&mut rng);
                Comparison::run_sequential(&tasks, &self.disciplines, self.capacity, &self.solver)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::scheduler::SkipReason;
    use crate::workload::{ArrivalModel, WorkloadParams};

    fn simultaneous(services: &[i64]) -> Vec<Task> {
        services
            .iter()
            .enumerate()
            .map(|(i, &s)| Task::new(i as u32 + 1, 0, s))
            .collect()
    }

    #[test]
    fn test_simultaneous_scenario() {
        let tasks = simultaneous(&[5, 2, 8]);
        let disciplines = Discipline::all(3).unwrap();
        let cmp = Comparison::run(&tasks, &disciplines, 1, &BaselineSolver::default()).unwrap();

        let optimal = cmp.baseline.optimal().unwrap();
        assert_eq!(optimal.order, vec![TaskId(2), TaskId(1), TaskId(3)]);
        assert_eq!(optimal.total_turnaround, 24);

        let fcfs = cmp.record(Discipline::Fcfs).unwrap();
        assert_eq!(fcfs.order, vec![TaskId(1), TaskId(2), TaskId(3)]);
        assert_eq!(fcfs.totals.turnaround, 27);
        assert_eq!(cmp.matches_optimal(Discipline::Fcfs), Some(false));
        assert_eq!(cmp.positional_matches(Discipline::Fcfs), Some(1));

        let sjf = cmp.record(Discipline::Sjf).unwrap();
        assert_eq!(sjf.totals.turnaround, 24);
        assert_eq!(cmp.matches_optimal(Discipline::Sjf), Some(true));
        assert_eq!(cmp.positional_matches(Discipline::Sjf), Some(3));

        assert_eq!(cmp.best_by_turnaround().unwrap().discipline, Discipline::Sjf);
        assert_eq!(cmp.summaries().len(), 5);
    }

    #[test]
    fn test_ceiling_keeps_policy_results() {
        let tasks = simultaneous(&[4, 1, 6, 2, 3, 5, 2]);
        let disciplines = Discipline::all(2).unwrap();
        let cmp = Comparison::run(&tasks, &disciplines, 1, &BaselineSolver::new(6)).unwrap();

        assert_eq!(
            cmp.baseline,
            BaselineOutcome::NotComputed(SkipReason::ExceedsCeiling {
                task_count: 7,
                ceiling: 6
            })
        );
        assert_eq!(cmp.records.len(), 5);
        for record in &cmp.records {
            assert_eq!(record.task_count(), 7);
            assert_eq!(record.order.len(), 7);
            assert_eq!(
                record.totals.waiting,
                record.totals.turnaround - record.totals.burst
            );
            assert_eq!(cmp.matches_optimal(record.discipline), None);
        }
    }

    #[test]
    fn test_multi_unit_skips_baseline() {
        let tasks = simultaneous(&[3, 3, 3]);
        let cmp =
            Comparison::run(&tasks, &[Discipline::Fcfs], 2, &BaselineSolver::default()).unwrap();
        assert_eq!(
            cmp.baseline,
            BaselineOutcome::NotComputed(SkipReason::MultiUnitResource { capacity: 2 })
        );
        assert_eq!(cmp.record(Discipline::Fcfs).unwrap().makespan(), 6);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let tasks = vec![Task::new(1, 0, 6), Task::new(2, 2, 3), Task::new(3, 3, 1)];
        let disciplines = Discipline::all(2).unwrap();
        let solver = BaselineSolver::default();
        let a = Comparison::run(&tasks, &disciplines, 1, &solver).unwrap();
        let b = Comparison::run_sequential(&tasks, &disciplines, 1, &solver).unwrap();
        assert_eq!(a.summaries(), b.summaries());
        assert_eq!(a.baseline, b.baseline);
    }

    #[test]
    fn test_invalid_task_set_fails() {
        let tasks = vec![Task::new(1, 0, 2), Task::new(1, 0, 3)];
        let result = Comparison::run(&tasks, &[Discipline::Sjf], 1, &BaselineSolver::default());
        assert!(matches!(result, Err(SimError::InvalidTaskSet(_))));
    }

    fn experiment(workers: usize) -> Experiment {
        let params = WorkloadParams::new(4).with_arrival(ArrivalModel::Simultaneous);
        let generator = WorkloadGenerator::new(params).unwrap();
        Experiment::new(generator, Discipline::all(3).unwrap().to_vec()).with_workers(workers)
    }

    #[test]
    fn test_trials_sjf_always_optimal_when_simultaneous() {
        let summary = experiment(1).run(12, 100).unwrap();
        assert_eq!(summary.trials, 12);
        assert_eq!(summary.computed_trials, 12);
        let sjf = summary.tally(Discipline::Sjf).unwrap();
        assert_eq!(sjf.optimal_matches, 12);
        assert_eq!(sjf.positional_matches, 48);
        assert_eq!(summary.best, Some(Discipline::Sjf));
    }

    #[test]
    fn test_trials_independent_of_workers() {
        let single = experiment(1).run(9, 7).unwrap();
        let parallel = experiment(4).run(9, 7).unwrap();
        assert_eq!(single, parallel);
    }

    #[test]
    fn test_repeated_discipline_tallied_once() {
        let params = WorkloadParams::new(4).with_arrival(ArrivalModel::Simultaneous);
        let generator = WorkloadGenerator::new(params).unwrap();
        let rr = Discipline::RoundRobin { quantum: 2 };
        let summary = Experiment::new(generator, vec![Discipline::Sjf, rr, Discipline::Sjf, rr])
            .run(6, 11)
            .unwrap();
        let listed: Vec<Discipline> = summary.tallies.iter().map(|t| t.discipline).collect();
        assert_eq!(listed, vec![Discipline::Sjf, rr]);
        assert_eq!(summary.tally(Discipline::Sjf).unwrap().optimal_matches, 6);
    }

    #[test]
    fn test_summaries_follow_each_record() {
        let tasks = simultaneous(&[5, 2, 8]);
        let disciplines = [Discipline::Fcfs, Discipline::Sjf, Discipline::Fcfs];
        let cmp = Comparison::run(&tasks, &disciplines, 1, &BaselineSolver::default()).unwrap();
        let flags: Vec<Option<bool>> = cmp.summaries().iter().map(|s| s.matches_optimal).collect();
        assert_eq!(flags, vec![Some(false), Some(true), Some(false)]);
    }

    #[test]
    fn test_zero_trials() {
        let summary = experiment(2).run(0, 1).unwrap();
        assert_eq!(summary.computed_trials, 0);
        assert!(summary.best.is_none());
        assert!(summary.tallies.iter().all(|t| t.optimal_matches == 0));
    }
}
