//! Scenario configuration.
//!
//! [`ScenarioConfig`] is the serde-facing input surface; every field has a
//! default, so an empty document is a valid configuration.
//! [`ScenarioConfig::resolve`] validates it into a ready-to-run
//! [`Scenario`].
//!
//! ```
//! use u_schedsim::config::ScenarioConfig;
//!
//! let config: ScenarioConfig = serde_json::from_str(r#"{
//!     "workload": { "task_count": 4, "arrival": { "kind": "simultaneous" } },
//!     "policies": ["fcfs", "sjf", "rr"],
//!     "quantum": 2
//! }"#).unwrap();
//! let scenario = config.resolve().unwrap();
//! let comparison = scenario.run_seeded(1).unwrap();
//! assert_eq!(comparison.records.len(), 3);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::compare::{Comparison, Experiment, TrialSummary};
use crate::dispatching::Discipline;
use crate::error::{Result, SimError};
use crate::models::{SimTime, Task};
use crate::scheduler::{BaselineSolver, DEFAULT_MAX_TASKS};
use crate::workload::{WorkloadGenerator, WorkloadParams};

/// Input parameters of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Workload generation parameters.
    pub workload: WorkloadParams,
    /// Round-robin slice for policies given as a bare `rr`.
    pub quantum: SimTime,
    /// Policy names, e.g. `"fcfs"`, `"srtn"`, `"rr:4"`.
    pub policies: Vec<String>,
    /// Resource units.
    pub capacity: usize,
    /// Largest task set the baseline searches.
    pub baseline_max_tasks: usize,
    /// Worker threads for the baseline search and trial experiments.
    pub workers: usize,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            workload: WorkloadParams::default(),
            quantum: 3,
            policies: ["fcfs", "sjf", "srtn", "hrrn", "rr"]
                .into_iter()
                .map(String::from)
                .collect(),
            capacity: 1,
            baseline_max_tasks: DEFAULT_MAX_TASKS,
            workers: 1,
        }
    }
}

impl ScenarioConfig {
    /// Sets the workload parameters.
    pub fn with_workload(mut self, workload: WorkloadParams) -> Self {
        self.workload = workload;
        self
    }

    /// Sets the policy list.
    pub fn with_policies<S: Into<String>>(mut self, policies: impl IntoIterator<Item = S>) -> Self {
        self.policies = policies.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the default round-robin quantum.
    pub fn with_quantum(mut self, quantum: SimTime) -> Self {
        self.quantum = quantum;
        self
    }

    /// Sets the resource capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the baseline ceiling.
    pub fn with_baseline_max_tasks(mut self, max_tasks: usize) -> Self {
        self.baseline_max_tasks = max_tasks;
        self
    }

    /// Validates every parameter and builds the scenario. Repeated
    /// policies keep their first position only.
    ///
    /// # Errors
    /// - `InvalidPolicy` for an unknown policy name.
    /// - `InvalidWorkloadParameter` for an empty policy list, zero capacity,
    ///   a non-positive quantum used by a round-robin policy, or bad
    ///   workload parameters.
    pub fn resolve(&self) -> Result<Scenario> {
        if self.policies.is_empty() {
            return Err(SimError::parameter("policies", "at least one policy is required"));
        }
        let mut disciplines: Vec<Discipline> = Vec::with_capacity(self.policies.len());
        for name in &self.policies {
            let discipline = Discipline::parse(name, Some(self.quantum))?;
            if !disciplines.contains(&discipline) {
                disciplines.push(discipline);
            }
        }
        if self.capacity == 0 {
            return Err(SimError::parameter("capacity", "must be at least 1"));
        }
        let generator = WorkloadGenerator::new(self.workload.clone())?;
        Ok(Scenario {
            generator,
            disciplines,
            capacity: self.capacity,
            solver: BaselineSolver::new(self.baseline_max_tasks).with_workers(self.workers),
            workers: self.workers.max(1),
        })
    }
}

/// A validated scenario: workload, disciplines, capacity and baseline.
#[derive(Debug, Clone)]
pub struct Scenario {
    generator: WorkloadGenerator,
    disciplines: Vec<Discipline>,
    capacity: usize,
    solver: BaselineSolver,
    workers: usize,
}

impl Scenario {
    /// Disciplines to compare, in configuration order.
    pub fn disciplines(&self) -> &[Discipline] {
        &self.disciplines
    }

    /// Resource units.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Baseline solver.
    pub fn solver(&self) -> &BaselineSolver {
        &self.solver
    }

    /// Draws a task set.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Task> {
        self.generator.generate(rng)
    }

    /// Compares every discipline on a given task set.
    pub fn compare(&self, tasks: &[Task]) -> Result<Comparison> {
        Comparison::run(tasks, &self.disciplines, self.capacity, &self.solver)
    }

    /// Generates a task set from `seed` and compares every discipline on it.
    pub fn run_seeded(&self, seed: u64) -> Result<Comparison> {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let tasks = self.generate(&mut StdRng::seed_from_u64(seed));
        self.compare(&tasks)
    }

    /// Repeats the comparison over `trials` fresh workloads.
    pub fn run_trials(&self, trials: usize, seed: u64) -> Result<TrialSummary> {
        Experiment::new(self.generator.clone(), self.disciplines.clone())
            .with_capacity(self.capacity)
            .with_solver(self.solver)
            .with_workers(self.workers)
            .run(trials, seed)
    }
}
