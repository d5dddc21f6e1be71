//! Synthetic workload generation.
//!
//! Produces task sets from distributional parameters. Service times are
//! drawn from a normal distribution, truncated toward zero and clamped to
//! at least 1. Arrival times come from one of three [`ArrivalModel`]s and
//! need not be monotone in ID order.
//!
//! Generation is a pure function of the supplied random source: the same
//! parameters and seed always yield the same tasks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::models::{SimTime, Task};

/// How arrival times are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArrivalModel {
    /// Every task arrives at 0.
    Simultaneous,
    /// Independent uniform draws from `0..=max`.
    Uniform {
        /// Latest possible arrival.
        max: SimTime,
    },
    /// Poisson process: cumulative exponential gaps, floored to whole units.
    Poisson {
        /// Mean gap between consecutive arrivals.
        mean_interarrival: f64,
    },
}

impl Default for ArrivalModel {
    fn default() -> Self {
        Self::Uniform { max: 10 }
    }
}

/// Normal service-time distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceModel {
    /// Mean service time.
    pub mean: f64,
    /// Standard deviation.
    pub std_dev: f64,
}

impl Default for ServiceModel {
    fn default() -> Self {
        Self {
            mean: 5.0,
            std_dev: 2.0,
        }
    }
}

/// Workload parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadParams {
    /// Number of tasks to generate.
    pub task_count: usize,
    /// Arrival model.
    pub arrival: ArrivalModel,
    /// Service-time model.
    pub service: ServiceModel,
}

impl Default for WorkloadParams {
    fn default() -> Self {
        Self {
            task_count: 5,
            arrival: ArrivalModel::default(),
            service: ServiceModel::default(),
        }
    }
}

impl WorkloadParams {
    /// Default parameters for `task_count` tasks.
    pub fn new(task_count: usize) -> Self {
        Self {
            task_count,
            ..Self::default()
        }
    }

    /// Sets the arrival model.
    pub fn with_arrival(mut self, arrival: ArrivalModel) -> Self {
        self.arrival = arrival;
        self
    }

    /// Sets the service-time distribution.
    pub fn with_service(mut self, mean: f64, std_dev: f64) -> Self {
        self.service = ServiceModel { mean, std_dev };
        self
    }

    /// Checks every parameter.
    pub fn validate(&self) -> Result<()> {
        if self.task_count == 0 {
            return Err(SimError::parameter("task_count", "must be positive"));
        }
        let ServiceModel { mean, std_dev } = self.service;
        if !(mean.is_finite() && mean > 0.0) {
            return Err(SimError::parameter(
                "service.mean",
                format!("must be positive, got {mean}"),
            ));
        }
        if !(std_dev.is_finite() && std_dev > 0.0) {
            return Err(SimError::parameter(
                "service.std_dev",
                format!("must be positive, got {std_dev}"),
            ));
        }
        match self.arrival {
            ArrivalModel::Simultaneous => {}
            ArrivalModel::Uniform { max } if max < 0 => {
                return Err(SimError::parameter(
                    "arrival.max",
                    format!("must not be negative, got {max}"),
                ));
            }
            ArrivalModel::Uniform { .. } => {}
            ArrivalModel::Poisson { mean_interarrival } => {
                if !(mean_interarrival.is_finite() && mean_interarrival > 0.0) {
                    return Err(SimError::parameter(
                        "arrival.mean_interarrival",
                        format!("must be positive, got {mean_interarrival}"),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum ArrivalSampler {
    Simultaneous,
    Uniform(SimTime),
    Poisson(Exp<f64>),
}

/// Validated generator for a parameter set.
///
/// # Example
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use u_schedsim::workload::{WorkloadGenerator, WorkloadParams};
///
/// let generator = WorkloadGenerator::new(WorkloadParams::new(4)).unwrap();
/// let tasks = generator.generate(&mut StdRng::seed_from_u64(7));
/// assert_eq!(tasks.len(), 4);
/// assert!(tasks.iter().all(|t| t.service_time >= 1));
/// ```
#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    params: WorkloadParams,
    service: Normal<f64>,
    arrival: ArrivalSampler,
}

impl WorkloadGenerator {
    /// Validates the parameters and builds the distributions.
    pub fn new(params: WorkloadParams) -> Result<Self> {
        params.validate()?;
        let service = Normal::new(params.service.mean, params.service.std_dev)
            .map_err(|e| SimError::parameter("service", e.to_string()))?;
        let arrival = match params.arrival {
            ArrivalModel::Simultaneous => ArrivalSampler::Simultaneous,
            ArrivalModel::Uniform { max } => ArrivalSampler::Uniform(max),
            ArrivalModel::Poisson { mean_interarrival } => ArrivalSampler::Poisson(
                Exp::new(1.0 / mean_interarrival)
                    .map_err(|e| SimError::parameter("arrival", e.to_string()))?,
            ),
        };
        Ok(Self {
            params,
            service,
            arrival,
        })
    }

    /// Parameters in use.
    pub fn params(&self) -> &WorkloadParams {
        &self.params
    }

    /// Draws a task set. IDs run `1..=task_count` in generation order.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Task> {
        let mut elapsed = 0.0f64;
        (1..=self.params.task_count)
            .map(|id| {
                let service_time = (self.service.sample(rng) as SimTime).max(1);
                let arrival_time = match self.arrival {
                    ArrivalSampler::Simultaneous => 0,
                    ArrivalSampler::Uniform(max) => rng.random_range(0..=max),
                    ArrivalSampler::Poisson(gap) => {
                        elapsed += gap.sample(rng);
                        elapsed.floor() as SimTime
                    }
                };
                Task::new(id as u32, arrival_time, service_time)
            })
            .collect()
    }
}

/// Generates a task set from a `u64` seed.
pub fn generate_seeded(params: &WorkloadParams, seed: u64) -> Result<Vec<Task>> {
    let generator = WorkloadGenerator::new(params.clone())?;
    Ok(generator.generate(&mut StdRng::seed_from_u64(seed)))
}
