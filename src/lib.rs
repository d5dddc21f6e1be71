//! Discrete-event scheduling simulator for a shared processing resource.
//!
//! Simulates a synthetic workload of tasks contending for one resource
//! under interchangeable scheduling disciplines (FCFS, SJF, SRTN, HRRN,
//! round-robin), and compares each against an exhaustively computed
//! optimal ordering for small instances.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `TaskRun`, `Resource`, `ScheduleRecord`
//! - **`workload`**: Randomized task-set generation
//! - **`dispatching`**: Dispatching rules, the five `Discipline`s and the `Dispatcher`
//! - **`simulation`**: Event-driven clock and the `Simulator` state machine
//! - **`scheduler`**: Run metrics, KPIs and the brute-force `BaselineSolver`
//! - **`compare`**: Per-task-set comparisons and repeated trial experiments
//! - **`config`**: Serde-facing scenario configuration
//! - **`validation`**: Input integrity checks (duplicate IDs, non-positive service)
//!
//! # Example
//!
//! ```
//! use u_schedsim::dispatching::Discipline;
//! use u_schedsim::models::Task;
//! use u_schedsim::simulation::Simulator;
//!
//! let tasks = vec![Task::new(1, 0, 10), Task::new(2, 1, 1)];
//! let record = Simulator::new(Discipline::Srtn).run(&tasks).unwrap();
//! assert_eq!(record.totals.turnaround, 12);
//! assert_eq!(record.preemptions, 1);
//! ```
//!
//! # Logging
//!
//! Runs emit `tracing` spans and events; the crate installs no subscriber.
//!
//! # References
//!
//! - Silberschatz et al. (2018), "Operating System Concepts", Ch. 5
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Law (2015), "Simulation Modeling and Analysis"

pub mod compare;
pub mod config;
pub mod dispatching;
mod error;
pub mod models;
pub mod scheduler;
pub mod simulation;
pub mod validation;
pub mod workload;

pub use error::{Result, SimError};
