//! Discrete-event simulation of tasks contending for one resource.
//!
//! [`Simulator`] runs a task set under a [`Discipline`](crate::dispatching::Discipline)
//! and produces a [`ScheduleRecord`](crate::models::ScheduleRecord). The
//! [`Clock`] holds simulated time and the pending arrivals.

mod clock;
mod driver;

pub use clock::Clock;
pub use driver::{DriverState, SimulationRun, Simulator};
