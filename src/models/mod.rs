//! Simulation domain models.
//!
//! Provides the data types shared by the driver, the dispatchers and the
//! analysis layer.
//!
//! # Domain Mappings
//!
//! | u-schedsim | Operating system | Laundromat | Bank |
//! |------------|------------------|------------|------|
//! | Task | Process | Wash load | Customer |
//! | Resource | CPU | Washing machine | Teller |
//! | ScheduleRecord | Run trace | Day log | Queue log |

mod resource;
mod schedule;
mod task;

pub use resource::{Occupancy, Resource};
pub use schedule::{Event, EventKind, ScheduleRecord, ScheduleTotals, Slice};
pub use task::{SimTime, Task, TaskId, TaskOutcome, TaskRun, TaskState};
