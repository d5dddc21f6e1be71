//! Simulation driver.
//!
//! Runs one task set under one discipline until every task completes.
//! Time advances by analytic jumps to the next arrival or the next lapse
//! of a held unit; nothing is stepped unit by unit.
//!
//! # Same-instant ordering
//!
//! At each instant `t` the driver:
//! 1. releases holds lapsing at `t` (completions, quantum expiries),
//! 2. enqueues arrivals due at `t`,
//! 3. re-queues quantum-expired tasks behind those arrivals,
//! 4. runs the decision point.

use std::collections::HashMap;

use tracing::{debug, debug_span, info};

use super::Clock;
use crate::dispatching::{Discipline, Dispatcher, Preemption, SchedulingContext};
use crate::error::{Result, SimError};
use crate::models::{
    Event, EventKind, Resource, ScheduleRecord, SimTime, Task, TaskId, TaskOutcome, TaskRun,
};
use crate::scheduler::metrics;
use crate::validation::validate_tasks;

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Built, no instant processed yet.
    Idle,
    /// Instants being processed.
    Running,
    /// Every task completed.
    Drained,
}

/// Configured simulator: a discipline and a resource capacity.
///
/// # Example
/// ```
/// use u_schedsim::dispatching::Discipline;
/// use u_schedsim::models::{Task, TaskId};
/// use u_schedsim::simulation::Simulator;
///
/// let tasks = vec![Task::new(1, 0, 5), Task::new(2, 0, 2), Task::new(3, 0, 8)];
/// let record = Simulator::new(Discipline::Sjf).run(&tasks).unwrap();
/// assert_eq!(record.order, vec![TaskId(2), TaskId(1), TaskId(3)]);
/// assert_eq!(record.totals.turnaround, 24);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simulator {
    discipline: Discipline,
    capacity: usize,
}

impl Simulator {
    /// Single-unit simulator for a discipline.
    pub fn new(discipline: Discipline) -> Self {
        Self {
            discipline,
            capacity: 1,
        }
    }

    /// Sets the number of resource units.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Discipline in use.
    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    /// Resource units.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Validates the configuration and task set, and prepares a run.
    ///
    /// # Errors
    /// - `InvalidWorkloadParameter` for zero capacity or a bad quantum.
    /// - `InvalidTaskSet` for duplicate ids, non-positive service times
    ///   or negative arrivals.
    pub fn start(&self, tasks: &[Task]) -> Result<SimulationRun> {
        if self.capacity == 0 {
            return Err(SimError::parameter("capacity", "must be at least 1"));
        }
        self.discipline.validate()?;
        validate_tasks(tasks).map_err(SimError::InvalidTaskSet)?;
        Ok(SimulationRun::new(self.discipline, self.capacity, tasks))
    }

    /// Runs a task set to completion.
    pub fn run(&self, tasks: &[Task]) -> Result<ScheduleRecord> {
        let span = debug_span!(
            "simulation.run",
            discipline = %self.discipline,
            tasks = tasks.len(),
            capacity = self.capacity
        );
        let _guard = span.enter();

        let record = self.start(tasks)?.finish();
        info!(
            discipline = %record.discipline,
            turnaround = record.totals.turnaround,
            waiting = record.totals.waiting,
            makespan = record.makespan(),
            preemptions = record.preemptions,
            "simulation drained"
        );
        Ok(record)
    }
}

/// One run in progress. Owns all mutable state of the run.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    dispatcher: Dispatcher,
    state: DriverState,
    clock: Clock,
    resource: Resource,
    runs: Vec<TaskRun>,
    index: HashMap<TaskId, usize>,
    events: Vec<Event>,
    preemptions: usize,
}

impl SimulationRun {
    fn new(discipline: Discipline, capacity: usize, tasks: &[Task]) -> Self {
        let mut clock = Clock::new();
        let mut index = HashMap::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            clock.schedule_arrival(task.arrival_time, task.id);
            index.insert(task.id, i);
        }
        Self {
            dispatcher: Dispatcher::new(discipline),
            state: DriverState::Idle,
            clock,
            resource: Resource::new(capacity),
            runs: tasks.iter().map(TaskRun::new).collect(),
            index,
            events: Vec::new(),
            preemptions: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    /// Runtime state of a task.
    pub fn task(&self, task_id: TaskId) -> Option<&TaskRun> {
        self.index.get(&task_id).map(|&i| &self.runs[i])
    }

    /// Events logged so far.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Processes the current instant and jumps to the next event.
    pub fn step(&mut self) -> DriverState {
        match self.state {
            DriverState::Drained => return DriverState::Drained,
            DriverState::Idle if self.runs.is_empty() => {
                self.state = DriverState::Drained;
                return self.state;
            }
            DriverState::Idle => self.state = DriverState::Running,
            DriverState::Running => {}
        }

        let now = self.clock.now();
        let expired = self.release_due(now);
        self.admit_arrivals(now);
        for task_id in expired {
            self.resource.enqueue(task_id);
        }
        self.decide(now);
        self.advance(now);
        self.state
    }

    /// Runs to completion and builds the record.
    pub fn finish(mut self) -> ScheduleRecord {
        while self.step() != DriverState::Drained {}

        let discipline = self.dispatcher.discipline();
        let mut tasks: Vec<TaskOutcome> = self.runs.iter().filter_map(TaskRun::outcome).collect();
        tasks.sort_by_key(|t| t.id);

        ScheduleRecord {
            discipline,
            capacity: self.resource.capacity(),
            order: metrics::dispatch_order(&tasks),
            totals: metrics::totals(&tasks),
            tasks,
            events: self.events,
            preemptions: self.preemptions,
        }
    }

    /// Releases lapsed holds. Returns the quantum-expired tasks, which
    /// still owe service and are re-queued by the caller.
    fn release_due(&mut self, now: SimTime) -> Vec<TaskId> {
        let mut expired = Vec::new();
        for occupancy in self.resource.release_due(now) {
            let task_id = occupancy.task_id;
            let run = &mut self.runs[self.index[&task_id]];
            if run.remaining_time() == 0 {
                run.complete(now);
                debug!(task = %task_id, time = now, unit = occupancy.unit, "completion");
                self.log(now, task_id, EventKind::Completion { unit: occupancy.unit });
            } else {
                run.preempt();
                self.preemptions += 1;
                debug!(task = %task_id, time = now, unit = occupancy.unit, "quantum expired");
                self.log(now, task_id, EventKind::Preemption { unit: occupancy.unit });
                expired.push(task_id);
            }
        }
        expired
    }

    fn admit_arrivals(&mut self, now: SimTime) {
        for task_id in self.clock.pop_due() {
            self.runs[self.index[&task_id]].arrive();
            self.resource.enqueue(task_id);
            self.log(now, task_id, EventKind::Arrival);
        }
    }

    fn decide(&mut self, now: SimTime) {
        let decision = {
            let waiting: Vec<&TaskRun> = self
                .resource
                .waiting()
                .map(|id| &self.runs[self.index[&id]])
                .collect();
            let held: Vec<&TaskRun> = self
                .resource
                .held()
                .iter()
                .map(|o| &self.runs[self.index[&o.task_id]])
                .collect();
            let context = SchedulingContext::at_time(now)
                .with_capacity(self.resource.capacity())
                .with_held(held.len());
            self.dispatcher.decide(&context, &waiting, &held)
        };

        for task_id in decision.preempt {
            if let Some(occupancy) = self.resource.release(task_id) {
                self.runs[self.index[&task_id]].preempt();
                self.preemptions += 1;
                debug!(task = %task_id, time = now, unit = occupancy.unit, "preemption");
                self.log(now, task_id, EventKind::Preemption { unit: occupancy.unit });
                self.resource.enqueue(task_id);
            }
        }

        let quantum = match self.dispatcher.discipline().preemption() {
            Preemption::Quantum(q) => Some(q),
            Preemption::Never | Preemption::OnDecision => None,
        };
        for task_id in decision.dispatch {
            let i = self.index[&task_id];
            let remaining = self.runs[i].remaining_time();
            let slice = quantum.map_or(remaining, |q| q.min(remaining));
            if let Some(unit) = self.resource.admit(task_id, now, now + slice) {
                self.runs[i].dispatch(now);
                debug!(task = %task_id, time = now, unit, slice, "dispatch");
                self.log(now, task_id, EventKind::Dispatch { unit });
            }
        }
    }

    /// Jumps to the earlier of the next arrival and the next lapse,
    /// serving held tasks for the elapsed time.
    fn advance(&mut self, now: SimTime) {
        let next = self
            .clock
            .next_arrival()
            .into_iter()
            .chain(self.resource.next_release())
            .min();
        let Some(next) = next else {
            self.state = DriverState::Drained;
            return;
        };

        let elapsed = next - now;
        for occupancy in self.resource.held() {
            self.runs[self.index[&occupancy.task_id]].serve(elapsed);
        }
        self.clock.advance_to(next);
    }

    fn log(&mut self, time: SimTime, task_id: TaskId, kind: EventKind) {
        self.events.push(Event {
            time,
            task_id,
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Slice, TaskState};
    use crate::validation::ValidationErrorKind;

    fn ids(record: &ScheduleRecord) -> Vec<u32> {
        record.order.iter().map(|id| id.0).collect()
    }

    fn simultaneous(services: &[i64]) -> Vec<Task> {
        services
            .iter()
            .enumerate()
            .map(|(i, &s)| Task::new(i as u32 + 1, 0, s))
            .collect()
    }

    #[test]
    fn test_fcfs_simultaneous() {
        let record = Simulator::new(Discipline::Fcfs)
            .run(&simultaneous(&[5, 2, 8]))
            .unwrap();
        assert_eq!(ids(&record), vec![1, 2, 3]);
        assert_eq!(record.totals.turnaround, 27);
        assert_eq!(record.totals.burst, 15);
        assert_eq!(record.totals.waiting, 12);
        assert_eq!(record.preemptions, 0);
    }

    #[test]
    fn test_sjf_simultaneous() {
        let record = Simulator::new(Discipline::Sjf)
            .run(&simultaneous(&[5, 2, 8]))
            .unwrap();
        assert_eq!(ids(&record), vec![2, 1, 3]);
        assert_eq!(record.totals.turnaround, 24);
    }

    #[test]
    fn test_srtn_preempts_on_arrival() {
        let tasks = vec![Task::new(1, 0, 10), Task::new(2, 1, 1)];
        let record = Simulator::new(Discipline::Srtn).run(&tasks).unwrap();

        assert_eq!(ids(&record), vec![2, 1]);
        assert_eq!(record.totals.turnaround, 12);
        assert_eq!(record.preemptions, 1);

        let first = record.task(TaskId(1)).unwrap();
        assert_eq!((first.start_time, first.end_time), (0, 11));
        let slices: Vec<(u32, SimTime, SimTime)> = record
            .slices()
            .iter()
            .map(|s| (s.task_id.0, s.start, s.end))
            .collect();
        assert_eq!(slices, vec![(1, 0, 1), (2, 1, 2), (1, 2, 11)]);
    }

    #[test]
    fn test_non_preemptive_ignores_shorter_arrival() {
        let tasks = vec![Task::new(1, 0, 10), Task::new(2, 1, 1)];
        let record = Simulator::new(Discipline::Sjf).run(&tasks).unwrap();
        assert_eq!(ids(&record), vec![1, 2]);
        assert_eq!(record.task(TaskId(2)).unwrap().end_time, 11);
    }

    #[test]
    fn test_hrrn_ages_long_waiter() {
        // At t=10: task 2 ratio (9+4)/4, task 3 ratio (2+3)/3
        let tasks = vec![Task::new(1, 0, 10), Task::new(2, 1, 4), Task::new(3, 8, 3)];
        let hrrn = Simulator::new(Discipline::Hrrn).run(&tasks).unwrap();
        assert_eq!(ids(&hrrn), vec![1, 2, 3]);

        let sjf = Simulator::new(Discipline::Sjf).run(&tasks).unwrap();
        assert_eq!(ids(&sjf), vec![1, 3, 2]);
    }

    #[test]
    fn test_hrrn_separates_close_ratios() {
        // At t=10: task 3 ratio 100_001/100_000 edges out task 2 at 100_002/100_001
        let tasks = vec![
            Task::new(1, 0, 10),
            Task::new(2, 9, 100_001),
            Task::new(3, 9, 100_000),
        ];
        let record = Simulator::new(Discipline::Hrrn).run(&tasks).unwrap();
        assert_eq!(ids(&record), vec![1, 3, 2]);
    }

    #[test]
    fn test_round_robin_rotates() {
        let record = Simulator::new(Discipline::RoundRobin { quantum: 2 })
            .run(&simultaneous(&[3, 3]))
            .unwrap();
        let slices: Vec<(u32, SimTime, SimTime)> = record
            .slices()
            .iter()
            .map(|s| (s.task_id.0, s.start, s.end))
            .collect();
        assert_eq!(slices, vec![(1, 0, 2), (2, 2, 4), (1, 4, 5), (2, 5, 6)]);
        assert_eq!(ids(&record), vec![1, 2]);
        assert_eq!(record.totals.turnaround, 11);
        assert_eq!(record.preemptions, 2);
    }

    #[test]
    fn test_round_robin_arrival_goes_before_expired_task() {
        let tasks = vec![Task::new(1, 0, 4), Task::new(2, 2, 2)];
        let record = Simulator::new(Discipline::RoundRobin { quantum: 2 })
            .run(&tasks)
            .unwrap();
        assert_eq!(ids(&record), vec![2, 1]);
        assert_eq!(record.task(TaskId(2)).unwrap().end_time, 4);
        assert_eq!(record.task(TaskId(1)).unwrap().end_time, 6);
    }

    #[test]
    fn test_idle_gap_between_arrivals() {
        let tasks = vec![Task::new(1, 0, 2), Task::new(2, 5, 1)];
        let record = Simulator::new(Discipline::Fcfs).run(&tasks).unwrap();
        let late = record.task(TaskId(2)).unwrap();
        assert_eq!((late.start_time, late.end_time), (5, 6));
        assert_eq!(record.totals.waiting, 0);
        assert_eq!(record.makespan(), 6);
    }

    #[test]
    fn test_multi_unit_capacity() {
        let record = Simulator::new(Discipline::Fcfs)
            .with_capacity(2)
            .run(&simultaneous(&[4, 4, 4]))
            .unwrap();
        let slices: Vec<(u32, usize, SimTime, SimTime)> = record
            .slices()
            .iter()
            .map(|s| (s.task_id.0, s.unit, s.start, s.end))
            .collect();
        assert_eq!(slices, vec![(1, 0, 0, 4), (2, 1, 0, 4), (3, 0, 4, 8)]);
        assert_eq!(record.capacity, 2);
        assert_eq!(record.totals.waiting, 4);
    }

    #[test]
    fn test_empty_task_set() {
        let record = Simulator::new(Discipline::Hrrn).run(&[]).unwrap();
        assert!(record.is_empty());
        assert!(record.order.is_empty());
        assert_eq!(record.totals.turnaround, 0);
        assert_eq!(record.totals.waiting, 0);
        assert_eq!(record.totals.burst, 0);
        assert!(record.events.is_empty());
    }

    #[test]
    fn test_state_transitions() {
        let sim = Simulator::new(Discipline::Fcfs);
        let mut run = sim.start(&[Task::new(1, 3, 2)]).unwrap();
        assert_eq!(run.state(), DriverState::Idle);

        assert_eq!(run.step(), DriverState::Running);
        assert_eq!(run.now(), 3);
        assert_eq!(run.step(), DriverState::Running);
        assert_eq!(run.task(TaskId(1)).unwrap().state(), TaskState::Running);
        assert_eq!(run.now(), 5);
        assert_eq!(run.step(), DriverState::Drained);
        assert_eq!(run.task(TaskId(1)).unwrap().state(), TaskState::Completed);
        assert_eq!(run.step(), DriverState::Drained);

        let mut empty = sim.start(&[]).unwrap();
        assert_eq!(empty.step(), DriverState::Drained);
    }

    #[test]
    fn test_event_log_order() {
        let tasks = vec![Task::new(1, 0, 2), Task::new(2, 2, 1)];
        let record = Simulator::new(Discipline::Fcfs).run(&tasks).unwrap();
        let kinds: Vec<(SimTime, u32, EventKind)> = record
            .events
            .iter()
            .map(|e| (e.time, e.task_id.0, e.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (0, 1, EventKind::Arrival),
                (0, 1, EventKind::Dispatch { unit: 0 }),
                (2, 1, EventKind::Completion { unit: 0 }),
                (2, 2, EventKind::Arrival),
                (2, 2, EventKind::Dispatch { unit: 0 }),
                (3, 2, EventKind::Completion { unit: 0 }),
            ]
        );
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let tasks = simultaneous(&[1]);
        assert!(matches!(
            Simulator::new(Discipline::Fcfs).with_capacity(0).run(&tasks),
            Err(SimError::InvalidWorkloadParameter { name: "capacity", .. })
        ));
        assert!(matches!(
            Simulator::new(Discipline::RoundRobin { quantum: 0 }).run(&tasks),
            Err(SimError::InvalidWorkloadParameter { name: "quantum", .. })
        ));
    }

    #[test]
    fn test_rejects_malformed_task_set() {
        let tasks = vec![Task::new(1, 0, 3), Task::new(1, 2, 0)];
        match Simulator::new(Discipline::Fcfs).run(&tasks) {
            Err(SimError::InvalidTaskSet(errors)) => {
                let kinds: Vec<ValidationErrorKind> = errors.iter().map(|e| e.kind).collect();
                assert!(kinds.contains(&ValidationErrorKind::DuplicateId));
                assert!(kinds.contains(&ValidationErrorKind::NonPositiveServiceTime));
            }
            other => panic!("expected InvalidTaskSet, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_task_set_past_time_horizon() {
        let tasks = vec![Task::new(1, 0, i64::MAX), Task::new(2, 1, 1)];
        match Simulator::new(Discipline::Fcfs).run(&tasks) {
            Err(SimError::InvalidTaskSet(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].kind, ValidationErrorKind::TimeOverflow);
            }
            other => panic!("expected InvalidTaskSet, got {other:?}"),
        }
    }

    #[test]
    fn test_runs_do_not_share_state() {
        let tasks = simultaneous(&[3, 1, 2]);
        let sim = Simulator::new(Discipline::Srtn);
        let a = sim.run(&tasks).unwrap();
        let b = sim.run(&tasks).unwrap();
        assert_eq!(a.order, b.order);
        assert_eq!(a.events, b.events);
        assert_eq!(tasks[0].service_time, 3);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn task_set(max_len: usize) -> impl Strategy<Value = Vec<Task>> {
            prop::collection::vec((0i64..15, 1i64..9), 0..max_len).prop_map(|specs| {
                specs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (arrival, service))| Task::new(i as u32 + 1, arrival, service))
                    .collect()
            })
        }

        fn discipline() -> impl Strategy<Value = Discipline> {
            prop_oneof![
                Just(Discipline::Fcfs),
                Just(Discipline::Sjf),
                Just(Discipline::Srtn),
                Just(Discipline::Hrrn),
                (1i64..5).prop_map(|quantum| Discipline::RoundRobin { quantum }),
            ]
        }

        proptest! {
            #[test]
            fn every_task_completes_in_order(
                tasks in task_set(10),
                d in discipline(),
                capacity in 1usize..4,
            ) {
                let record = Simulator::new(d).with_capacity(capacity).run(&tasks).unwrap();
                prop_assert_eq!(record.task_count(), tasks.len());
                prop_assert_eq!(record.order.len(), tasks.len());
                for t in &record.tasks {
                    prop_assert!(t.start_time >= t.arrival_time);
                    prop_assert!(t.end_time >= t.start_time + 1);
                    let served: SimTime = record.slices_for(t.id).iter().map(Slice::duration).sum();
                    prop_assert_eq!(served, t.service_time);
                }
            }

            #[test]
            fn waiting_identity_holds(tasks in task_set(10), d in discipline()) {
                let record = Simulator::new(d).run(&tasks).unwrap();
                let totals = record.totals;
                prop_assert_eq!(totals.waiting, totals.turnaround - totals.burst);
                let burst: SimTime = tasks.iter().map(|t| t.service_time).sum();
                prop_assert_eq!(totals.burst, burst);
            }

            #[test]
            fn fcfs_follows_arrival_order(tasks in task_set(10)) {
                let record = Simulator::new(Discipline::Fcfs).run(&tasks).unwrap();
                let mut expected: Vec<(SimTime, TaskId)> =
                    tasks.iter().map(|t| (t.arrival_time, t.id)).collect();
                expected.sort();
                let expected: Vec<TaskId> = expected.into_iter().map(|(_, id)| id).collect();
                prop_assert_eq!(record.order, expected);
            }

            #[test]
            fn srtn_never_waits_longer_than_fcfs(tasks in task_set(10)) {
                let srtn = Simulator::new(Discipline::Srtn).run(&tasks).unwrap();
                let fcfs = Simulator::new(Discipline::Fcfs).run(&tasks).unwrap();
                prop_assert!(srtn.totals.waiting <= fcfs.totals.waiting);
            }

            #[test]
            fn round_robin_gap_is_bounded(
                services in prop::collection::vec(1i64..12, 1..8),
                quantum in 1i64..5,
            ) {
                let tasks: Vec<Task> = services
                    .iter()
                    .enumerate()
                    .map(|(i, &s)| Task::new(i as u32 + 1, 0, s))
                    .collect();
                let bound = (tasks.len() as SimTime - 1) * quantum;
                let record = Simulator::new(Discipline::RoundRobin { quantum }).run(&tasks).unwrap();
                for task in &tasks {
                    let slices = record.slices_for(task.id);
                    for pair in slices.windows(2) {
                        prop_assert!(pair[1].start - pair[0].end <= bound);
                    }
                }
            }

            #[test]
            fn runs_are_deterministic(tasks in task_set(8), d in discipline(), capacity in 1usize..3) {
                let sim = Simulator::new(d).with_capacity(capacity);
                let a = sim.run(&tasks).unwrap();
                let b = sim.run(&tasks).unwrap();
                prop_assert_eq!(a.order, b.order);
                prop_assert_eq!(a.totals, b.totals);
                prop_assert_eq!(a.events, b.events);
            }
        }
    }
}
