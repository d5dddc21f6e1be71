//! Decision-point logic shared by all disciplines.

use super::{Discipline, Preemption, RuleEngine, SchedulingContext};
use crate::models::{TaskId, TaskRun};

/// Outcome of one decision point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decision {
    /// Held tasks to return to the queue, applied first.
    pub preempt: Vec<TaskId>,
    /// Waiting tasks to grant a unit, in grant order.
    pub dispatch: Vec<TaskId>,
}

impl Decision {
    /// Nothing to change.
    pub fn is_noop(&self) -> bool {
        self.preempt.is_empty() && self.dispatch.is_empty()
    }
}

/// Applies a [`Discipline`] at decision points.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    discipline: Discipline,
    engine: Option<RuleEngine>,
}

impl Dispatcher {
    /// Creates a dispatcher for a discipline.
    pub fn new(discipline: Discipline) -> Self {
        Self {
            discipline,
            engine: discipline.rule_engine(),
        }
    }

    /// The discipline being applied.
    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    /// Decides which waiting tasks get a unit and which held tasks lose one.
    ///
    /// `waiting` must be in admission-queue order; `held` lists the tasks
    /// currently occupying units. An empty queue yields a no-op.
    pub fn decide(
        &self,
        context: &SchedulingContext,
        waiting: &[&TaskRun],
        held: &[&TaskRun],
    ) -> Decision {
        if waiting.is_empty() {
            return Decision::default();
        }

        match (self.discipline.preemption(), &self.engine) {
            (Preemption::OnDecision, Some(engine)) => {
                self.rerank(engine, context, waiting, held)
            }
            (_, Some(engine)) => {
                let free = context.free_units();
                let dispatch = engine
                    .sort_indices(waiting, context)
                    .into_iter()
                    .take(free)
                    .map(|i| waiting[i].id())
                    .collect();
                Decision {
                    preempt: Vec::new(),
                    dispatch,
                }
            }
            // Queue order: head of the circular queue first.
            (_, None) => Decision {
                preempt: Vec::new(),
                dispatch: waiting
                    .iter()
                    .take(context.free_units())
                    .map(|t| t.id())
                    .collect(),
            },
        }
    }

    /// Ranks held and waiting tasks together; the top `capacity` hold the
    /// units afterwards.
    fn rerank(
        &self,
        engine: &RuleEngine,
        context: &SchedulingContext,
        waiting: &[&TaskRun],
        held: &[&TaskRun],
    ) -> Decision {
        let candidates: Vec<&TaskRun> = held.iter().chain(waiting.iter()).copied().collect();
        let selected: Vec<TaskId> = engine
            .sort_indices(&candidates, context)
            .into_iter()
            .take(context.capacity)
            .map(|i| candidates[i].id())
            .collect();

        let preempt = held
            .iter()
            .map(|t| t.id())
            .filter(|id| !selected.contains(id))
            .collect();
        let dispatch = selected
            .iter()
            .copied()
            .filter(|id| held.iter().all(|t| t.id() != *id))
            .collect();

        Decision { preempt, dispatch }
    }
}
