//! Repeating timers on the simulation timeline.
//!
//! Every periodic process is a [`ScheduledTask`] with its own period. The
//! registry hands out due tasks one at a time in `(due, scheduling order)`
//! order, so two tasks due at the same second fire in the order they were
//! (re)scheduled. A task is rescheduled one period later as soon as it is
//! popped; tearing down an entity removes its tasks with
//! [`TimerRegistry::cancel_where`].

use std::collections::BTreeMap;

use plotcoin_types::{AgentId, ClaimId, CloudId, ContractId, EquipmentId, TaskId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors raised by the timer registry.
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    /// A repeating task must have a non-zero period.
    #[error("task {kind:?} scheduled with a zero period")]
    ZeroPeriod {
        /// The rejected task.
        kind: TaskKind,
    },

    /// The next due time would overflow.
    #[error("timer overflow rescheduling task {0}")]
    Overflow(TaskId),

    /// No task with this id is scheduled.
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),
}

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    /// A bot analyses one of its claims.
    BotAnalysis {
        /// The bot.
        agent: AgentId,
        /// The claim under analysis.
        claim: ClaimId,
    },
    /// The lottery pays out one block.
    RewardDraw,
    /// One piece of equipment produces or consumes energy.
    EnergyCollection {
        /// The owning claim.
        claim: ClaimId,
        /// The panel or miner.
        equipment: EquipmentId,
    },
    /// A cloud drifts one step.
    WeatherMove {
        /// The cloud.
        cloud: CloudId,
    },
    /// An accepted contract delivers one period of energy.
    ContractSettlement {
        /// The contract.
        contract: ContractId,
    },
}

impl TaskKind {
    /// The agent whose teardown should cancel this task, if any.
    pub const fn agent(&self) -> Option<AgentId> {
        match self {
            Self::BotAnalysis { agent, .. } => Some(*agent),
            Self::RewardDraw
            | Self::EnergyCollection { .. }
            | Self::WeatherMove { .. }
            | Self::ContractSettlement { .. } => None,
        }
    }
}

/// A repeating task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    /// Unique task id.
    pub id: TaskId,
    /// What runs.
    pub kind: TaskKind,
    /// Seconds between firings.
    pub period_secs: u64,
    /// Next time the task fires.
    pub next_due: u64,
    /// Tie-breaker among tasks due at the same second.
    sequence: u64,
}

/// A task popped from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Firing {
    /// The task that fired.
    pub id: TaskId,
    /// What it does.
    pub kind: TaskKind,
    /// The time it was due.
    pub due: u64,
}

/// Every scheduled task, ordered by due time.
#[derive(Debug, Clone, Default)]
pub struct TimerRegistry {
    /// Tasks by id.
    tasks: BTreeMap<TaskId, ScheduledTask>,
    /// `(due, sequence)` to task id.
    queue: BTreeMap<(u64, u64), TaskId>,
    /// Next sequence number to hand out.
    next_sequence: u64,
}

impl TimerRegistry {
    /// An empty registry.
    pub const fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            queue: BTreeMap::new(),
            next_sequence: 0,
        }
    }

    /// Number of scheduled tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look up a task.
    pub fn get(&self, id: TaskId) -> Option<&ScheduledTask> {
        self.tasks.get(&id)
    }

    /// Every task, in id order.
    pub fn tasks(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.tasks.values()
    }

    /// Schedule a task that first fires at `first_due` and then every
    /// `period_secs` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::ZeroPeriod`] if `period_secs` is zero.
    pub fn schedule(
        &mut self,
        kind: TaskKind,
        period_secs: u64,
        first_due: u64,
    ) -> Result<TaskId, TimerError> {
        if period_secs == 0 {
            return Err(TimerError::ZeroPeriod { kind });
        }
        let id = TaskId::new();
        let sequence = self.take_sequence();
        self.queue.insert((first_due, sequence), id);
        self.tasks.insert(
            id,
            ScheduledTask {
                id,
                kind,
                period_secs,
                next_due: first_due,
                sequence,
            },
        );
        debug!(task = %id, ?kind, period_secs, first_due, "task scheduled");
        Ok(id)
    }

    /// Remove a task.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::UnknownTask`] if it is not scheduled.
    pub fn cancel(&mut self, id: TaskId) -> Result<ScheduledTask, TimerError> {
        let task = self.tasks.remove(&id).ok_or(TimerError::UnknownTask(id))?;
        self.queue.remove(&(task.next_due, task.sequence));
        debug!(task = %id, kind = ?task.kind, "task cancelled");
        Ok(task)
    }

    /// Remove every task whose kind matches `predicate`. Returns how many
    /// were removed.
    pub fn cancel_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&TaskKind) -> bool,
    {
        let doomed: Vec<ScheduledTask> = self
            .tasks
            .values()
            .filter(|task| predicate(&task.kind))
            .copied()
            .collect();
        for task in &doomed {
            self.tasks.remove(&task.id);
            self.queue.remove(&(task.next_due, task.sequence));
        }
        doomed.len()
    }

    /// Earliest due time among all tasks.
    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|&(due, _)| due)
    }

    /// Pop the earliest task due at or before `now` and reschedule it one
    /// period after its due time.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::Overflow`] if the next due time overflows. The
    /// task is removed in that case.
    pub fn pop_due(&mut self, now: u64) -> Result<Option<Firing>, TimerError> {
        let Some((&(due, sequence), &id)) = self.queue.iter().next() else {
            return Ok(None);
        };
        if due > now {
            return Ok(None);
        }
        self.queue.remove(&(due, sequence));

        let next_sequence = self.take_sequence();
        let Some(task) = self.tasks.get_mut(&id) else {
            return Err(TimerError::UnknownTask(id));
        };
        let kind = task.kind;
        let Some(next_due) = due.checked_add(task.period_secs) else {
            self.tasks.remove(&id);
            return Err(TimerError::Overflow(id));
        };
        task.next_due = next_due;
        task.sequence = next_sequence;
        self.queue.insert((next_due, next_sequence), id);

        Ok(Some(Firing { id, kind, due }))
    }

    fn take_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        sequence
    }
}
