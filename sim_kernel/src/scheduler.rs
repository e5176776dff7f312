//! Priority Round-Robin Scheduler
//!
//! Selection policy and bookkeeping for the dispatch cycle.
//!
//! ## Philosophy
//!
//! - **Determinism first**: Same registrations + same ticks => same schedule.
//! - **No hidden yields**: Control only changes hands at explicit yields,
//!   sleeps and slice ends.
//! - **Idle is normal**: An empty ready set is an outcome, not an error.
//!
//! ## Design
//!
//! - **Strict priority**: Only tasks at the highest ready priority are
//!   candidates.
//! - **Round-robin among equals**: The scan starts one slot past the last
//!   dispatched position in `ready_set` and wraps once, so equal-priority
//!   tasks take turns in registration order.
//! - **Full-table wake scan**: Waking is a linear pass over the registry,
//!   bounded by its fixed capacity.
//!
//! The scheduler only decides. Running a body is the kernel's job, because
//! a body needs the whole kernel as its context.

use crate::registry::TaskRegistry;
use crate::timer::TickCounter;
use core_types::{Priority, TaskId};
use kernel_api::TaskState;
use serde::{Deserialize, Serialize};

/// Outcome of one dispatch (top-level cycle or nested selection)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleOutcome {
    /// The task ran one slice
    Dispatched(TaskId),
    /// Nothing was ready
    Idle,
}

impl CycleOutcome {
    /// Returns the dispatched task, if any
    pub fn task(&self) -> Option<TaskId> {
        match self {
            CycleOutcome::Dispatched(task_id) => Some(*task_id),
            CycleOutcome::Idle => None,
        }
    }

    /// Returns true for an idle outcome
    pub fn is_idle(&self) -> bool {
        matches!(self, CycleOutcome::Idle)
    }
}

/// A task chosen by [`Scheduler::select`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Position in the ready set
    pub position: usize,
    /// The task to dispatch
    pub task_id: TaskId,
    /// Its priority, the highest among dispatchable tasks
    pub priority: Priority,
}

/// Scheduler state for one kernel instance
#[derive(Debug, Default)]
pub struct Scheduler {
    /// Task identities in registration order
    ready_set: Vec<TaskId>,
    /// Position of the last dispatched task; `None` before the first dispatch
    last_dispatched: Option<usize>,
    /// The task currently marked `Running`
    current: Option<TaskId>,
}

impl Scheduler {
    /// Creates a scheduler with an empty ready set
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a newly created task to the ready set
    pub fn register(&mut self, task_id: TaskId) {
        self.ready_set.push(task_id);
    }

    /// Phase 1: moves every blocked task whose deadline has passed to `Ready`
    ///
    /// Returns the woken tasks in registry order.
    pub fn wake_expired(&self, registry: &mut TaskRegistry, timer: &TickCounter) -> Vec<TaskId> {
        registry
            .iter_mut()
            .filter(|record| {
                record.state == TaskState::Blocked && timer.has_reached(record.wake_at)
            })
            .map(|record| {
                record.state = TaskState::Ready;
                record.id()
            })
            .collect()
    }

    /// Highest priority among dispatchable tasks
    pub fn highest_ready_priority(&self, registry: &TaskRegistry) -> Option<Priority> {
        self.ready_set
            .iter()
            .filter_map(|&task_id| registry.lookup(task_id))
            .filter(|record| record.is_dispatchable())
            .map(|record| record.priority())
            .max()
    }

    /// Phase 2 selection: picks the next task without changing any state
    ///
    /// Tasks whose body is already executing further up the call stack are
    /// never candidates, so a nested selection cannot re-enter them.
    pub fn select(&self, registry: &TaskRegistry) -> Option<Selection> {
        let highest = self.highest_ready_priority(registry)?;
        let len = self.ready_set.len();
        let start = self.last_dispatched.map_or(0, |last| (last + 1) % len);

        (0..len)
            .map(|offset| (start + offset) % len)
            .find_map(|position| {
                let task_id = self.ready_set[position];
                registry
                    .lookup(task_id)
                    .filter(|record| record.is_dispatchable() && record.priority() == highest)
                    .map(|record| Selection {
                        position,
                        task_id,
                        priority: record.priority(),
                    })
            })
    }

    /// Records `selection` as the running task
    pub fn mark_dispatched(&mut self, selection: &Selection) {
        self.last_dispatched = Some(selection.position);
        self.current = Some(selection.task_id);
    }

    /// The task currently marked `Running`
    pub fn current(&self) -> Option<TaskId> {
        self.current
    }

    pub(crate) fn set_current(&mut self, task_id: Option<TaskId>) {
        self.current = task_id;
    }

    /// Position of the last dispatched task in the ready set
    pub fn last_dispatched_index(&self) -> Option<usize> {
        self.last_dispatched
    }

    /// Task identities in registration order
    pub fn ready_set(&self) -> &[TaskId] {
        &self.ready_set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_api::TaskContext;

    fn setup(priorities: &[u8]) -> (Scheduler, TaskRegistry) {
        let mut scheduler = Scheduler::new();
        let mut registry = TaskRegistry::new(priorities.len());
        for &priority in priorities {
            let id = registry
                .create(
                    Box::new(|_: &mut dyn TaskContext| {}),
                    Priority(priority),
                    None,
                )
                .unwrap();
            scheduler.register(id);
        }
        (scheduler, registry)
    }

    fn dispatch(scheduler: &mut Scheduler, registry: &TaskRegistry) -> Option<TaskId> {
        let selection = scheduler.select(registry)?;
        scheduler.mark_dispatched(&selection);
        Some(selection.task_id)
    }

    #[test]
    fn test_scheduler_creation() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.current(), None);
        assert_eq!(scheduler.last_dispatched_index(), None);
        assert!(scheduler.ready_set().is_empty());
    }

    #[test]
    fn test_empty_ready_set_selects_nothing() {
        let (scheduler, registry) = setup(&[]);
        assert_eq!(scheduler.select(&registry), None);
    }

    #[test]
    fn test_highest_priority_wins() {
        let (scheduler, registry) = setup(&[1, 3, 2, 1]);
        let selection = scheduler.select(&registry).unwrap();
        assert_eq!(selection.task_id, TaskId::new(1));
        assert_eq!(selection.priority, Priority(3));
    }

    #[test]
    fn test_round_robin_among_equals() {
        let (mut scheduler, registry) = setup(&[2, 2, 2]);
        let order: Vec<_> = (0..6)
            .filter_map(|_| dispatch(&mut scheduler, &registry))
            .map(|id| id.as_u32())
            .collect();
        assert_eq!(order, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_round_robin_skips_lower_priority() {
        let (mut scheduler, registry) = setup(&[1, 2, 1, 2]);
        let order: Vec<_> = (0..4)
            .filter_map(|_| dispatch(&mut scheduler, &registry))
            .map(|id| id.as_u32())
            .collect();
        assert_eq!(order, vec![1, 3, 1, 3]);
    }

    #[test]
    fn test_blocked_tasks_are_not_candidates() {
        let (scheduler, mut registry) = setup(&[3, 1]);
        registry.set_state(TaskId::new(0), TaskState::Blocked);
        let selection = scheduler.select(&registry).unwrap();
        assert_eq!(selection.task_id, TaskId::new(1));
    }

    #[test]
    fn test_executing_tasks_are_not_candidates() {
        let (scheduler, mut registry) = setup(&[3, 1]);
        let body = registry.take_body(TaskId::new(0)).unwrap();
        assert_eq!(
            scheduler.highest_ready_priority(&registry),
            Some(Priority(1))
        );
        assert_eq!(scheduler.select(&registry).unwrap().task_id, TaskId::new(1));
        registry.restore_body(TaskId::new(0), body);
        assert_eq!(scheduler.select(&registry).unwrap().task_id, TaskId::new(0));
    }

    #[test]
    fn test_all_blocked_is_idle() {
        let (scheduler, mut registry) = setup(&[1, 2]);
        registry.set_state(TaskId::new(0), TaskState::Blocked);
        registry.set_state(TaskId::new(1), TaskState::Blocked);
        assert_eq!(scheduler.highest_ready_priority(&registry), None);
        assert_eq!(scheduler.select(&registry), None);
    }

    fn timer_at(ticks: u64) -> TickCounter {
        let mut timer = TickCounter::new();
        for _ in 0..ticks {
            timer.advance();
        }
        timer
    }

    #[test]
    fn test_wake_expired_on_exact_deadline() {
        let (scheduler, mut registry) = setup(&[1, 1, 1]);
        for (raw, wake_at) in [(0u32, 5u64), (1, 6), (2, 4)] {
            let id = TaskId::new(raw);
            registry.lookup_mut(id).unwrap().wake_at = wake_at;
            registry.set_state(id, TaskState::Blocked);
        }

        let woken = scheduler.wake_expired(&mut registry, &timer_at(5));
        assert_eq!(woken, vec![TaskId::new(0), TaskId::new(2)]);
        assert_eq!(registry.state(TaskId::new(0)), Some(TaskState::Ready));
        assert_eq!(registry.state(TaskId::new(1)), Some(TaskState::Blocked));
        assert_eq!(registry.state(TaskId::new(2)), Some(TaskState::Ready));
    }

    #[test]
    fn test_wake_ignores_ready_and_running() {
        let (scheduler, mut registry) = setup(&[1, 1]);
        registry.set_state(TaskId::new(1), TaskState::Running);
        let woken = scheduler.wake_expired(&mut registry, &timer_at(100));
        assert!(woken.is_empty());
        assert_eq!(registry.state(TaskId::new(1)), Some(TaskState::Running));
    }

    #[test]
    fn test_cursor_reinterpreted_after_growth() {
        let (mut scheduler, mut registry) = (Scheduler::new(), TaskRegistry::new(3));
        let noop = || Box::new(|_: &mut dyn TaskContext| {}) as Box<dyn kernel_api::TaskBody>;
        let a = registry.create(noop(), Priority(1), None).unwrap();
        scheduler.register(a);
        assert_eq!(dispatch(&mut scheduler, &registry), Some(a));
        assert_eq!(dispatch(&mut scheduler, &registry), Some(a));

        let b = registry.create(noop(), Priority(1), None).unwrap();
        scheduler.register(b);
        assert_eq!(dispatch(&mut scheduler, &registry), Some(b));
        assert_eq!(dispatch(&mut scheduler, &registry), Some(a));
    }

    #[test]
    fn test_mark_dispatched_sets_current_and_cursor() {
        let (mut scheduler, registry) = setup(&[1, 1]);
        let selection = scheduler.select(&registry).unwrap();
        scheduler.mark_dispatched(&selection);
        assert_eq!(scheduler.current(), Some(TaskId::new(0)));
        assert_eq!(scheduler.last_dispatched_index(), Some(0));
    }

    #[test]
    fn test_cycle_outcome_helpers() {
        assert!(CycleOutcome::Idle.is_idle());
        assert_eq!(CycleOutcome::Idle.task(), None);
        let outcome = CycleOutcome::Dispatched(TaskId::new(2));
        assert!(!outcome.is_idle());
        assert_eq!(outcome.task(), Some(TaskId::new(2)));
    }
}
